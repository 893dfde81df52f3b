//! Data models for Chatbase messages and events

mod events;
mod facebook_agent;
mod facebook_user;
mod fields;
mod message;

pub use events::*;
pub use facebook_agent::*;
pub use facebook_user::*;
pub use fields::*;
pub use message::*;
