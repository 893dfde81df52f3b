//! Chatbase client
//!
//! Message and event models for the Chatbase ingestion APIs, their JSON wire
//! format, and a blocking HTTP transport to send them.
//!
//! ```no_run
//! use chatbase::{ChatMessage, ChatbaseClient, Message};
//!
//! # fn main() -> chatbase::Result<()> {
//! let client = ChatbaseClient::new()?;
//! let mut msg = Message::new()
//!     .api_key("my-key")
//!     .platform("Web")
//!     .user_id("u-1")
//!     .message("where is my order?");
//! msg.set_as_not_handled()?;
//!
//! let resp = msg.send(&client)?;
//! println!("{} {}", resp.status, resp.body);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod models;

pub use api::{ApiResponse, ChatbaseClient, Endpoint};
pub use config::Config;
pub use error::{ChatbaseError, Result};
pub use models::*;
