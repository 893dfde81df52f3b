//! Generic messages and message sets

use serde::{Deserialize, Serialize};

use crate::api::{ApiResponse, ChatbaseClient, Endpoint};
use crate::error::{ChatbaseError, Result};

/// Current wall-clock time as epoch milliseconds.
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Originator of a message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    User,
    Agent,
}

/// Fields shared by every message variant.
///
/// `not_handled` and `feedback` can only be raised on user messages, so they
/// are reachable through the setters alone.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageCore {
    pub api_key: String,
    pub platform: String,
    pub message: String,
    pub intent: String,
    pub version: String,
    pub user_id: String,
    /// Epoch milliseconds; creation time unless overridden.
    pub time_stamp: i64,
    msg_type: MessageType,
    not_handled: bool,
    feedback: bool,
}

impl Default for MessageCore {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            platform: String::new(),
            message: String::new(),
            intent: String::new(),
            version: String::new(),
            user_id: String::new(),
            time_stamp: current_timestamp(),
            msg_type: MessageType::User,
            not_handled: false,
            feedback: false,
        }
    }
}

impl MessageCore {
    pub fn msg_type(&self) -> MessageType {
        self.msg_type
    }

    pub fn not_handled(&self) -> bool {
        self.not_handled
    }

    pub fn feedback(&self) -> bool {
        self.feedback
    }

    pub fn set_as_type_user(&mut self) {
        self.msg_type = MessageType::User;
    }

    pub fn set_as_type_agent(&mut self) {
        self.msg_type = MessageType::Agent;
    }

    /// Mark the message as not handled. Fails on agent messages.
    pub fn set_as_not_handled(&mut self) -> Result<()> {
        if self.msg_type == MessageType::Agent {
            return Err(ChatbaseError::InvalidMessageType(
                "cannot set not_handled when message is of type agent".into(),
            ));
        }
        self.not_handled = true;
        Ok(())
    }

    pub fn set_as_handled(&mut self) {
        self.not_handled = false;
    }

    /// Mark the message as feedback. Fails on agent messages.
    pub fn set_as_feedback(&mut self) -> Result<()> {
        if self.msg_type == MessageType::Agent {
            return Err(ChatbaseError::InvalidMessageType(
                "cannot set feedback when message is of type agent".into(),
            ));
        }
        self.feedback = true;
        Ok(())
    }

    pub fn set_as_not_feedback(&mut self) {
        self.feedback = false;
    }
}

/// Access to the shared core fields, with the flag mutators on top.
pub trait ChatMessage {
    fn core(&self) -> &MessageCore;
    fn core_mut(&mut self) -> &mut MessageCore;

    fn set_as_type_user(&mut self) {
        self.core_mut().set_as_type_user();
    }

    fn set_as_type_agent(&mut self) {
        self.core_mut().set_as_type_agent();
    }

    fn set_as_not_handled(&mut self) -> Result<()> {
        self.core_mut().set_as_not_handled()
    }

    fn set_as_handled(&mut self) {
        self.core_mut().set_as_handled();
    }

    fn set_as_feedback(&mut self) -> Result<()> {
        self.core_mut().set_as_feedback()
    }

    fn set_as_not_feedback(&mut self) {
        self.core_mut().set_as_not_feedback();
    }
}

/// Wire shape of a generic message.
#[derive(Serialize)]
struct MessagePayload<'a> {
    api_key: &'a str,
    platform: &'a str,
    message: &'a str,
    intent: &'a str,
    version: &'a str,
    user_id: &'a str,
    session_id: &'a str,
    not_handled: bool,
    feedback: bool,
    time_stamp: i64,
    #[serde(rename = "type")]
    msg_type: MessageType,
}

/// Wire shape of a message batch.
#[derive(Serialize)]
pub(crate) struct BatchPayload<T> {
    pub(crate) messages: Vec<T>,
}

/// A single user or agent message for the generic message API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    pub core: MessageCore,
    pub session_id: String,
}

impl Message {
    /// User message stamped with the current time and empty fields.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.core.api_key = api_key.into();
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.core.platform = platform.into();
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.core.message = message.into();
        self
    }

    pub fn intent(mut self, intent: impl Into<String>) -> Self {
        self.core.intent = intent.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.core.version = version.into();
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.core.user_id = user_id.into();
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn time_stamp(mut self, time_stamp: i64) -> Self {
        self.core.time_stamp = time_stamp;
        self
    }

    pub fn msg_type(mut self, msg_type: MessageType) -> Self {
        self.core.msg_type = msg_type;
        self
    }

    fn payload(&self) -> MessagePayload<'_> {
        let core = &self.core;
        MessagePayload {
            api_key: &core.api_key,
            platform: &core.platform,
            message: &core.message,
            intent: &core.intent,
            version: &core.version,
            user_id: &core.user_id,
            session_id: &self.session_id,
            not_handled: core.not_handled,
            feedback: core.feedback,
            time_stamp: core.time_stamp,
            msg_type: core.msg_type,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.payload())?)
    }

    /// POST to `/api/message`; the api_key travels in the body.
    pub fn send(&self, client: &ChatbaseClient) -> Result<ApiResponse> {
        client.post(Endpoint::Message, &self.core.api_key, self.to_json()?)
    }
}

impl ChatMessage for Message {
    fn core(&self) -> &MessageCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MessageCore {
        &mut self.core
    }
}

/// Per-message overrides for [`MessageSet::new_message`].
#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    pub intent: String,
    pub message: String,
    pub msg_type: MessageType,
    pub not_handled: bool,
    pub time_stamp: Option<i64>,
}

/// Ordered batch of messages sharing api_key/platform/version/user_id.
#[derive(Debug, Clone, Default)]
pub struct MessageSet {
    pub api_key: String,
    pub platform: String,
    pub version: String,
    pub user_id: String,
    messages: Vec<Message>,
}

impl MessageSet {
    pub fn new(
        api_key: impl Into<String>,
        platform: impl Into<String>,
        version: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            platform: platform.into(),
            version: version.into(),
            user_id: user_id.into(),
            messages: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn messages_mut(&mut self) -> &mut [Message] {
        &mut self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append an already built message as-is.
    pub fn append_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Build a message from the set's defaults plus `fields`, append it and
    /// return it for further mutation.
    pub fn new_message(&mut self, fields: NewMessage) -> Result<&mut Message> {
        let mut message = Message::new()
            .api_key(self.api_key.as_str())
            .platform(self.platform.as_str())
            .version(self.version.as_str())
            .user_id(self.user_id.as_str())
            .intent(fields.intent)
            .message(fields.message)
            .msg_type(fields.msg_type);
        if let Some(ts) = fields.time_stamp {
            message.core.time_stamp = ts;
        }
        if fields.not_handled {
            message.core.set_as_not_handled()?;
        }

        self.messages.push(message);
        let idx = self.messages.len() - 1;
        Ok(&mut self.messages[idx])
    }

    pub fn to_json(&self) -> Result<String> {
        let payload = BatchPayload {
            messages: self.messages.iter().map(Message::payload).collect(),
        };
        Ok(serde_json::to_string(&payload)?)
    }

    /// POST to `/api/messages?api_key=...`.
    pub fn send(&self, client: &ChatbaseClient) -> Result<ApiResponse> {
        client.post(Endpoint::MessageBatch, &self.api_key, self.to_json()?)
    }
}
