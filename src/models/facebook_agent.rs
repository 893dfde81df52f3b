//! Facebook agent (bot-sent) messages
//!
//! The payload mirrors the Send API exchange: the request the bot made and
//! the response Facebook returned, plus the Chatbase annotations.

use serde::Serialize;

use super::fields::{ChatbaseFields, FacebookId, FacebookUserMessageContent};
use super::message::{current_timestamp, BatchPayload, ChatMessage, MessageCore, MessageType};
use crate::api::{ApiResponse, ChatbaseClient, Endpoint};
use crate::error::Result;

/// Request half of the Send API exchange
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacebookAgentRequestBody {
    pub recipient: FacebookId,
    pub message: FacebookUserMessageContent,
    pub timestamp: i64,
}

impl Default for FacebookAgentRequestBody {
    fn default() -> Self {
        Self {
            recipient: FacebookId::default(),
            message: FacebookUserMessageContent::default(),
            timestamp: current_timestamp(),
        }
    }
}

/// Response half of the Send API exchange
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacebookAgentResponseBody {
    pub recipient_id: String,
    pub message_id: String,
}

#[derive(Serialize)]
struct AgentPayload<'a> {
    request_body: &'a FacebookAgentRequestBody,
    response_body: &'a FacebookAgentResponseBody,
    chatbase_fields: &'a ChatbaseFields,
}

/// Batch entry: core fields flattened next to the nested blocks.
#[derive(Serialize)]
struct AgentSetEntry<'a> {
    api_key: &'a str,
    platform: &'a str,
    message: &'a str,
    intent: &'a str,
    version: &'a str,
    user_id: &'a str,
    not_handled: bool,
    feedback: bool,
    time_stamp: i64,
    #[serde(rename = "type")]
    msg_type: MessageType,
    request_body: &'a FacebookAgentRequestBody,
    response_body: &'a FacebookAgentResponseBody,
    chatbase_fields: &'a ChatbaseFields,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacebookAgentMessage {
    pub core: MessageCore,
    request_body: FacebookAgentRequestBody,
    response_body: FacebookAgentResponseBody,
    chatbase_fields: ChatbaseFields,
}

impl FacebookAgentMessage {
    pub fn new(
        api_key: impl Into<String>,
        intent: impl Into<String>,
        version: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let mut msg = Self::default();
        msg.core.api_key = api_key.into();
        msg.core.intent = intent.into();
        msg.core.version = version.into();
        msg.core.message = message.into();
        msg
    }

    pub fn request_body(&self) -> &FacebookAgentRequestBody {
        &self.request_body
    }

    pub fn response_body(&self) -> &FacebookAgentResponseBody {
        &self.response_body
    }

    pub fn chatbase_fields(&self) -> &ChatbaseFields {
        &self.chatbase_fields
    }

    /// Set the recipient in both the request and the response body.
    pub fn set_recipient_id(&mut self, recipient_id: impl Into<String>) {
        let recipient_id = recipient_id.into();
        self.request_body.recipient.id = recipient_id.clone();
        self.response_body.recipient_id = recipient_id;
    }

    /// Set the message id in both the request and the response body.
    pub fn set_message_id(&mut self, message_id: impl Into<String>) {
        let message_id = message_id.into();
        self.request_body.message.mid = message_id.clone();
        self.response_body.message_id = message_id;
    }

    /// Copy intent/version/flags and the message text from the core fields
    /// into the nested blocks. Runs before every serialization.
    pub fn set_chatbase_fields(&mut self) {
        self.chatbase_fields = ChatbaseFields {
            intent: self.core.intent.clone(),
            version: self.core.version.clone(),
            not_handled: self.core.not_handled(),
            feedback: self.core.feedback(),
        };
        self.request_body.message.text = self.core.message.clone();
    }

    pub fn to_json(&mut self) -> Result<String> {
        self.set_chatbase_fields();
        let payload = AgentPayload {
            request_body: &self.request_body,
            response_body: &self.response_body,
            chatbase_fields: &self.chatbase_fields,
        };
        Ok(serde_json::to_string(&payload)?)
    }

    /// Caller must have run `set_chatbase_fields` first.
    fn set_entry(&self) -> AgentSetEntry<'_> {
        let core = &self.core;
        AgentSetEntry {
            api_key: &core.api_key,
            platform: &core.platform,
            message: &core.message,
            intent: &core.intent,
            version: &core.version,
            user_id: &core.user_id,
            not_handled: core.not_handled(),
            feedback: core.feedback(),
            time_stamp: core.time_stamp,
            msg_type: core.msg_type(),
            request_body: &self.request_body,
            response_body: &self.response_body,
            chatbase_fields: &self.chatbase_fields,
        }
    }

    /// POST to `/api/facebook/message_received?api_key=...`.
    pub fn send(&mut self, client: &ChatbaseClient) -> Result<ApiResponse> {
        let body = self.to_json()?;
        client.post(Endpoint::FacebookAgentMessage, &self.core.api_key, body)
    }
}

impl ChatMessage for FacebookAgentMessage {
    fn core(&self) -> &MessageCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MessageCore {
        &mut self.core
    }
}

/// Batch of agent messages sharing api_key and version.
#[derive(Debug, Clone, Default)]
pub struct FacebookAgentMessageSet {
    pub api_key: String,
    pub version: String,
    messages: Vec<FacebookAgentMessage>,
}

impl FacebookAgentMessageSet {
    pub fn new(api_key: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            version: version.into(),
            messages: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[FacebookAgentMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn append_message(&mut self, message: FacebookAgentMessage) {
        self.messages.push(message);
    }

    /// Create a message with the set's api_key and version, append it and
    /// return it for further mutation.
    pub fn new_message(
        &mut self,
        intent: impl Into<String>,
        message: impl Into<String>,
    ) -> &mut FacebookAgentMessage {
        let msg = FacebookAgentMessage::new(
            self.api_key.as_str(),
            intent,
            self.version.as_str(),
            message,
        );
        self.messages.push(msg);
        let idx = self.messages.len() - 1;
        &mut self.messages[idx]
    }

    pub fn to_json(&mut self) -> Result<String> {
        for msg in &mut self.messages {
            msg.set_chatbase_fields();
        }
        let payload = BatchPayload {
            messages: self
                .messages
                .iter()
                .map(FacebookAgentMessage::set_entry)
                .collect(),
        };
        Ok(serde_json::to_string(&payload)?)
    }

    /// POST to `/api/facebook/send_message_batch?api_key=...`.
    pub fn send(&mut self, client: &ChatbaseClient) -> Result<ApiResponse> {
        let body = self.to_json()?;
        client.post(Endpoint::FacebookAgentMessageBatch, &self.api_key, body)
    }
}
