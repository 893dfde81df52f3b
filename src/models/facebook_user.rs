//! Facebook user (inbound) messages

use serde::Serialize;

use super::fields::{ChatbaseFields, FacebookId, FacebookUserMessageContent};
use super::message::{current_timestamp, BatchPayload, ChatMessage, MessageCore};
use crate::api::{ApiResponse, ChatbaseClient, Endpoint};
use crate::error::Result;

/// Nested wire shape, used both standalone and as a batch entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacebookUserPayload<'a> {
    pub sender: &'a FacebookId,
    pub recipient: &'a FacebookId,
    pub timestamp: i64,
    pub message: &'a FacebookUserMessageContent,
    pub chatbase_fields: &'a ChatbaseFields,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FacebookUserMessage {
    pub core: MessageCore,
    sender: FacebookId,
    recipient: FacebookId,
    fb_message: FacebookUserMessageContent,
    timestamp: i64,
    chatbase_fields: ChatbaseFields,
}

impl Default for FacebookUserMessage {
    fn default() -> Self {
        Self {
            core: MessageCore::default(),
            sender: FacebookId::default(),
            recipient: FacebookId::default(),
            fb_message: FacebookUserMessageContent::default(),
            timestamp: current_timestamp(),
            chatbase_fields: ChatbaseFields::default(),
        }
    }
}

impl FacebookUserMessage {
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

    pub fn sender(&self) -> &FacebookId {
        &self.sender
    }

    pub fn recipient(&self) -> &FacebookId {
        &self.recipient
    }

    pub fn fb_message(&self) -> &FacebookUserMessageContent {
        &self.fb_message
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn chatbase_fields(&self) -> &ChatbaseFields {
        &self.chatbase_fields
    }

    pub fn set_recipient_id(&mut self, recipient_id: impl Into<String>) {
        self.recipient.id = recipient_id.into();
    }

    pub fn set_sender_id(&mut self, sender_id: impl Into<String>) {
        self.sender.id = sender_id.into();
    }

    pub fn set_message_id(&mut self, message_id: impl Into<String>) {
        self.fb_message.mid = message_id.into();
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
        self.fb_message.text = self.core.message.clone();
    }

    /// Nested structure for a batch entry, with chatbase fields refreshed.
    pub fn to_set_format(&mut self) -> FacebookUserPayload<'_> {
        self.set_chatbase_fields();
        self.payload()
    }

    fn payload(&self) -> FacebookUserPayload<'_> {
        FacebookUserPayload {
            sender: &self.sender,
            recipient: &self.recipient,
            timestamp: self.timestamp,
            message: &self.fb_message,
            chatbase_fields: &self.chatbase_fields,
        }
    }

    pub fn to_json(&mut self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_set_format())?)
    }

    /// POST to `/api/facebook/send_message?api_key=...`.
    pub fn send(&mut self, client: &ChatbaseClient) -> Result<ApiResponse> {
        let body = self.to_json()?;
        client.post(Endpoint::FacebookUserMessage, &self.core.api_key, body)
    }
}

impl ChatMessage for FacebookUserMessage {
    fn core(&self) -> &MessageCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MessageCore {
        &mut self.core
    }
}

/// Batch of user messages sharing api_key and version.
#[derive(Debug, Clone, Default)]
pub struct FacebookUserMessageSet {
    pub api_key: String,
    pub version: String,
    messages: Vec<FacebookUserMessage>,
}

impl FacebookUserMessageSet {
    pub fn new(api_key: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            version: version.into(),
            messages: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[FacebookUserMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn append_message(&mut self, message: FacebookUserMessage) {
        self.messages.push(message);
    }

    /// Create a message with the set's api_key and version, append it and
    /// return it for further mutation.
    pub fn new_message(
        &mut self,
        intent: impl Into<String>,
        message: impl Into<String>,
    ) -> &mut FacebookUserMessage {
        let msg = FacebookUserMessage::new(
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
                .map(FacebookUserMessage::payload)
                .collect(),
        };
        Ok(serde_json::to_string(&payload)?)
    }

    /// POST to `/api/facebook/message_received_batch?api_key=...`.
    pub fn send(&mut self, client: &ChatbaseClient) -> Result<ApiResponse> {
        let body = self.to_json()?;
        client.post(Endpoint::FacebookUserMessageBatch, &self.api_key, body)
    }
}
