//! Nested containers shared by the Facebook message variants

use serde::{Deserialize, Serialize};

/// Facebook sender/recipient identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacebookId {
    pub id: String,
}

/// Facebook message content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacebookUserMessageContent {
    pub mid: String,
    pub text: String,
}

/// Chatbase annotations carried alongside a Facebook payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatbaseFields {
    pub intent: String,
    pub version: String,
    pub not_handled: bool,
    pub feedback: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_serialize_empty() {
        assert_eq!(serde_json::to_value(FacebookId::default()).unwrap(), json!({"id": ""}));
        assert_eq!(
            serde_json::to_value(FacebookUserMessageContent::default()).unwrap(),
            json!({"mid": "", "text": ""})
        );
        assert_eq!(
            serde_json::to_value(ChatbaseFields::default()).unwrap(),
            json!({"intent": "", "version": "", "not_handled": false, "feedback": false})
        );
    }
}
