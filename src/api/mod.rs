//! HTTP transport and endpoint table for the Chatbase APIs

pub mod client;

pub use client::{ApiResponse, ChatbaseClient};

/// Ingestion routes. All are JSON POSTs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Message,
    MessageBatch,
    FacebookAgentMessage,
    FacebookAgentMessageBatch,
    FacebookUserMessage,
    FacebookUserMessageBatch,
    Event,
    BatchEvents,
    Click,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Message => "/api/message",
            Endpoint::MessageBatch => "/api/messages",
            Endpoint::FacebookAgentMessage => "/api/facebook/message_received",
            Endpoint::FacebookAgentMessageBatch => "/api/facebook/send_message_batch",
            Endpoint::FacebookUserMessage => "/api/facebook/send_message",
            Endpoint::FacebookUserMessageBatch => "/api/facebook/message_received_batch",
            Endpoint::Event => "/apis/v1/events/insert",
            Endpoint::BatchEvents => "/apis/v1/events/insert_batch",
            Endpoint::Click => "/api/click",
        }
    }

    /// Whether the api_key travels as a query parameter rather than in the body.
    pub fn key_in_query(self) -> bool {
        matches!(
            self,
            Endpoint::MessageBatch
                | Endpoint::FacebookAgentMessage
                | Endpoint::FacebookAgentMessageBatch
                | Endpoint::FacebookUserMessage
                | Endpoint::FacebookUserMessageBatch
        )
    }

    /// Event routes live on the separate events host.
    pub fn uses_events_host(self) -> bool {
        matches!(self, Endpoint::Event | Endpoint::BatchEvents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_authenticated_endpoints() {
        assert!(!Endpoint::Message.key_in_query());
        assert!(!Endpoint::Event.key_in_query());
        assert!(!Endpoint::BatchEvents.key_in_query());
        assert!(!Endpoint::Click.key_in_query());
        assert!(Endpoint::FacebookUserMessageBatch.key_in_query());
    }

    #[test]
    fn test_events_host_routing() {
        assert!(Endpoint::Event.uses_events_host());
        assert!(Endpoint::BatchEvents.uses_events_host());
        assert!(!Endpoint::Click.uses_events_host());
        assert!(!Endpoint::Message.uses_events_host());
    }
}
