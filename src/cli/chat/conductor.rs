use tracing::{debug, info, warn};

use super::conversation_state::ConversationState;
use crate::chatbot_client::{ChatbotClient, ChatbotRequest, ChatbotResponse};

pub const NO_RESPONSE: &str = "No response";
pub const FALLBACK_REPLY: &str = "An error occurred while processing your request.";

/// Runs turns against the chatbot endpoint. The conversation state is owned
/// by the caller and passed in on every call.
pub struct SessionConductor {
    client: ChatbotClient,
}

impl SessionConductor {
    pub fn new(client: ChatbotClient) -> Self {
        Self { client }
    }

    /// Sends one user message and returns the assistant reply. Backend
    /// failures never escape: they become [`FALLBACK_REPLY`]. Both messages
    /// are appended to the history.
    pub async fn send_turn(&self, state: &mut ConversationState, user_text: &str) -> String {
        let request = build_request(state, user_text);

        let reply = match self.client.send(&request).await {
            Ok(response) => accept_response(state, response),
            Err(e) => {
                warn!("Chatbot request failed: {}", e);
                FALLBACK_REPLY.to_string()
            }
        };

        state.add_user_message(user_text);
        state.add_assistant_message(&reply);

        reply
    }

    pub fn reset_conversation(&self, state: &mut ConversationState) {
        state.reset();
        debug!("Conversation reset");
    }
}

fn build_request(state: &ConversationState, user_text: &str) -> ChatbotRequest {
    let identity = state.identity();
    ChatbotRequest {
        query: user_text.to_string(),
        conversation_id: identity.map(|id| id.conversation_id.clone()),
        user_id: identity.map(|id| id.user_id.clone()),
    }
}

fn accept_response(state: &mut ConversationState, response: ChatbotResponse) -> String {
    if let (Some(conversation_id), Some(user_id)) = (response.conversation_id, response.user_id) {
        if state.bind_identity(conversation_id, user_id) {
            info!(
                "Bound conversation {} for user {}",
                state.conversation_id().unwrap_or_default(),
                state.user_id().unwrap_or_default()
            );
        }
    }

    response.response.unwrap_or_else(|| NO_RESPONSE.to_string())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::chatbot_client::CHATBOT_PATH;
    use crate::cli::chat::conversation_state::Message;

    fn conductor_for(server: &MockServer) -> SessionConductor {
        SessionConductor::new(ChatbotClient::new(server.uri()))
    }

    #[tokio::test]
    async fn two_turn_conversation_binds_identity_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHATBOT_PATH))
            .and(body_json(json!({ "query": "hi" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "hello",
                "conversation_id": "c1",
                "user_id": "u1"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(CHATBOT_PATH))
            .and(body_json(json!({
                "query": "bye",
                "conversation_id": "c1",
                "user_id": "u1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "bye bye",
                "conversation_id": "c2",
                "user_id": "u2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let conductor = conductor_for(&server);
        let mut state = ConversationState::new();

        assert_eq!(conductor.send_turn(&mut state, "hi").await, "hello");
        assert_eq!(state.conversation_id(), Some("c1"));
        assert_eq!(state.user_id(), Some("u1"));
        assert_eq!(
            state.history(),
            &[Message::user("hi"), Message::assistant("hello")]
        );

        assert_eq!(conductor.send_turn(&mut state, "bye").await, "bye bye");
        assert_eq!(state.conversation_id(), Some("c1"));
        assert_eq!(state.user_id(), Some("u1"));
        assert_eq!(
            state.history(),
            &[
                Message::user("hi"),
                Message::assistant("hello"),
                Message::user("bye"),
                Message::assistant("bye bye"),
            ]
        );
    }

    #[tokio::test]
    async fn server_error_yields_fallback_and_keeps_identity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let conductor = conductor_for(&server);
        let mut state = ConversationState::new();
        state.bind_identity("c1".into(), "u1".into());

        assert_eq!(conductor.send_turn(&mut state, "hi").await, FALLBACK_REPLY);
        assert_eq!(state.conversation_id(), Some("c1"));
        assert_eq!(state.user_id(), Some("u1"));
        assert_eq!(
            state.history(),
            &[Message::user("hi"), Message::assistant(FALLBACK_REPLY)]
        );
    }

    #[tokio::test]
    async fn server_error_before_binding_leaves_identity_unset() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "conversation_id": "c1",
                "user_id": "u1"
            })))
            .mount(&server)
            .await;

        let conductor = conductor_for(&server);
        let mut state = ConversationState::new();

        assert_eq!(conductor.send_turn(&mut state, "hi").await, FALLBACK_REPLY);
        assert!(state.identity().is_none());
    }

    #[tokio::test]
    async fn missing_response_field_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "conversation_id": "c1",
                "user_id": "u1"
            })))
            .mount(&server)
            .await;

        let conductor = conductor_for(&server);
        let mut state = ConversationState::new();

        assert_eq!(conductor.send_turn(&mut state, "hi").await, NO_RESPONSE);
        assert_eq!(state.conversation_id(), Some("c1"));
    }

    #[tokio::test]
    async fn null_response_field_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": null })))
            .mount(&server)
            .await;

        let conductor = conductor_for(&server);
        let mut state = ConversationState::new();

        assert_eq!(conductor.send_turn(&mut state, "hi").await, NO_RESPONSE);
        assert!(state.identity().is_none());
    }

    #[tokio::test]
    async fn partial_identity_is_not_bound() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({ "query": "first" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "ok",
                "conversation_id": "c1"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_json(json!({ "query": "second" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "ok",
                "conversation_id": "c2",
                "user_id": "u2"
            })))
            .mount(&server)
            .await;

        let conductor = conductor_for(&server);
        let mut state = ConversationState::new();

        conductor.send_turn(&mut state, "first").await;
        assert!(state.identity().is_none());

        conductor.send_turn(&mut state, "second").await;
        assert_eq!(state.conversation_id(), Some("c2"));
        assert_eq!(state.user_id(), Some("u2"));
    }

    #[tokio::test]
    async fn malformed_body_yields_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let conductor = conductor_for(&server);
        let mut state = ConversationState::new();

        assert_eq!(conductor.send_turn(&mut state, "hi").await, FALLBACK_REPLY);
        assert!(state.identity().is_none());
    }

    #[tokio::test]
    async fn unreachable_endpoint_yields_fallback() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let conductor = SessionConductor::new(ChatbotClient::new(uri));
        let mut state = ConversationState::new();

        assert_eq!(conductor.send_turn(&mut state, "hi").await, FALLBACK_REPLY);
        assert_eq!(state.turn_count(), 1);
    }

    #[tokio::test]
    async fn reset_makes_no_request_and_clears_state() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "hello",
                "conversation_id": "c1",
                "user_id": "u1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let conductor = conductor_for(&server);
        let mut state = ConversationState::new();
        state.push_greeting();
        conductor.send_turn(&mut state, "hi").await;

        conductor.reset_conversation(&mut state);
        assert!(state.history().is_empty());
        assert!(state.identity().is_none());
    }
}
