use std::fmt;

pub const GREETING: &str = "Hello! How can I assist you today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ids handed out by the backend for this conversation. Both are known or
/// neither is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub conversation_id: String,
    pub user_id: String,
}

#[derive(Debug, Default)]
pub struct ConversationState {
    identity: Option<SessionIdentity>,
    history: Vec<Message>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the local greeting. Only an empty history gets one.
    pub fn push_greeting(&mut self) -> bool {
        if !self.history.is_empty() {
            return false;
        }
        self.history.push(Message::assistant(GREETING));
        true
    }

    pub fn add_user_message(&mut self, message: &str) {
        self.history.push(Message::user(message));
    }

    pub fn add_assistant_message(&mut self, message: &str) {
        self.history.push(Message::assistant(message));
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Number of turns taken. The greeting is not a turn.
    pub fn turn_count(&self) -> usize {
        self.history
            .iter()
            .filter(|message| message.role == Role::User)
            .count()
    }

    pub fn identity(&self) -> Option<&SessionIdentity> {
        self.identity.as_ref()
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|id| id.conversation_id.as_str())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|id| id.user_id.as_str())
    }

    /// Binds the backend ids if none are bound yet. Returns whether the
    /// binding happened; an existing identity is never replaced.
    pub fn bind_identity(&mut self, conversation_id: String, user_id: String) -> bool {
        if self.identity.is_some() {
            return false;
        }
        self.identity = Some(SessionIdentity {
            conversation_id,
            user_id,
        });
        true
    }

    pub fn reset(&mut self) {
        self.identity = None;
        self.history.clear();
    }
}
