use reqwest::Client;
use tracing::{debug, info};

use super::client::{GeminiClient, GeminiError};
use super::types::Content;

/// Whether a session carries conversation history between prompts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SessionMode {
    /// Every prompt is sent on its own, with no earlier turns.
    #[default]
    Stateless,
    /// Prompts and replies accumulate; each call sends the whole conversation.
    Reuse,
}

/// A prompt/response channel to a language model.
/// Implemented by `ChatSession` for production; mock implementations used in tests.
pub trait ChatModel {
    async fn send_message(&mut self, prompt: &str) -> Result<String, GeminiError>;
}

/// Opens one authenticated session per scan.
pub trait ModelProvider {
    type Session: ChatModel;

    async fn open_session(&self) -> Result<Self::Session, GeminiError>;
}

/// Long-lived handle reused for every call within one scan.
#[derive(Debug)]
pub struct ChatSession {
    client: GeminiClient,
    mode: SessionMode,
    history: Vec<Content>,
}

impl ChatSession {
    pub fn new(client: GeminiClient, mode: SessionMode) -> Self {
        Self {
            client,
            mode,
            history: Vec::new(),
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

impl ChatModel for ChatSession {
    async fn send_message(&mut self, prompt: &str) -> Result<String, GeminiError> {
        let turn = Content::user(prompt);
        let reply = match self.mode {
            SessionMode::Stateless => self.client.generate(std::slice::from_ref(&turn)).await?,
            SessionMode::Reuse => {
                self.history.push(turn);
                match self.client.generate(&self.history).await {
                    Ok(reply) => reply,
                    Err(e) => {
                        self.history.pop();
                        return Err(e);
                    }
                }
            }
        };

        if self.mode == SessionMode::Reuse {
            self.history.push(Content::model(&reply));
            debug!(turns = self.history_len(), "session history grew");
        }
        Ok(reply)
    }
}

impl ModelProvider for GeminiClient {
    type Session = ChatSession;

    async fn open_session(&self) -> Result<ChatSession, GeminiError> {
        self.verify_model().await?;
        info!(model = %self.model(), mode = ?self.session_mode, "Gemini session opened");
        Ok(ChatSession::new(self.clone(), self.session_mode))
    }
}

/// Reads the Gemini configuration each time a scan opens its session, so a
/// missing key fails that scan instead of the whole run.
#[derive(Clone)]
pub struct GeminiProvider {
    http: Client,
    mode: SessionMode,
    lookup: fn(&str) -> Option<String>,
}

impl GeminiProvider {
    pub fn new(http: Client, mode: SessionMode) -> Self {
        Self {
            http,
            mode,
            lookup: |name| std::env::var(name).ok(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_lookup(mut self, lookup: fn(&str) -> Option<String>) -> Self {
        self.lookup = lookup;
        self
    }
}

impl ModelProvider for GeminiProvider {
    type Session = ChatSession;

    async fn open_session(&self) -> Result<ChatSession, GeminiError> {
        GeminiClient::from_lookup(self.http.clone(), self.lookup)?
            .with_session_mode(self.mode)
            .open_session()
            .await
    }
}
