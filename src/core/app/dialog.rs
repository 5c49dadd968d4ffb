//! The result dialog: the drawn lot plus a conversation about it.

use crate::core::chat_stream::StreamMessage;
use crate::core::client::{ChatRequest, LlmStatus};
use crate::core::lot::Lot;
use crate::core::message::{ChatMessage, ChatRole};

/// Shown when a reply completes without any text.
pub const EMPTY_REPLY: &str = "（AI 目前無法回應，請稍後再試。）";

/// Shown when neither chat endpoint could be reached.
pub const CONNECTION_ERROR: &str = "抱歉，無法連線到 AI 解籤服務，請確認伺服器狀態後再試。";

/// Shown when the status probe fails without a server explanation.
pub const LLM_START_HINT: &str = "AI 未連線：請先啟動本地 Ollama（ollama serve）";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmAvailability {
    Checking,
    Connected,
    Unavailable(String),
}

impl LlmAvailability {
    pub fn from_probe(result: Result<LlmStatus, String>) -> Self {
        match result {
            Ok(status) if status.ok => LlmAvailability::Connected,
            Ok(status) => LlmAvailability::Unavailable(
                status
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| LLM_START_HINT.to_string()),
            ),
            Err(_) => LlmAvailability::Unavailable(LLM_START_HINT.to_string()),
        }
    }
}

/// One rendered line of the chat log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub content: String,
    /// Set while this assistant entry is waiting on a reply stream.
    pub pending: Option<PendingReply>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    pub stream_id: u64,
    pub question: String,
}

impl ChatEntry {
    fn user(content: String) -> Self {
        Self {
            role: ChatRole::User,
            content,
            pending: None,
        }
    }

    fn assistant(content: String) -> Self {
        Self {
            role: ChatRole::Assistant,
            content,
            pending: None,
        }
    }

    /// True for a placeholder that has not received any text yet.
    pub fn is_waiting(&self) -> bool {
        self.pending.is_some() && self.content.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ResultDialog {
    id: u64,
    lot: Lot,
    /// Completed turns, sent back as context with each question.
    history: Vec<ChatMessage>,
    /// What the chat pane shows, including in-flight placeholders.
    log: Vec<ChatEntry>,
    llm: LlmAvailability,
}

impl ResultDialog {
    pub fn open(id: u64, lot: Lot) -> Self {
        Self {
            id,
            lot,
            history: Vec::new(),
            log: Vec::new(),
            llm: LlmAvailability::Checking,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn lot(&self) -> &Lot {
        &self.lot
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn log(&self) -> &[ChatEntry] {
        &self.log
    }

    pub fn llm(&self) -> &LlmAvailability {
        &self.llm
    }

    pub fn set_llm(&mut self, llm: LlmAvailability) {
        self.llm = llm;
    }

    pub fn has_pending(&self) -> bool {
        self.log.iter().any(|entry| entry.pending.is_some())
    }

    /// Record the question, add a placeholder for the reply, and build the
    /// request. History is captured before this turn is added to it.
    pub fn begin_turn(&mut self, question: &str, stream_id: u64) -> ChatRequest {
        let request = ChatRequest {
            message: question.to_string(),
            history: self.history.clone(),
            lot: self.lot.clone(),
        };
        self.log.push(ChatEntry::user(question.to_string()));
        self.log.push(ChatEntry {
            role: ChatRole::Assistant,
            content: String::new(),
            pending: Some(PendingReply {
                stream_id,
                question: question.to_string(),
            }),
        });
        request
    }

    /// Apply a stream message to the placeholder it belongs to. Returns false
    /// when no placeholder in this dialog is waiting on `stream_id`.
    pub fn apply_stream_message(&mut self, stream_id: u64, message: StreamMessage) -> bool {
        let Some(index) = self.log.iter().position(|entry| {
            entry
                .pending
                .as_ref()
                .is_some_and(|pending| pending.stream_id == stream_id)
        }) else {
            return false;
        };

        match message {
            StreamMessage::Chunk(content) => self.log[index].content.push_str(&content),
            StreamMessage::Error(text) | StreamMessage::Reply(text) => {
                self.log[index].content = text;
            }
            StreamMessage::End => {
                let entry = &mut self.log[index];
                if entry.content.trim().is_empty() {
                    entry.content = EMPTY_REPLY.to_string();
                }
                if let Some(pending) = entry.pending.take() {
                    self.history.push(ChatMessage::user(pending.question));
                    self.history.push(ChatMessage::assistant(entry.content.clone()));
                }
            }
            StreamMessage::Failed => {
                self.log.remove(index);
                self.log.push(ChatEntry::assistant(CONNECTION_ERROR.to_string()));
            }
        }
        true
    }
}
