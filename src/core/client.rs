//! HTTP client for the temple backend.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::core::lot::Lot;
use crate::core::message::ChatMessage;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const STATUS_TIMEOUT: Duration = Duration::from_secs(10);

/// Body shared by the streaming and plain chat endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<ChatMessage>,
    pub lot: Lot,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LlmStatus {
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize)]
struct ChatReply {
    reply: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// The request never produced a response (connection refused, timeout).
    Transport(reqwest::Error),
    /// The backend answered with a non-success status.
    Status { status: u16, body: String },
    /// The response body was not what the endpoint promises.
    Decode(String),
    /// `/api/lot/{number}` has no such lot.
    LotNotFound(u32),
    /// The HTTP client could not be constructed.
    ClientBuild(reqwest::Error),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(err) => write!(f, "Request failed: {err}"),
            ApiError::Status { status, body } => {
                let body = body.trim();
                if body.is_empty() {
                    write!(f, "Server returned status {status}")
                } else {
                    write!(f, "Server returned status {status}: {body}")
                }
            }
            ApiError::Decode(detail) => write!(f, "Unexpected response: {detail}"),
            ApiError::LotNotFound(number) => write!(f, "Lot {number} not found"),
            ApiError::ClientBuild(err) => write!(f, "Failed to build HTTP client: {err}"),
        }
    }
}

impl StdError for ApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ApiError::Transport(err) | ApiError::ClientBuild(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err)
    }
}

#[derive(Clone, Debug)]
pub struct FortuneClient {
    http: reqwest::Client,
    base_url: String,
    /// Whole-request limit for the one-shot endpoints. The chat stream only
    /// has the connect timeout.
    request_timeout: Option<Duration>,
}

impl FortuneClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(ApiError::ClientBuild)?;
        Ok(Self {
            request_timeout: Some(timeout),
            ..Self::with_http_client(http, base_url)
        })
    }

    pub fn with_http_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn bounded(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.request_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }

    /// `GET /api/draw`: the backend picks a lot at random.
    pub async fn draw_lot(&self) -> Result<Lot, ApiError> {
        let response = self
            .bounded(self.http.get(self.endpoint("api/draw")))
            .send()
            .await?;
        decode_json(response).await
    }

    /// `GET /api/lot/{number}`
    pub async fn lot_by_number(&self, number: u32) -> Result<Lot, ApiError> {
        let response = self
            .bounded(self.http.get(self.endpoint(&format!("api/lot/{number}"))))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::LotNotFound(number));
        }
        decode_json(response).await
    }

    /// `GET /api/ollama/status`
    pub async fn llm_status(&self) -> Result<LlmStatus, ApiError> {
        let response = self
            .http
            .get(self.endpoint("api/ollama/status"))
            .timeout(STATUS_TIMEOUT)
            .send()
            .await?;
        decode_json(response).await
    }

    /// `POST /api/chat`: the whole reply in one response.
    pub async fn chat(&self, request: &ChatRequest) -> Result<String, ApiError> {
        let response = self
            .bounded(self.http.post(self.endpoint("api/chat")))
            .json(request)
            .send()
            .await?;
        let reply: ChatReply = decode_json(response).await?;
        Ok(reply.reply)
    }

    /// `POST /api/chat/stream`. Returns the response once headers arrive and
    /// the status is a success; the body is read by the caller for as long
    /// as the backend keeps it open.
    pub async fn open_chat_stream(
        &self,
        request: &ChatRequest,
    ) -> Result<reqwest::Response, ApiError> {
        let response = self
            .http
            .post(self.endpoint("api/chat/stream"))
            .json(request)
            .send()
            .await?;
        ensure_success(response).await
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()))
}
