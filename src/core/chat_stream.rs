use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::client::{ApiError, ChatRequest, FortuneClient};
use crate::core::frame::{FrameDecoder, StreamFrame};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamMessage {
    /// Incremental reply text.
    Chunk(String),
    /// Backend-reported error; replaces the reply text.
    Error(String),
    /// Whole reply from the non-streaming fallback; replaces the reply text.
    Reply(String),
    /// Neither the stream nor the fallback could be reached. Terminal.
    Failed,
    /// The reply is complete. Terminal.
    End,
}

impl StreamMessage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamMessage::Failed | StreamMessage::End)
    }
}

pub struct StreamParams {
    pub client: FortuneClient,
    pub request: ChatRequest,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                client,
                request,
                cancel_token,
                stream_id,
            } = params;

            let emit = |message: StreamMessage| {
                let _ = tx.send((message, stream_id));
            };

            tokio::select! {
                _ = relay_reply(&client, &request, &emit) => {}
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "chat stream cancelled");
                }
            }
        });
    }
}

/// Stream a reply, falling back to the plain endpoint once if the stream
/// cannot be read. Always ends with exactly one terminal message.
pub async fn relay_reply(
    client: &FortuneClient,
    request: &ChatRequest,
    emit: &impl Fn(StreamMessage),
) {
    let err = match relay_stream(client, request, emit).await {
        Ok(()) => {
            emit(StreamMessage::End);
            return;
        }
        Err(err) => err,
    };

    warn!(error = %err, "chat stream failed, retrying without streaming");
    match client.chat(request).await {
        Ok(reply) => {
            emit(StreamMessage::Reply(reply));
            emit(StreamMessage::End);
        }
        Err(err) => {
            warn!(error = %err, "chat fallback failed");
            emit(StreamMessage::Failed);
        }
    }
}

async fn relay_stream(
    client: &FortuneClient,
    request: &ChatRequest,
    emit: &impl Fn(StreamMessage),
) -> Result<(), ApiError> {
    let response = client.open_chat_stream(request).await?;
    let mut body = response.bytes_stream();
    let mut decoder = FrameDecoder::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        for frame in decoder.push(&chunk) {
            forward_frame(frame, emit);
        }
        if decoder.is_finished() {
            return Ok(());
        }
    }

    for frame in decoder.finish() {
        forward_frame(frame, emit);
    }
    Ok(())
}

fn forward_frame(frame: StreamFrame, emit: &impl Fn(StreamMessage)) {
    match frame {
        StreamFrame::Content(content) => emit(StreamMessage::Chunk(content)),
        StreamFrame::Error(error) => emit(StreamMessage::Error(error)),
        StreamFrame::Done => {}
    }
}
