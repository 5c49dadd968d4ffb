//! TUI-less "ask" command: one question about a lot, streamed to stdout.

use std::error::Error;
use std::io::Write;

use tokio_util::sync::CancellationToken;

use crate::core::app::dialog::{CONNECTION_ERROR, EMPTY_REPLY};
use crate::core::chat_stream::{ChatStreamService, StreamMessage, StreamParams};
use crate::core::client::{ApiError, ChatRequest, FortuneClient};

pub async fn run_ask(
    client: &FortuneClient,
    lot_number: u32,
    question: &str,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let question = question.trim();
    if question.is_empty() {
        return Err("Usage: qiuqian ask --lot <number> <question>".into());
    }

    let lot = match client.lot_by_number(lot_number).await {
        Ok(lot) => lot,
        Err(ApiError::LotNotFound(number)) => return Err(format!("沒有第 {number} 籤").into()),
        Err(err) => return Err(err.into()),
    };
    writeln!(out, "{}", lot.heading())?;

    let (stream_service, mut rx) = ChatStreamService::new();
    stream_service.spawn_stream(StreamParams {
        client: client.clone(),
        request: ChatRequest {
            message: question.to_string(),
            history: Vec::new(),
            lot,
        },
        cancel_token: CancellationToken::new(),
        stream_id: 1,
    });

    let mut printed_any = false;
    while let Some((message, _)) = rx.recv().await {
        let finished = message.is_terminal();
        match message {
            StreamMessage::Chunk(content) => {
                write!(out, "{content}")?;
                out.flush()?;
                printed_any |= !content.is_empty();
            }
            // Replacement text starts on a fresh line; stdout cannot take back
            // what was already printed.
            StreamMessage::Error(text) | StreamMessage::Reply(text) => {
                if printed_any {
                    writeln!(out)?;
                }
                write!(out, "{text}")?;
                printed_any = !text.is_empty();
            }
            StreamMessage::Failed => return Err(CONNECTION_ERROR.into()),
            StreamMessage::End => {
                if !printed_any {
                    write!(out, "{EMPTY_REPLY}")?;
                }
                writeln!(out)?;
            }
        }
        if finished {
            break;
        }
    }
    Ok(())
}
