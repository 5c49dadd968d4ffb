mod chat;
mod ritual;

use std::time::Duration;

use tokio::sync::mpsc;

use super::App;
use crate::core::blocks::BlockThrow;
use crate::core::chat_stream::{StreamMessage, StreamParams};
use crate::core::client::LlmStatus;
use crate::core::lot::Lot;

pub enum AppAction {
    /// Question asked; move on to the blocks.
    BeginRitual,
    ThrowBlocks,
    BlocksLanded {
        round: u64,
        throw: BlockThrow,
    },
    AdvanceToDraw {
        round: u64,
    },
    DrawLot,
    LotDrawn {
        lot: Lot,
    },
    DrawFailed {
        error: String,
    },
    /// Back to the question step.
    Restart,
    DismissAlert,
    CloseDialog,
    SubmitChat {
        text: String,
    },
    LlmStatusResolved {
        dialog_id: u64,
        status: Result<LlmStatus, String>,
    },
    StreamUpdate {
        stream_id: u64,
        message: StreamMessage,
    },
    Quit,
}

#[derive(Clone)]
pub struct AppActionDispatcher {
    tx: mpsc::UnboundedSender<AppAction>,
}

impl AppActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<AppAction>) -> Self {
        Self { tx }
    }

    pub fn dispatch(&self, action: AppAction) {
        let _ = self.tx.send(action);
    }

    pub fn dispatch_many<I>(&self, actions: I)
    where
        I: IntoIterator<Item = AppAction>,
    {
        for action in actions {
            self.dispatch(action);
        }
    }
}

pub enum AppCommand {
    /// Deliver `action` back to the queue once `delay` has passed.
    Schedule {
        delay: Duration,
        action: Box<AppAction>,
    },
    FetchLot,
    ProbeLlm {
        dialog_id: u64,
    },
    SpawnStream(StreamParams),
}

pub fn apply_actions(
    app: &mut App,
    actions: impl IntoIterator<Item = AppAction>,
) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for action in actions {
        if let Some(cmd) = apply_action(app, action) {
            commands.push(cmd);
        }
    }
    commands
}

pub fn apply_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::BeginRitual
        | AppAction::ThrowBlocks
        | AppAction::BlocksLanded { .. }
        | AppAction::AdvanceToDraw { .. }
        | AppAction::DrawLot
        | AppAction::LotDrawn { .. }
        | AppAction::DrawFailed { .. }
        | AppAction::Restart
        | AppAction::DismissAlert => ritual::handle_ritual_action(app, action),

        AppAction::CloseDialog
        | AppAction::SubmitChat { .. }
        | AppAction::LlmStatusResolved { .. }
        | AppAction::StreamUpdate { .. } => chat::handle_chat_action(app, action),

        AppAction::Quit => {
            app.exit_requested = true;
            app.session.cancel_token.cancel();
            None
        }
    }
}
