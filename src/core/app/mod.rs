//! Ritual controller state.
//!
//! [`App`] owns everything the ritual screen shows. It is only mutated by
//! applying [`AppAction`]s in order (see [`actions`]); side effects come back
//! out as [`AppCommand`]s for the event loop to run.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders};
use tokio_util::sync::CancellationToken;
use tui_textarea::TextArea;

use crate::core::blocks::BlockFace;
use crate::core::client::FortuneClient;
use crate::core::lot::Lot;
use crate::core::step::{RitualStep, StepNavigator};

pub mod actions;
pub mod dialog;

pub use actions::{
    apply_action, apply_actions, AppAction, AppActionDispatcher, AppCommand,
};
pub use dialog::{ChatEntry, LlmAvailability, ResultDialog};

pub struct SessionContext {
    pub client: FortuneClient,
    /// Cancels every in-flight request when the app shuts down.
    pub cancel_token: CancellationToken,
    next_id: u64,
}

impl SessionContext {
    pub fn new(client: FortuneClient) -> Self {
        Self {
            client,
            cancel_token: CancellationToken::new(),
            next_id: 0,
        }
    }

    /// Ids for dialogs and chat streams. Never reused within a run.
    pub fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Clone)]
pub struct BlockPanel {
    pub throw_enabled: bool,
    pub throwing: bool,
    pub faces: Option<[BlockFace; 2]>,
    pub message: String,
}

impl Default for BlockPanel {
    fn default() -> Self {
        Self {
            throw_enabled: true,
            throwing: false,
            faces: None,
            message: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DrawPanel {
    pub draw_enabled: bool,
    pub shaking: bool,
}

impl Default for DrawPanel {
    fn default() -> Self {
        Self {
            draw_enabled: true,
            shaking: false,
        }
    }
}

pub struct App {
    pub session: SessionContext,
    pub navigator: StepNavigator,
    pub blocks: BlockPanel,
    pub draw: DrawPanel,
    pub dialog: Option<ResultDialog>,
    /// Blocking notice; all other input waits until it is dismissed.
    pub alert: Option<String>,
    pub input: TextArea<'static>,
    pub exit_requested: bool,
}

impl App {
    pub fn new(client: FortuneClient) -> Self {
        Self {
            session: SessionContext::new(client),
            navigator: StepNavigator::new(),
            blocks: BlockPanel::default(),
            draw: DrawPanel::default(),
            dialog: None,
            alert: None,
            input: new_input(),
            exit_requested: false,
        }
    }

    pub fn step(&self) -> RitualStep {
        self.navigator.current()
    }

    /// Replace any current lot with `lot`, starting a fresh conversation.
    /// Returns the new dialog's id.
    pub fn open_result_dialog(&mut self, lot: Lot) -> u64 {
        let id = self.session.next_id();
        self.dialog = Some(ResultDialog::open(id, lot));
        self.clear_input();
        id
    }

    /// Discard the lot and its conversation and start over.
    pub fn close_result_dialog(&mut self) {
        self.dialog = None;
        self.clear_input();
        self.navigator.show(RitualStep::Question);
    }

    pub fn input_text(&self) -> String {
        self.input.lines().join("\n")
    }

    pub fn clear_input(&mut self) {
        self.input = new_input();
    }
}

fn new_input() -> TextArea<'static> {
    let mut input = TextArea::default();
    input.set_cursor_line_style(Style::default());
    input.set_cursor_style(Style::default().add_modifier(Modifier::REVERSED));
    input.set_placeholder_text("想問什麼？Enter 送出，Shift+Enter 換行");
    input.set_placeholder_style(Style::default().fg(Color::DarkGray));
    input.set_block(Block::default().borders(Borders::ALL).title("問籤師"));
    input
}
