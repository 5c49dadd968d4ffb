//! Key routing for the ritual screen.
//!
//! Keys resolve to a [`KeyIntent`] based on what is on screen. Enter in the
//! chat input submits, unless Shift/Alt is held or the key is part of an
//! input-method composition, in which case it inserts a newline.

use std::time::{Duration, Instant};

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::app::{App, AppAction};
use crate::core::step::RitualStep;

/// Keys arriving closer together than this are one composition burst: an
/// IME committing text, or a paste from a terminal without bracketed paste.
pub const COMPOSITION_WINDOW: Duration = Duration::from_millis(8);

pub enum KeyIntent {
    Dispatch(AppAction),
    /// Send the chat input.
    Submit,
    InsertNewline,
    /// Pass the key to the chat input editor.
    Edit,
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyContext {
    pub step: RitualStep,
    pub dialog_open: bool,
    pub alert_open: bool,
}

impl KeyContext {
    pub fn from_app(app: &App) -> Self {
        Self {
            step: app.step(),
            dialog_open: app.dialog.is_some(),
            alert_open: app.alert.is_some(),
        }
    }
}

/// Tracks whether typed text is arriving as a composition burst.
#[derive(Debug, Default)]
pub struct CompositionTracker {
    last_text_at: Option<Instant>,
}

impl CompositionTracker {
    /// Record a key press at `at`; returns true when the key belongs to a
    /// composition already in progress.
    pub fn observe(&mut self, key: &KeyEvent, at: Instant) -> bool {
        let composing = self
            .last_text_at
            .is_some_and(|last| at.saturating_duration_since(last) < COMPOSITION_WINDOW);

        self.last_text_at = match key.code {
            KeyCode::Char(_) if !key.modifiers.contains(KeyModifiers::CONTROL) => Some(at),
            KeyCode::Enter if composing => Some(at),
            _ => None,
        };
        composing
    }
}

pub fn resolve_key(key: &KeyEvent, ctx: KeyContext, composing: bool) -> KeyIntent {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C')) {
        return KeyIntent::Dispatch(AppAction::Quit);
    }

    if ctx.alert_open {
        return match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {
                KeyIntent::Dispatch(AppAction::DismissAlert)
            }
            _ => KeyIntent::Ignore,
        };
    }

    if ctx.dialog_open {
        return match key.code {
            KeyCode::Esc => KeyIntent::Dispatch(AppAction::CloseDialog),
            KeyCode::Enter => {
                let newline = key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT);
                if composing || newline {
                    KeyIntent::InsertNewline
                } else {
                    KeyIntent::Submit
                }
            }
            _ => KeyIntent::Edit,
        };
    }

    let confirm = matches!(key.code, KeyCode::Enter | KeyCode::Char(' '));
    let quit = matches!(key.code, KeyCode::Esc | KeyCode::Char('q'));
    match ctx.step {
        RitualStep::Question if key.code == KeyCode::Enter => {
            KeyIntent::Dispatch(AppAction::BeginRitual)
        }
        RitualStep::Question if quit => KeyIntent::Dispatch(AppAction::Quit),
        RitualStep::Blocks if confirm => KeyIntent::Dispatch(AppAction::ThrowBlocks),
        RitualStep::Draw if confirm => KeyIntent::Dispatch(AppAction::DrawLot),
        RitualStep::Blocks | RitualStep::Draw if key.code == KeyCode::Esc => {
            KeyIntent::Dispatch(AppAction::Restart)
        }
        RitualStep::Result if matches!(key.code, KeyCode::Enter | KeyCode::Char('r')) => {
            KeyIntent::Dispatch(AppAction::Restart)
        }
        RitualStep::Result if quit => KeyIntent::Dispatch(AppAction::Quit),
        _ => KeyIntent::Ignore,
    }
}

/// Normalise pasted text for the chat input.
pub fn sanitize_pasted_text(text: &str) -> String {
    let without_crlf = text.replace("\r\n", "\n");
    let without_cr = without_crlf.replace('\r', "\n");
    let expanded_tabs = without_cr.replace('\t', "    ");
    expanded_tabs
        .chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .collect()
}
