use std::{error::Error, io};

use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::{
    cursor::SetCursorStyle,
    event::{
        DisableBracketedPaste, EnableBracketedPaste, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::Terminal;

pub type RitualTerminal = Terminal<CrosstermBackend<io::Stdout>>;

/// Terminal state to undo on exit.
pub struct TerminalGuard {
    pub terminal: RitualTerminal,
    keyboard_enhanced: bool,
}

pub fn setup_terminal() -> Result<TerminalGuard, Box<dyn Error>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableBracketedPaste,
        SetCursorStyle::SteadyBar
    )?;

    // Lets Shift+Enter reach us as a distinct key where the terminal allows.
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
    }

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).inspect_err(|_| {
        let _ = disable_raw_mode();
    })?;

    Ok(TerminalGuard {
        terminal,
        keyboard_enhanced,
    })
}

pub fn restore_terminal(guard: &mut TerminalGuard) -> Result<(), Box<dyn Error>> {
    disable_raw_mode()?;
    if guard.keyboard_enhanced {
        execute!(guard.terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    execute!(
        guard.terminal.backend_mut(),
        SetCursorStyle::DefaultUserShape,
        LeaveAlternateScreen,
        DisableBracketedPaste
    )?;
    guard.terminal.show_cursor()?;
    Ok(())
}
