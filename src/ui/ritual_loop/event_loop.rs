use std::{error::Error, io, time::Duration};

use ratatui::crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::info;

use super::executors::CommandExecutor;
use super::keys::{resolve_key, sanitize_pasted_text, CompositionTracker, KeyContext, KeyIntent};
use super::lifecycle::{restore_terminal, setup_terminal, RitualTerminal};
use crate::core::app::{apply_actions, App, AppAction, AppActionDispatcher};
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::core::client::FortuneClient;
use crate::ui::renderer::ui;

enum UiEvent {
    Crossterm(Event),
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => continue,
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

fn try_draw_frame(
    app: &mut App,
    terminal: &mut RitualTerminal,
    request_redraw: &mut bool,
    last_draw: &mut Instant,
    frame_duration: Duration,
) -> io::Result<()> {
    if !*request_redraw {
        return Ok(());
    }

    let now = Instant::now();
    if now.duration_since(*last_draw) < frame_duration {
        return Ok(());
    }

    terminal.draw(|f| ui(f, app))?;
    *last_draw = now;
    *request_redraw = false;
    Ok(())
}

/// Turn pending terminal events into actions or input edits. Returns true
/// when anything was processed.
fn process_ui_events(
    app: &mut App,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    dispatcher: &AppActionDispatcher,
    composition: &mut CompositionTracker,
) -> bool {
    let mut processed = false;
    while let Ok(UiEvent::Crossterm(ev)) = event_rx.try_recv() {
        processed = true;
        match ev {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                let composing = composition.observe(&key, std::time::Instant::now());
                route_key(app, dispatcher, key, composing);
            }
            Event::Paste(text) => handle_paste(app, &text),
            _ => {}
        }
    }
    processed
}

fn route_key(app: &mut App, dispatcher: &AppActionDispatcher, key: KeyEvent, composing: bool) {
    match resolve_key(&key, KeyContext::from_app(app), composing) {
        KeyIntent::Dispatch(action) => dispatcher.dispatch(action),
        KeyIntent::Submit => dispatcher.dispatch(AppAction::SubmitChat {
            text: app.input_text(),
        }),
        KeyIntent::InsertNewline => app.input.insert_newline(),
        KeyIntent::Edit => {
            app.input.input(tui_textarea::Input::from(key));
        }
        KeyIntent::Ignore => {}
    }
}

/// A bracketed paste is one composition: inserted whole, never submitted.
fn handle_paste(app: &mut App, text: &str) {
    if app.dialog.is_none() || app.alert.is_some() {
        return;
    }
    app.input.insert_str(sanitize_pasted_text(text));
}

fn process_stream_updates(
    dispatcher: &AppActionDispatcher,
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
) -> bool {
    let updates: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    let received_any = !updates.is_empty();
    dispatcher.dispatch_many(
        updates
            .into_iter()
            .map(|(message, stream_id)| AppAction::StreamUpdate { stream_id, message }),
    );
    received_any
}

fn drain_action_queue(
    app: &mut App,
    executor: &CommandExecutor,
    action_rx: &mut mpsc::UnboundedReceiver<AppAction>,
) -> bool {
    let actions: Vec<AppAction> = std::iter::from_fn(|| action_rx.try_recv().ok()).collect();
    if actions.is_empty() {
        return false;
    }
    for command in apply_actions(app, actions) {
        executor.execute(command);
    }
    true
}

pub async fn run_ritual(client: FortuneClient) -> Result<(), Box<dyn Error>> {
    info!(server = client.base_url(), "starting ritual");
    let mut app = App::new(client.clone());

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<AppAction>();
    let dispatcher = AppActionDispatcher::new(action_tx);
    let (stream_service, mut stream_rx) = ChatStreamService::new();
    let executor = CommandExecutor {
        client,
        dispatcher: dispatcher.clone(),
        stream_service,
        cancel_token: app.session.cancel_token.clone(),
    };

    let mut guard = setup_terminal()?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader_handle = spawn_event_reader(event_tx);

    const MAX_FPS: u64 = 60;
    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;
    let mut composition = CompositionTracker::default();

    let result: Result<(), Box<dyn Error>> = loop {
        if app.exit_requested {
            break Ok(());
        }

        if let Err(err) = try_draw_frame(
            &mut app,
            &mut guard.terminal,
            &mut request_redraw,
            &mut last_draw,
            frame_duration,
        ) {
            break Err(err.into());
        }

        let events_processed =
            process_ui_events(&mut app, &mut event_rx, &dispatcher, &mut composition);
        let received_any = process_stream_updates(&dispatcher, &mut stream_rx);
        let actions_applied = drain_action_queue(&mut app, &executor, &mut action_rx);

        if events_processed || received_any || actions_applied {
            request_redraw = true;
        }

        // Keep the throwing and shaking cues moving.
        if app.blocks.throwing || app.draw.shaking || has_pending_reply(&app) {
            request_redraw = true;
        }

        if !events_processed && !received_any && !actions_applied {
            tokio::time::sleep(frame_duration).await;
        }
    };

    app.session.cancel_token.cancel();
    event_reader_handle.abort();
    restore_terminal(&mut guard)?;
    info!("ritual closed");

    result
}

fn has_pending_reply(app: &App) -> bool {
    app.dialog.as_ref().is_some_and(|dialog| dialog.has_pending())
}
