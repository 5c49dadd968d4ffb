use tracing::debug;

use super::{App, AppAction, AppCommand};
use crate::core::app::dialog::LlmAvailability;
use crate::core::chat_stream::StreamParams;

pub(super) fn handle_chat_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::CloseDialog => {
            if app.dialog.is_some() {
                app.close_result_dialog();
            }
            None
        }
        AppAction::SubmitChat { text } => submit_chat(app, text),
        AppAction::LlmStatusResolved { dialog_id, status } => {
            match app.dialog.as_mut().filter(|dialog| dialog.id() == dialog_id) {
                Some(dialog) => dialog.set_llm(LlmAvailability::from_probe(status)),
                None => debug!(dialog_id, "dropping status for a closed dialog"),
            }
            None
        }
        AppAction::StreamUpdate { stream_id, message } => {
            let applied = app
                .dialog
                .as_mut()
                .is_some_and(|dialog| dialog.apply_stream_message(stream_id, message));
            if !applied {
                debug!(stream_id, "dropping stream message with no waiting reply");
            }
            None
        }
        _ => None,
    }
}

fn submit_chat(app: &mut App, text: String) -> Option<AppCommand> {
    let question = text.trim();
    if question.is_empty() || app.dialog.is_none() {
        return None;
    }

    let stream_id = app.session.next_id();
    let dialog = app.dialog.as_mut()?;
    let request = dialog.begin_turn(question, stream_id);
    app.clear_input();

    Some(AppCommand::SpawnStream(StreamParams {
        client: app.session.client.clone(),
        request,
        cancel_token: app.session.cancel_token.clone(),
        stream_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::apply_action;
    use crate::core::app::dialog::{CONNECTION_ERROR, LLM_START_HINT};
    use crate::core::chat_stream::StreamMessage;
    use crate::core::client::LlmStatus;
    use crate::core::message::{ChatMessage, ChatRole};
    use crate::core::step::RitualStep;
    use crate::utils::test_utils::{create_test_app, sample_lot};

    fn app_with_dialog() -> (App, u64) {
        let mut app = create_test_app();
        let id = app.open_result_dialog(sample_lot(3));
        app.navigator.show(RitualStep::Result);
        (app, id)
    }

    fn submit(app: &mut App, text: &str) -> Option<AppCommand> {
        apply_action(app, AppAction::SubmitChat { text: text.into() })
    }

    fn stream_id_of(command: Option<AppCommand>) -> (u64, crate::core::client::ChatRequest) {
        match command {
            Some(AppCommand::SpawnStream(params)) => (params.stream_id, params.request),
            _ => panic!("expected stream"),
        }
    }

    #[test]
    fn blank_messages_are_ignored() {
        let (mut app, _) = app_with_dialog();
        assert!(submit(&mut app, "").is_none());
        assert!(submit(&mut app, "   ").is_none());
        assert!(submit(&mut app, "\n\t").is_none());
        assert!(app.dialog.as_ref().expect("dialog").log().is_empty());
    }

    #[test]
    fn messages_without_a_lot_are_ignored() {
        let mut app = create_test_app();
        assert!(submit(&mut app, "hello").is_none());
    }

    #[test]
    fn submit_shows_question_and_placeholder_immediately() {
        let (mut app, _) = app_with_dialog();
        app.input.insert_str("  問感情  ");

        let (_, request) = stream_id_of(submit(&mut app, "  問感情  "));

        assert_eq!(request.message, "問感情");
        assert_eq!(request.lot.number, 3);
        let log = app.dialog.as_ref().expect("dialog").log();
        assert_eq!(log[0].role, ChatRole::User);
        assert_eq!(log[0].content, "問感情");
        assert!(log[1].is_waiting());
        assert!(app.input_text().is_empty());
    }

    #[test]
    fn streamed_reply_completes_turn() {
        let (mut app, _) = app_with_dialog();
        let (stream_id, _) = stream_id_of(submit(&mut app, "first"));

        for message in [
            StreamMessage::Chunk("A".into()),
            StreamMessage::Chunk("B".into()),
            StreamMessage::End,
        ] {
            apply_action(&mut app, AppAction::StreamUpdate { stream_id, message });
        }

        let dialog = app.dialog.as_ref().expect("dialog");
        assert_eq!(dialog.log()[1].content, "AB");
        assert_eq!(
            dialog.history(),
            &[ChatMessage::user("first"), ChatMessage::assistant("AB")]
        );

        let (_, request) = stream_id_of(submit(&mut app, "second"));
        assert_eq!(request.history.len(), 2);
    }

    #[test]
    fn fallback_reply_replaces_partial_stream_text() {
        let (mut app, _) = app_with_dialog();
        let (stream_id, _) = stream_id_of(submit(&mut app, "q"));

        for message in [
            StreamMessage::Chunk("半".into()),
            StreamMessage::Reply("完整回覆".into()),
            StreamMessage::End,
        ] {
            apply_action(&mut app, AppAction::StreamUpdate { stream_id, message });
        }

        let dialog = app.dialog.as_ref().expect("dialog");
        assert_eq!(dialog.log().len(), 2);
        assert_eq!(dialog.log()[1].content, "完整回覆");
        assert_eq!(
            dialog.history(),
            &[ChatMessage::user("q"), ChatMessage::assistant("完整回覆")]
        );
    }

    #[test]
    fn failed_reply_shows_connection_error() {
        let (mut app, _) = app_with_dialog();
        let (stream_id, _) = stream_id_of(submit(&mut app, "q"));

        apply_action(
            &mut app,
            AppAction::StreamUpdate {
                stream_id,
                message: StreamMessage::Failed,
            },
        );

        let log = app.dialog.as_ref().expect("dialog").log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].content, CONNECTION_ERROR);
    }

    #[test]
    fn close_then_reopen_starts_a_fresh_transcript() {
        let (mut app, _) = app_with_dialog();
        let (stream_id, _) = stream_id_of(submit(&mut app, "q"));
        apply_action(
            &mut app,
            AppAction::StreamUpdate {
                stream_id,
                message: StreamMessage::End,
            },
        );

        apply_action(&mut app, AppAction::CloseDialog);
        assert!(app.dialog.is_none());
        assert_eq!(app.step(), RitualStep::Question);

        app.open_result_dialog(sample_lot(9));
        let dialog = app.dialog.as_ref().expect("dialog");
        assert!(dialog.history().is_empty());
        assert!(dialog.log().is_empty());
        assert_eq!(dialog.lot().number, 9);
    }

    #[test]
    fn stream_messages_after_close_are_dropped() {
        let (mut app, _) = app_with_dialog();
        let (stream_id, _) = stream_id_of(submit(&mut app, "q"));
        apply_action(&mut app, AppAction::CloseDialog);
        app.open_result_dialog(sample_lot(4));

        apply_action(
            &mut app,
            AppAction::StreamUpdate {
                stream_id,
                message: StreamMessage::Chunk("stale".into()),
            },
        );

        assert!(app.dialog.as_ref().expect("dialog").log().is_empty());
    }

    #[test]
    fn status_for_current_dialog_is_rendered() {
        let (mut app, id) = app_with_dialog();
        apply_action(
            &mut app,
            AppAction::LlmStatusResolved {
                dialog_id: id,
                status: Ok(LlmStatus {
                    ok: true,
                    message: None,
                }),
            },
        );
        assert_eq!(
            app.dialog.as_ref().expect("dialog").llm(),
            &LlmAvailability::Connected
        );
    }

    #[test]
    fn status_for_replaced_dialog_is_dropped() {
        let (mut app, old_id) = app_with_dialog();
        app.open_result_dialog(sample_lot(5));

        apply_action(
            &mut app,
            AppAction::LlmStatusResolved {
                dialog_id: old_id,
                status: Err("refused".into()),
            },
        );
        assert_eq!(
            app.dialog.as_ref().expect("dialog").llm(),
            &LlmAvailability::Checking
        );

        let new_id = app.dialog.as_ref().expect("dialog").id();
        apply_action(
            &mut app,
            AppAction::LlmStatusResolved {
                dialog_id: new_id,
                status: Err("refused".into()),
            },
        );
        assert_eq!(
            app.dialog.as_ref().expect("dialog").llm(),
            &LlmAvailability::Unavailable(LLM_START_HINT.into())
        );
    }
}
