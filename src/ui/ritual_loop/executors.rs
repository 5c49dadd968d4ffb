//! Runs the side effects the reducer asks for and feeds their results back
//! into the action queue.

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::app::{AppAction, AppActionDispatcher, AppCommand};
use crate::core::chat_stream::ChatStreamService;
use crate::core::client::FortuneClient;
use crate::core::lot::DRAW_ANIMATION;

pub struct CommandExecutor {
    pub client: FortuneClient,
    pub dispatcher: AppActionDispatcher,
    pub stream_service: ChatStreamService,
    pub cancel_token: CancellationToken,
}

impl CommandExecutor {
    pub fn execute(&self, command: AppCommand) {
        match command {
            AppCommand::Schedule { delay, action } => self.schedule(delay, *action),
            AppCommand::FetchLot => self.fetch_lot(),
            AppCommand::ProbeLlm { dialog_id } => self.probe_llm(dialog_id),
            AppCommand::SpawnStream(params) => self.stream_service.spawn_stream(params),
        }
    }

    fn schedule(&self, delay: std::time::Duration, action: AppAction) {
        let dispatcher = self.dispatcher.clone();
        let cancel_token = self.cancel_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => dispatcher.dispatch(action),
                _ = cancel_token.cancelled() => {}
            }
        });
    }

    /// Draw a lot. The request goes out at once; a successful result is held
    /// back until the shaking animation has run its course, a failure is
    /// reported immediately.
    fn fetch_lot(&self) {
        let client = self.client.clone();
        let dispatcher = self.dispatcher.clone();
        let cancel_token = self.cancel_token.clone();
        tokio::spawn(async move {
            let reveal_at = Instant::now() + DRAW_ANIMATION;
            let drawn = async {
                match client.draw_lot().await {
                    Ok(lot) => {
                        tokio::time::sleep_until(reveal_at).await;
                        AppAction::LotDrawn { lot }
                    }
                    Err(err) => AppAction::DrawFailed {
                        error: err.to_string(),
                    },
                }
            };
            tokio::select! {
                action = drawn => dispatcher.dispatch(action),
                _ = cancel_token.cancelled() => {}
            }
        });
    }

    fn probe_llm(&self, dialog_id: u64) {
        let client = self.client.clone();
        let dispatcher = self.dispatcher.clone();
        let cancel_token = self.cancel_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                status = client.llm_status() => dispatcher.dispatch(AppAction::LlmStatusResolved {
                    dialog_id,
                    status: status.map_err(|err| err.to_string()),
                }),
                _ = cancel_token.cancelled() => {}
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::client::test_server::{closed_port_url, serve, CannedResponse};
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn executor(base_url: &str) -> (CommandExecutor, mpsc::UnboundedReceiver<AppAction>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (stream_service, _stream_rx) = ChatStreamService::new();
        let executor = CommandExecutor {
            client: FortuneClient::new(base_url, Duration::from_secs(5)).expect("client"),
            dispatcher: AppActionDispatcher::new(tx),
            stream_service,
            cancel_token: CancellationToken::new(),
        };
        (executor, rx)
    }

    #[tokio::test]
    async fn drawn_lot_is_revealed_after_the_animation() {
        let (base_url, _) = serve(vec![CannedResponse::json(
            200,
            r#"{"number":1,"title":"t","poem":"p","meaning":"m","explanation":"e"}"#,
        )])
        .await;
        let (executor, mut rx) = executor(&base_url);
        let started = std::time::Instant::now();

        executor.execute(AppCommand::FetchLot);

        match rx.recv().await.expect("action") {
            AppAction::LotDrawn { lot } => assert_eq!(lot.number, 1),
            _ => panic!("expected drawn lot"),
        }
        assert!(started.elapsed() >= DRAW_ANIMATION);
    }

    #[tokio::test]
    async fn failed_draw_is_reported_without_waiting() {
        let base_url = closed_port_url().await;
        let (executor, mut rx) = executor(&base_url);
        let started = std::time::Instant::now();

        executor.execute(AppCommand::FetchLot);

        assert!(matches!(
            rx.recv().await.expect("action"),
            AppAction::DrawFailed { .. }
        ));
        assert!(started.elapsed() < DRAW_ANIMATION);
    }

    #[tokio::test]
    async fn probe_reports_status_for_dialog() {
        let (base_url, _) = serve(vec![CannedResponse::json(200, r#"{"ok":true}"#)]).await;
        let (executor, mut rx) = executor(&base_url);

        executor.execute(AppCommand::ProbeLlm { dialog_id: 4 });

        match rx.recv().await.expect("action") {
            AppAction::LlmStatusResolved { dialog_id, status } => {
                assert_eq!(dialog_id, 4);
                assert!(status.expect("status").ok);
            }
            _ => panic!("expected status"),
        }
    }

    #[tokio::test]
    async fn scheduled_actions_are_dropped_after_cancel() {
        let (executor, mut rx) = executor("http://127.0.0.1:9");

        executor.execute(AppCommand::Schedule {
            delay: Duration::from_millis(50),
            action: Box::new(AppAction::AdvanceToDraw { round: 0 }),
        });
        executor.cancel_token.cancel();

        let received = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
        // Either the sender side is gone or nothing arrived in time.
        assert!(!matches!(received, Ok(Some(_))));
    }
}
