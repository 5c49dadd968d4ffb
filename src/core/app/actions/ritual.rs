use tracing::{debug, warn};

use super::{App, AppAction, AppCommand};
use crate::core::blocks::{self, ADVANCE_DELAY, THROW_ANIMATION};
use crate::core::step::RitualStep;

/// Alert raised when a lot could not be drawn.
pub const DRAW_FAILED_ALERT: &str = "抽籤過程中發生錯誤，請稍後再試。";

pub(super) fn handle_ritual_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::BeginRitual => {
            if app.step() != RitualStep::Question {
                return None;
            }
            app.blocks.message.clear();
            app.blocks.faces = None;
            app.navigator.show(RitualStep::Blocks);
            None
        }
        AppAction::ThrowBlocks => throw_blocks(app),
        AppAction::BlocksLanded { round, throw } => {
            app.blocks.throwing = false;
            app.blocks.throw_enabled = true;
            if round != app.navigator.round() {
                debug!(round, "dropping throw from an earlier round");
                return None;
            }

            app.blocks.faces = Some(throw.faces);
            app.blocks.message = throw.outcome.message().to_string();
            throw.outcome.advances().then(|| AppCommand::Schedule {
                delay: ADVANCE_DELAY,
                action: Box::new(AppAction::AdvanceToDraw { round }),
            })
        }
        AppAction::AdvanceToDraw { round } => {
            if round == app.navigator.round() && app.step() == RitualStep::Blocks {
                app.navigator.show(RitualStep::Draw);
            }
            None
        }
        AppAction::DrawLot => {
            if app.step() != RitualStep::Draw || !app.draw.draw_enabled {
                return None;
            }
            app.draw.draw_enabled = false;
            app.draw.shaking = true;
            Some(AppCommand::FetchLot)
        }
        AppAction::LotDrawn { lot } => {
            app.draw.shaking = false;
            app.draw.draw_enabled = true;
            debug!(number = lot.number, "lot drawn");
            let dialog_id = app.open_result_dialog(lot);
            app.navigator.show(RitualStep::Result);
            Some(AppCommand::ProbeLlm { dialog_id })
        }
        AppAction::DrawFailed { error } => {
            warn!(%error, "drawing a lot failed");
            app.draw.shaking = false;
            app.draw.draw_enabled = true;
            app.alert = Some(DRAW_FAILED_ALERT.to_string());
            None
        }
        AppAction::Restart => {
            if app.draw.shaking {
                return None;
            }
            app.close_result_dialog();
            None
        }
        AppAction::DismissAlert => {
            app.alert = None;
            None
        }
        _ => None,
    }
}

fn throw_blocks(app: &mut App) -> Option<AppCommand> {
    if app.step() != RitualStep::Blocks || !app.blocks.throw_enabled {
        return None;
    }

    app.blocks.throw_enabled = false;
    app.blocks.throwing = true;
    app.blocks.faces = None;
    app.blocks.message.clear();

    Some(AppCommand::Schedule {
        delay: THROW_ANIMATION,
        action: Box::new(AppAction::BlocksLanded {
            round: app.navigator.round(),
            throw: blocks::throw_blocks(),
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::apply_action;
    use crate::core::blocks::{BlockFace, BlockThrow, ThrowOutcome};
    use crate::utils::test_utils::{create_test_app, sample_lot};

    fn land(app: &mut App, first: BlockFace, second: BlockFace) -> Option<AppCommand> {
        let round = app.navigator.round();
        apply_action(
            app,
            AppAction::BlocksLanded {
                round,
                throw: BlockThrow::from_faces(first, second),
            },
        )
    }

    fn app_at(step: RitualStep) -> App {
        let mut app = create_test_app();
        app.navigator.show(step);
        app
    }

    #[test]
    fn begin_ritual_moves_from_question_to_blocks() {
        let mut app = create_test_app();
        assert!(apply_action(&mut app, AppAction::BeginRitual).is_none());
        assert_eq!(app.step(), RitualStep::Blocks);
    }

    #[test]
    fn throw_disables_trigger_until_blocks_land() {
        let mut app = app_at(RitualStep::Blocks);
        app.blocks.message = "old".into();

        let command = apply_action(&mut app, AppAction::ThrowBlocks);
        match command {
            Some(AppCommand::Schedule { delay, action }) => {
                assert_eq!(delay, THROW_ANIMATION);
                assert!(matches!(*action, AppAction::BlocksLanded { .. }));
            }
            _ => panic!("expected scheduled landing"),
        }
        assert!(!app.blocks.throw_enabled);
        assert!(app.blocks.throwing);
        assert!(app.blocks.message.is_empty());

        // A second press during the animation does nothing.
        assert!(apply_action(&mut app, AppAction::ThrowBlocks).is_none());
    }

    #[test]
    fn only_sheng_schedules_advance() {
        use BlockFace::{FlatDown, FlatUp};

        for (first, second) in [
            (FlatUp, FlatDown),
            (FlatDown, FlatUp),
            (FlatUp, FlatUp),
            (FlatDown, FlatDown),
        ] {
            let mut app = app_at(RitualStep::Blocks);
            apply_action(&mut app, AppAction::ThrowBlocks);
            let command = land(&mut app, first, second);
            let outcome = ThrowOutcome::classify(first, second);

            assert!(app.blocks.throw_enabled, "trigger re-enabled for {outcome:?}");
            assert_eq!(app.blocks.message, outcome.message());
            assert_eq!(app.blocks.faces, Some([first, second]));
            match command {
                Some(AppCommand::Schedule { delay, action }) => {
                    assert_eq!(outcome, ThrowOutcome::Sheng);
                    assert_eq!(delay, ADVANCE_DELAY);
                    assert!(matches!(*action, AppAction::AdvanceToDraw { .. }));
                }
                None => assert_ne!(outcome, ThrowOutcome::Sheng),
                _ => panic!("unexpected command"),
            }
            assert_eq!(app.step(), RitualStep::Blocks);
        }
    }

    #[test]
    fn advance_moves_to_draw_step() {
        let mut app = app_at(RitualStep::Blocks);
        let round = app.navigator.round();
        apply_action(&mut app, AppAction::AdvanceToDraw { round });
        assert_eq!(app.step(), RitualStep::Draw);
    }

    #[test]
    fn advance_from_an_abandoned_round_is_dropped() {
        let mut app = app_at(RitualStep::Blocks);
        let round = app.navigator.round();
        apply_action(&mut app, AppAction::Restart);
        apply_action(&mut app, AppAction::BeginRitual);

        apply_action(&mut app, AppAction::AdvanceToDraw { round });
        assert_eq!(app.step(), RitualStep::Blocks);
    }

    #[test]
    fn landing_from_an_abandoned_round_only_reenables_trigger() {
        let mut app = app_at(RitualStep::Blocks);
        apply_action(&mut app, AppAction::ThrowBlocks);
        let stale_round = app.navigator.round();
        apply_action(&mut app, AppAction::Restart);
        apply_action(&mut app, AppAction::BeginRitual);

        let command = apply_action(
            &mut app,
            AppAction::BlocksLanded {
                round: stale_round,
                throw: BlockThrow::from_faces(BlockFace::FlatUp, BlockFace::FlatDown),
            },
        );
        assert!(command.is_none());
        assert!(app.blocks.throw_enabled);
        assert!(app.blocks.message.is_empty());
    }

    #[test]
    fn draw_disables_trigger_and_requests_lot() {
        let mut app = app_at(RitualStep::Draw);
        let command = apply_action(&mut app, AppAction::DrawLot);
        assert!(matches!(command, Some(AppCommand::FetchLot)));
        assert!(app.draw.shaking);
        assert!(!app.draw.draw_enabled);
        assert!(apply_action(&mut app, AppAction::DrawLot).is_none());
    }

    #[test]
    fn drawn_lot_opens_dialog_and_probes_llm() {
        let mut app = app_at(RitualStep::Draw);
        apply_action(&mut app, AppAction::DrawLot);

        let command = apply_action(&mut app, AppAction::LotDrawn { lot: sample_lot(7) });

        let dialog = app.dialog.as_ref().expect("dialog open");
        assert_eq!(dialog.lot().number, 7);
        match command {
            Some(AppCommand::ProbeLlm { dialog_id }) => assert_eq!(dialog_id, dialog.id()),
            _ => panic!("expected status probe"),
        }
        assert_eq!(app.step(), RitualStep::Result);
        assert!(app.draw.draw_enabled);
        assert!(!app.draw.shaking);
    }

    #[test]
    fn failed_draw_alerts_and_stays_on_draw_step() {
        let mut app = app_at(RitualStep::Draw);
        apply_action(&mut app, AppAction::DrawLot);

        apply_action(
            &mut app,
            AppAction::DrawFailed {
                error: "connection refused".into(),
            },
        );

        assert_eq!(app.alert.as_deref(), Some(DRAW_FAILED_ALERT));
        assert!(app.draw.draw_enabled);
        assert_eq!(app.step(), RitualStep::Draw);
        assert!(app.dialog.is_none());

        apply_action(&mut app, AppAction::DismissAlert);
        assert!(app.alert.is_none());
    }

    #[test]
    fn restart_is_ignored_while_a_draw_is_in_flight() {
        let mut app = app_at(RitualStep::Draw);
        apply_action(&mut app, AppAction::DrawLot);
        apply_action(&mut app, AppAction::Restart);
        assert_eq!(app.step(), RitualStep::Draw);
    }
}
