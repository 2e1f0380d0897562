mod common;
use common::*;

use core_actions::{Action, EditKind, GoalQuery, ProverCommand};
use core_config::Config;
use pretty_assertions::assert_eq;

fn type_into_first_hole(cfg: &Config) -> core_model::SessionModel {
    let mut model = two_goal_session(cfg);
    act(&mut model, cfg, Action::MoveCursor(7));
    act(
        &mut model,
        cfg,
        Action::Edit(EditKind::Insert {
            at: 7,
            text: "suc n".into(),
        }),
    );
    assert_eq!(model.buffer().to_string(), "a = {! suc n !}\nb = {!  !}\n");
    assert_eq!(model.cursor(), 12);
    model
}

#[test]
fn sync_sends_write_load_and_highlighting() {
    let cfg = Config::default();
    let mut model = two_goal_session(&cfg);
    let result = act(&mut model, &cfg, Action::Sync);
    assert_eq!(
        rendered(&result, &cfg),
        vec![
            "WRITE a = {!  !}\nb = {!  !}\n".to_string(),
            r#"IOTCM "/tmp/my.agda" None Direct (Cmd_load "/tmp/my.agda" [])"#.to_string(),
            r#"IOTCM "/tmp/my.agda" Interactive Direct (Cmd_load_highlighting_info "/tmp/my.agda")"#
                .to_string(),
        ]
    );
}

#[test]
fn context_uses_the_hole_body() {
    let cfg = Config::default();
    let mut model = type_into_first_hole(&cfg);
    let result = act(&mut model, &cfg, Action::Goal(GoalQuery::Context));
    assert_eq!(
        result.commands,
        vec![ProverCommand::GoalContext {
            label: 0,
            body: "suc n".into()
        }]
    );
}

#[test]
fn refine_sends_the_body_range() {
    let cfg = Config::default();
    let mut model = type_into_first_hole(&cfg);
    let result = act(&mut model, &cfg, Action::Goal(GoalQuery::Refine));
    assert_eq!(
        rendered(&result, &cfg),
        vec![concat!(
            r#"IOTCM "/tmp/my.agda" NonInteractive Direct (Cmd_refine_or_intro False 0 "#,
            r#"(intervalsToRange (Just (mkAbsolute "/tmp/my.agda")) "#,
            r#"[Interval (Pn () 8 1 8) (Pn () 13 1 13)]) "suc n")"#
        )
        .to_string()]
    );
}

#[test]
fn infer_clears_highlighting_over_the_hole() {
    let cfg = Config::default();
    let mut model = type_into_first_hole(&cfg);
    assert_eq!(model.syntax().highlights_at(12).count(), 1);

    let result = act(&mut model, &cfg, Action::Goal(GoalQuery::ContextInfer));
    assert!(matches!(
        result.commands.as_slice(),
        [ProverCommand::GoalContextInfer { label: 0, .. }]
    ));
    assert_eq!(model.syntax().highlights_at(12).count(), 0);
    assert_eq!(model.syntax().holes().len(), 2);
}

#[test]
fn blank_hole_and_no_goal_send_nothing() {
    let cfg = Config::default();
    let mut model = two_goal_session(&cfg);

    act(&mut model, &cfg, Action::MoveCursor(18));
    let result = act(&mut model, &cfg, Action::Goal(GoalQuery::Context));
    assert!(result.commands.is_empty());
    assert_eq!(model.status(), "Hole at cursor is malformed.");

    act(&mut model, &cfg, Action::MoveCursor(1));
    let result = act(&mut model, &cfg, Action::Goal(GoalQuery::Refine));
    assert!(result.commands.is_empty());
    assert_eq!(model.status(), "Cursor is not at a goal.");
}

#[test]
fn abort_needs_no_goal() {
    let cfg = Config::default();
    let mut model = two_goal_session(&cfg);
    let result = act(&mut model, &cfg, Action::Abort);
    assert_eq!(result.commands, vec![ProverCommand::Abort]);
}
