mod common;
use common::*;

use core_actions::{Action, Direction};
use core_config::{Config, ConfigFile, NavigationConfig};
use core_model::SessionModel;
use core_text::Buffer;
use pretty_assertions::assert_eq;

#[test]
fn next_goal_walks_down_and_wraps() {
    let cfg = Config::default();
    let mut model = two_goal_session(&cfg);
    assert_eq!(model.buffer().to_string(), "a = {!  !}\nb = {!  !}\n");

    act(&mut model, &cfg, Action::Navigate(Direction::Next));
    assert_eq!(model.cursor(), 7);
    act(&mut model, &cfg, Action::Navigate(Direction::Next));
    assert_eq!(model.cursor(), 18);
    act(&mut model, &cfg, Action::Navigate(Direction::Next));
    assert_eq!(model.cursor(), 7);
    assert_eq!(model.status(), "Hit bottom; continuing at top");
}

#[test]
fn prev_goal_wraps_from_the_first_hole() {
    let cfg = Config::default();
    let mut model = two_goal_session(&cfg);
    act(&mut model, &cfg, Action::MoveCursor(7));

    act(&mut model, &cfg, Action::Navigate(Direction::Prev));
    assert_eq!(model.cursor(), 18);
    assert_eq!(model.status(), "Hit top; continuing at bottom");

    act(&mut model, &cfg, Action::Navigate(Direction::Prev));
    assert_eq!(model.cursor(), 7);
}

#[test]
fn navigation_without_wrap_stays_put() {
    let cfg = Config {
        file: ConfigFile {
            navigation: NavigationConfig {
                cursor_offset: 2,
                wrap: false,
            },
            ..ConfigFile::default()
        },
        ..Config::default()
    };
    let mut model = two_goal_session(&cfg);
    act(&mut model, &cfg, Action::MoveCursor(20));

    act(&mut model, &cfg, Action::Navigate(Direction::Next));
    assert_eq!(model.cursor(), 20);
    assert_eq!(model.status(), "No goal below the cursor");

    act(&mut model, &cfg, Action::Navigate(Direction::Prev));
    assert_eq!(model.cursor(), 6);
}

#[test]
fn no_holes_reports_and_keeps_cursor() {
    let cfg = Config::default();
    let mut model = SessionModel::new(Buffer::from_str("t", "plain"), 2);
    act(&mut model, &cfg, Action::MoveCursor(3));
    let result = act(&mut model, &cfg, Action::Navigate(Direction::Next));
    assert!(result.commands.is_empty());
    assert_eq!(model.cursor(), 3);
    assert_eq!(model.status(), "No goals available");
}
