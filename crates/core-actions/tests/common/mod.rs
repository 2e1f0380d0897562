#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use core_actions::{Action, DispatchResult, apply_prover_event, dispatch};
use core_config::Config;
use core_events::ProverEvent;
use core_model::SessionModel;
use core_syntax::RawSpan;
use core_text::Buffer;

pub const SOURCE: &str = "a = ?\nb = ?\n";

/// A `symbol`-tagged span in the prover's 1-indexed codepoints.
pub fn symbol(start: usize, end: usize) -> RawSpan {
    RawSpan {
        start,
        end,
        tags: vec!["symbol".into()],
        meta: None,
    }
}

/// Load `SOURCE`, highlight both `?` holes and number them 0 and 1.
///
/// Afterwards the buffer reads `a = {!  !}\nb = {!  !}\n` with holes at
/// `4..10` and `15..21`.
pub fn two_goal_session(cfg: &Config) -> SessionModel {
    let mut model = SessionModel::new(Buffer::from_str("t", SOURCE), cfg.placeholder_width());
    prover(
        &mut model,
        ProverEvent::Highlight {
            spans: Some(vec![symbol(5, 6), symbol(11, 12)]),
        },
    );
    prover(&mut model, ProverEvent::GoalLabels { labels: vec![0, 1] });
    model
}

pub fn prover(model: &mut SessionModel, event: ProverEvent) -> DispatchResult {
    apply_prover_event(model, event).expect("prover event applies")
}

pub fn act(model: &mut SessionModel, cfg: &Config, action: Action) -> DispatchResult {
    dispatch(action, model, cfg).expect("action dispatches")
}

pub fn rendered(result: &DispatchResult, cfg: &Config) -> Vec<String> {
    result
        .commands
        .iter()
        .map(|c| c.render(cfg.source_path()))
        .collect()
}
