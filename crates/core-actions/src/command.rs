//! Outbound prover commands.
//!
//! Commands are opaque strings to everything but the prover. Positions are
//! rendered from [`ExternalPos`] in the prover's 1-indexed convention, and
//! every string literal is escaped.

use core_text::{Buffer, ExternalPos, TextError, to_external};
use std::fmt::Write as _;
use std::ops::Range;

/// A buffer range already converted into prover coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProverRange {
    pub from: ExternalPos,
    pub to: ExternalPos,
}

impl ProverRange {
    pub fn of(buffer: &Buffer, range: Range<usize>) -> Result<Self, TextError> {
        Ok(Self {
            from: to_external(buffer, range.start)?,
            to: to_external(buffer, range.end)?,
        })
    }

    fn render(&self, source_path: &str) -> String {
        format!(
            "(intervalsToRange (Just (mkAbsolute {})) [Interval {} {}])",
            quote(source_path),
            point(&self.from),
            point(&self.to)
        )
    }
}

fn point(pos: &ExternalPos) -> String {
    let (offset, line, column) = pos.wire();
    format!("(Pn () {offset} {line} {column})")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProverCommand {
    /// Replace the prover's copy of the source with `text`.
    Write { text: String },
    Load,
    LoadHighlighting,
    Abort,
    GoalContext {
        label: u32,
        body: String,
    },
    GoalContextInfer {
        label: u32,
        range: ProverRange,
        body: String,
    },
    Refine {
        label: u32,
        range: ProverRange,
        body: String,
    },
    /// Re-highlight the text that just replaced a goal.
    Highlight {
        label: u32,
        range: ProverRange,
        body: String,
    },
}

impl ProverCommand {
    /// The commands that push the buffer to the prover and reload it.
    pub fn sync(buffer: &Buffer) -> Vec<ProverCommand> {
        vec![
            ProverCommand::Write {
                text: buffer.to_string(),
            },
            ProverCommand::Load,
            ProverCommand::LoadHighlighting,
        ]
    }

    pub fn render(&self, source_path: &str) -> String {
        let path = quote(source_path);
        let iotcm = |level: &str, body: String| format!("IOTCM {path} {level} Direct ({body})");
        match self {
            ProverCommand::Write { text } => format!("WRITE {text}"),
            ProverCommand::Load => iotcm("None", format!("Cmd_load {path} []")),
            ProverCommand::LoadHighlighting => iotcm(
                "Interactive",
                format!("Cmd_load_highlighting_info {path}"),
            ),
            ProverCommand::Abort => iotcm("None", "Cmd_abort".to_string()),
            ProverCommand::GoalContext { label, body } => iotcm(
                "None",
                format!(
                    "Cmd_goal_type_context Simplified {label} noRange {}",
                    quote(body)
                ),
            ),
            ProverCommand::GoalContextInfer { label, range, body } => iotcm(
                "Interactive",
                format!(
                    "Cmd_goal_type_context_infer Simplified {label} {} {}",
                    range.render(source_path),
                    quote(body)
                ),
            ),
            ProverCommand::Refine { label, range, body } => iotcm(
                "NonInteractive",
                format!(
                    "Cmd_refine_or_intro False {label} {} {}",
                    range.render(source_path),
                    quote(body)
                ),
            ),
            ProverCommand::Highlight { label, range, body } => iotcm(
                "NonInteractive",
                format!(
                    "Cmd_highlight {label} {} {}",
                    range.render(source_path),
                    quote(body)
                ),
            ),
        }
    }
}

/// A double-quoted string literal with `\`, `"` and control characters escaped.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => {
                let _ = write!(out, "\\{}", c as u32);
                // `\&` ends the numeric escape before a following digit
                if chars.peek().is_some_and(char::is_ascii_digit) {
                    out.push_str("\\&");
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
