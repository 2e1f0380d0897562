//! Core event types and channel helpers for goalmark.
//!
//! Everything the session reacts to arrives as an [`Event`] on one bounded
//! channel: responses from the prover and actions from the user. Producers
//! implement [`AsyncEventSource`]; the consumer loop applies events strictly
//! in arrival order on the thread that owns the buffer.

use anyhow::{Context, Result};
use core_syntax::{GoalLabel, RawSpan};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

// -------------------------------------------------------------------------------------------------
// Channel Policy
// -------------------------------------------------------------------------------------------------
// Bounded mpsc channel sized by `EVENT_CHANNEL_CAP`. Producers await `send`, which parks them until
// the consumer catches up rather than dropping events: a lost highlight batch or edit would leave
// the syntax state out of step with the buffer.
// -------------------------------------------------------------------------------------------------
pub const EVENT_CHANNEL_CAP: usize = 8192;

pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
pub static TRANSCRIPT_LINES: AtomicU64 = AtomicU64::new(0); // events decoded from transcripts
pub static TRANSCRIPT_REJECTS: AtomicU64 = AtomicU64::new(0); // lines that failed to decode

/// Top-level event enum consumed by the central event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Prover(ProverEvent),
    User(UserEvent),
    Shutdown,
}

/// A decoded prover response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProverEvent {
    /// Highlighting for the whole buffer; `null` clears all highlighting.
    Highlight { spans: Option<Vec<RawSpan>> },
    /// The goals the prover considers open, in announcement order.
    GoalLabels { labels: Vec<GoalLabel> },
    /// The prover accepted a term for a goal.
    Give { label: GoalLabel, result: GiveResult },
    /// Free-form progress or error text.
    Status { text: String },
}

/// How the hole of a solved goal is replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GiveResult {
    /// Replace the hole with this text.
    Text(String),
    /// Replace the hole with its own body wrapped in parentheses.
    Paren,
    /// Replace the hole with its own body.
    NoParen,
}

/// A user action, already resolved from whatever key or menu produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum UserEvent {
    Sync,
    Abort,
    NextGoal,
    PrevGoal,
    GoalContext,
    GoalContextInfer,
    Refine,
    MoveCursor { pos: usize },
    Insert { at: usize, text: String },
    Delete { from: usize, to: usize },
}

/// One line of a transcript file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptLine {
    Prover(ProverEvent),
    User(UserEvent),
}

impl From<TranscriptLine> for Event {
    fn from(line: TranscriptLine) -> Self {
        match line {
            TranscriptLine::Prover(p) => Event::Prover(p),
            TranscriptLine::User(u) => Event::User(u),
        }
    }
}

/// Decode one transcript line. Blank lines and `#` comments yield `None`.
pub fn parse_transcript_line(line: &str) -> Result<Option<Event>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let decoded: TranscriptLine =
        serde_json::from_str(trimmed).context("malformed transcript line")?;
    Ok(Some(decoded.into()))
}

// -------------------------------------------------------------------------------------------------
// Async Event Sources
// -------------------------------------------------------------------------------------------------
// Each source owns its async task lifecycle; on channel send failure (consumer dropped) it must
// terminate promptly. The real prover transport plugs in here as one more source.

/// Trait implemented by any async event producer. Implementors usually hold configuration and
/// spawn one background task that pushes `Event`s into the shared channel.
pub trait AsyncEventSource: Send + 'static {
    /// Human-readable stable identifier (used for logging / diagnostics).
    fn name(&self) -> &'static str;
    /// Consume self and spawn the background task, returning a JoinHandle. Implementors should
    /// stop when `tx.send(..).await` returns Err (channel closed) or on their own internal stop
    /// condition.
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

/// Registry of event sources, spawned together at startup.
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl Default for EventSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Spawn all registered sources, returning their JoinHandles. The supplied `Sender`
    /// reference stays owned by the caller; each source receives its own clone so no
    /// additional strong references linger inside the registry once this call returns.
    ///
    /// During shutdown the caller should drop its final `Sender` clone before awaiting the
    /// returned handles so the sources observe the closed channel and exit cooperatively.
    pub fn spawn_all(&mut self, tx: &Sender<Event>) -> Vec<JoinHandle<()>> {
        // Take ownership so duplicate spawns are prevented if called twice.
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning event source");
            out.push(src.spawn(tx.clone()));
        }
        out
    }
}

/// Replays a JSON-lines transcript of prover responses and user actions, then
/// emits `Event::Shutdown`. Lines that fail to decode are logged and skipped.
pub struct TranscriptEventSource {
    path: PathBuf,
}

impl TranscriptEventSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AsyncEventSource for TranscriptEventSource {
    fn name(&self) -> &'static str {
        "transcript"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let path = self.path;
        tokio::spawn(async move {
            if let Err(e) = replay(&path, &tx).await {
                tracing::error!(
                    target: "runtime.events",
                    path = %path.display(),
                    error = %e,
                    "transcript replay failed"
                );
            }
            if tx.send(Event::Shutdown).await.is_err() {
                CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
            }
        })
    }
}

async fn replay(path: &std::path::Path, tx: &Sender<Event>) -> Result<()> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("opening transcript {}", path.display()))?;
    let mut lines = tokio::io::BufReader::new(file).lines();
    let mut number = 0usize;
    while let Some(line) = lines.next_line().await? {
        number += 1;
        let event = match parse_transcript_line(&line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                TRANSCRIPT_REJECTS.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    target: "runtime.events",
                    line = number,
                    len = line.len(),
                    error = %format!("{e:#}"),
                    "skipping transcript line"
                );
                continue;
            }
        };
        TRANSCRIPT_LINES.fetch_add(1, Ordering::Relaxed);
        if tx.send(event).await.is_err() {
            CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
            break;
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests_async_sources {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct MockOnceSource;

    impl AsyncEventSource for MockOnceSource {
        fn name(&self) -> &'static str {
            "mock_once"
        }
        fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
            tokio::spawn(async move {
                let _ = tx.send(Event::User(UserEvent::Sync)).await;
            })
        }
    }

    struct MockCloseSource {
        flag: Arc<AtomicBool>,
    }

    impl AsyncEventSource for MockCloseSource {
        fn name(&self) -> &'static str {
            "mock_close"
        }

        fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
            let flag = self.flag;
            tokio::spawn(async move {
                tx.closed().await;
                flag.store(true, Ordering::SeqCst);
            })
        }
    }

    #[tokio::test]
    async fn registry_spawns_and_emits() {
        let (tx, mut rx) = mpsc::channel::<Event>(8);
        let mut reg = EventSourceRegistry::new();
        reg.register(MockOnceSource);
        assert_eq!(reg.len(), 1);
        let handles = reg.spawn_all(&tx);
        assert!(reg.is_empty(), "spawning drains the registry");

        let ev = tokio::time::timeout(Duration::from_millis(200), rx.recv())
            .await
            .expect("source should emit promptly");
        assert_eq!(ev, Some(Event::User(UserEvent::Sync)));
        for handle in handles {
            handle.await.expect("source task should exit cleanly");
        }
    }

    #[tokio::test]
    async fn registry_sources_exit_on_channel_drop() {
        let (tx, rx) = mpsc::channel::<Event>(8);
        let mut reg = EventSourceRegistry::new();
        let flag = Arc::new(AtomicBool::new(false));
        reg.register(MockCloseSource { flag: flag.clone() });
        let handles = reg.spawn_all(&tx);

        drop(tx);
        drop(rx);

        for handle in handles {
            match tokio::time::timeout(Duration::from_millis(50), handle).await {
                Ok(join_res) => join_res.expect("source task should exit cleanly"),
                Err(_) => panic!("source task did not observe channel closure"),
            }
        }

        assert!(flag.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn transcript_replays_in_order_then_shuts_down() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# session").unwrap();
        writeln!(file, r#"{{"prover":{{"kind":"goal_labels","labels":[0,1]}}}}"#).unwrap();
        writeln!(file, "garbage").unwrap();
        writeln!(file, r#"{{"user":{{"action":"next-goal"}}}}"#).unwrap();

        let (tx, mut rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
        let mut reg = EventSourceRegistry::new();
        reg.register(TranscriptEventSource::new(file.path()));
        let handles = reg.spawn_all(&tx);
        drop(tx);

        let mut events = Vec::new();
        while let Some(ev) = rx.recv().await {
            events.push(ev);
        }
        assert_eq!(
            events,
            vec![
                Event::Prover(ProverEvent::GoalLabels { labels: vec![0, 1] }),
                Event::User(UserEvent::NextGoal),
                Event::Shutdown,
            ]
        );
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn missing_transcript_still_shuts_down() {
        let (tx, mut rx) = mpsc::channel::<Event>(4);
        let handle = Box::new(TranscriptEventSource::new("__missing_transcript__.jsonl"))
            .spawn(tx);
        assert_eq!(rx.recv().await, Some(Event::Shutdown));
        handle.await.unwrap();
    }
}
