//! goalmark entrypoint: replays a prover/user transcript against a source file.
use anyhow::{Context, Result};
use clap::Parser;
use core_actions::{Action, DispatchResult, apply_prover_event, dispatch};
use core_config::{Config, load_from};
use core_events::{EVENT_CHANNEL_CAP, Event, EventSourceRegistry, TranscriptEventSource};
use core_model::SessionModel;
use core_syntax::GoalPoint;
use core_text::Buffer;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "goalmark", version, about = "Proof-hole tracking against a prover transcript")]
struct Args {
    /// Source file the prover is checking.
    pub source: PathBuf,
    /// JSON-lines transcript of prover responses and user actions.
    #[arg(long = "transcript")]
    pub transcript: PathBuf,
    /// Optional configuration file path (overrides discovery of `goalmark.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Print the final buffer after the summary.
    #[arg(long = "print-buffer")]
    pub print_buffer: bool,
}

struct AppStartup {
    _log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self { _log_guard: None }
    }

    fn run(&mut self, args: &Args) -> Result<(SessionModel, Config)> {
        self.configure_logging()?;
        Self::install_panic_hook();
        info!(target: "runtime", "startup");

        let config = load_from(args.config.clone())?;
        let buffer = load_source(&args.source)?;
        info!(
            target: "runtime.startup",
            source = %args.source.display(),
            transcript = %args.transcript.display(),
            len = buffer.len(),
            lines = buffer.line_count(),
            config_override = args.config.is_some(),
            placeholder_width = config.placeholder_width(),
            "bootstrap_complete"
        );
        let model = SessionModel::new(buffer, config.placeholder_width());
        Ok((model, config))
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join("goalmark.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, "goalmark.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => {
                self._log_guard = Some(guard);
            }
            Err(_err) => {
                // Global tracing subscriber already installed; drop guard so writer shuts down.
            }
        }

        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

fn load_source(path: &Path) -> Result<Buffer> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading source {}", path.display()))?;
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("source");
    tracing::debug!(target: "io", file = %path.display(), size_bytes = content.len(), "file_read_ok");
    Ok(Buffer::from_str(name, &content))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownReason {
    ShutdownEvent,
    ChannelClosed,
}

impl ShutdownReason {
    fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::ShutdownEvent => "shutdown_event",
            ShutdownReason::ChannelClosed => "channel_closed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owns the session and drains the event channel in arrival order.
struct SessionRuntime {
    model: SessionModel,
    config: Config,
    rx: mpsc::Receiver<Event>,
    source_handles: Vec<JoinHandle<()>>,
}

impl SessionRuntime {
    fn new(
        model: SessionModel,
        config: Config,
        rx: mpsc::Receiver<Event>,
        source_handles: Vec<JoinHandle<()>>,
    ) -> Self {
        Self {
            model,
            config,
            rx,
            source_handles,
        }
    }

    /// Apply events until the transcript ends. Rejected events are reported
    /// and skipped; only output failures end the loop early.
    async fn run<W: Write>(&mut self, out: &mut W) -> Result<ShutdownReason> {
        let span = tracing::debug_span!(target: "runtime", "event_loop");
        let _enter = span.enter();

        let mut reason = ShutdownReason::ChannelClosed;
        let mut last_status = self.model.status().to_string();
        while let Some(event) = self.rx.recv().await {
            let result = match event {
                Event::Prover(prover) => apply_prover_event(&mut self.model, prover),
                Event::User(user) => dispatch(Action::from(user), &mut self.model, &self.config),
                Event::Shutdown => {
                    reason = ShutdownReason::ShutdownEvent;
                    break;
                }
            };
            match result {
                Ok(result) => self.emit(&result, out)?,
                Err(err) => {
                    warn!(target: "runtime", error = %format!("{err:#}"), "event_rejected");
                    writeln!(out, "!! {err:#}")?;
                }
            }
            if self.model.status() != last_status {
                last_status = self.model.status().to_string();
                writeln!(out, "-- {last_status}")?;
            }
        }

        self.rx.close();
        self.finalize_shutdown(reason).await;
        Ok(reason)
    }

    fn emit<W: Write>(&self, result: &DispatchResult, out: &mut W) -> Result<()> {
        for command in &result.commands {
            writeln!(out, ">> {}", command.render(self.config.source_path()))?;
        }
        if result.update.reset {
            writeln!(out, "!! highlighting reset")?;
        }
        Ok(())
    }

    async fn finalize_shutdown(&mut self, reason: ShutdownReason) {
        trace!(target: "runtime.shutdown", %reason, "begin");
        while let Some(handle) = self.source_handles.pop() {
            match tokio::time::timeout(Duration::from_millis(200), handle).await {
                Ok(Ok(_)) => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_stopped"
                ),
                Ok(Err(err)) if err.is_cancelled() => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_cancelled"
                ),
                Ok(Err(err)) => error!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    ?err,
                    "event_source_task_error"
                ),
                Err(_) => warn!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_timeout"
                ),
            }
        }
        info!(target: "runtime.shutdown", %reason, "complete");
    }

    fn write_summary<W: Write>(&self, out: &mut W, print_buffer: bool) -> Result<()> {
        let syntax = self.model.syntax();
        writeln!(
            out,
            "== {} highlights, {} holes, {} goals",
            syntax.highlights().len(),
            syntax.holes().len(),
            syntax.goals().len()
        )?;
        for hole in syntax.holes() {
            let goal = match syntax.goal_of(hole.value) {
                Some(GoalPoint {
                    label: Some(label), ..
                }) => format!("goal {label}"),
                _ if syntax.is_unnumbered(hole.value) => "unnumbered".to_string(),
                _ => "unbound".to_string(),
            };
            let text = self.model.buffer().slice(hole.from, hole.to)?;
            writeln!(out, "{} {}..{} {goal} {text}", hole.value, hole.from, hole.to)?;
        }
        if !syntax.unbound_labels().is_empty() {
            writeln!(out, "== unbound labels {:?}", syntax.unbound_labels())?;
        }
        writeln!(out, "== cursor {}", self.model.cursor())?;
        if print_buffer {
            write!(out, "{}", self.model.buffer())?;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut startup = AppStartup::new();
    let (model, config) = startup.run(&args)?;

    let (tx, rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let mut registry = EventSourceRegistry::new();
    registry.register(TranscriptEventSource::new(&args.transcript));
    let source_handles = registry.spawn_all(&tx);
    // the loop ends once every source has dropped its sender
    drop(tx);

    let mut runtime = SessionRuntime::new(model, config, rx, source_handles);
    let mut out = std::io::stdout().lock();
    runtime.run(&mut out).await?;
    runtime.write_summary(&mut out, args.print_buffer)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::{ProverEvent, UserEvent};
    use core_syntax::RawSpan;
    use pretty_assertions::assert_eq;
    use std::io::Write as _;

    fn symbol(start: usize, end: usize) -> RawSpan {
        RawSpan {
            start,
            end,
            tags: vec!["symbol".into()],
            meta: None,
        }
    }

    fn runtime(source: &str, events: Vec<Event>) -> SessionRuntime {
        let (tx, rx) = mpsc::channel::<Event>(events.len() + 1);
        for event in events {
            tx.try_send(event).expect("channel has room");
        }
        let model = SessionModel::new(Buffer::from_str("t", source), 2);
        SessionRuntime::new(model, Config::default(), rx, Vec::new())
    }

    fn output(bytes: Vec<u8>) -> Vec<String> {
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn replays_a_session_and_summarizes() {
        let mut rt = runtime(
            "f x = ?\n",
            vec![
                Event::Prover(ProverEvent::Highlight {
                    spans: Some(vec![symbol(7, 8)]),
                }),
                Event::Prover(ProverEvent::GoalLabels { labels: vec![0] }),
                Event::User(UserEvent::NextGoal),
                Event::User(UserEvent::Abort),
                Event::Shutdown,
            ],
        );
        let mut out = Vec::new();
        let reason = rt.run(&mut out).await.unwrap();
        assert_eq!(reason, ShutdownReason::ShutdownEvent);
        rt.write_summary(&mut out, true).unwrap();
        assert_eq!(
            output(out),
            vec![
                "-- Highlighted 1 ranges with doc length 13.",
                r#">> IOTCM "/tmp/my.agda" None Direct (Cmd_abort)"#,
                "== 1 highlights, 1 holes, 1 goals",
                "hole#0.0 6..12 goal 0 {!  !}",
                "== cursor 9",
                "f x = {!  !}",
            ]
        );
    }

    #[tokio::test]
    async fn rejected_events_are_reported_and_skipped() {
        let mut rt = runtime(
            "abc",
            vec![
                Event::User(UserEvent::MoveCursor { pos: 99 }),
                Event::User(UserEvent::Insert {
                    at: 3,
                    text: "d".into(),
                }),
            ],
        );
        let mut out = Vec::new();
        let reason = rt.run(&mut out).await.unwrap();
        assert_eq!(reason, ShutdownReason::ChannelClosed);
        let lines = output(out);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("!! "), "{lines:?}");
        assert_eq!(rt.model.buffer().to_string(), "abcd");
    }

    #[tokio::test]
    async fn transcript_file_drives_the_session() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"prover":{{"kind":"highlight","spans":[{{"start":5,"end":6,"tags":["symbol"]}}]}}}}"#
        )
        .unwrap();
        writeln!(file, r#"{{"prover":{{"kind":"goal_labels","labels":[4]}}}}"#).unwrap();
        writeln!(
            file,
            r#"{{"prover":{{"kind":"give","label":4,"result":{{"text":"tt"}}}}}}"#
        )
        .unwrap();

        let (tx, rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
        let mut registry = EventSourceRegistry::new();
        registry.register(TranscriptEventSource::new(file.path()));
        let handles = registry.spawn_all(&tx);
        drop(tx);
        let model = SessionModel::new(Buffer::from_str("t", "x = ?"), 2);
        let mut rt = SessionRuntime::new(model, Config::default(), rx, handles);

        let mut out = Vec::new();
        assert_eq!(
            rt.run(&mut out).await.unwrap(),
            ShutdownReason::ShutdownEvent
        );
        let lines = output(out);
        assert!(
            lines
                .iter()
                .any(|l| l.starts_with(">> ") && l.contains("Cmd_highlight 4")),
            "{lines:?}"
        );
        assert_eq!(rt.model.buffer().to_string(), "x = tt");
        assert!(rt.model.syntax().holes().is_empty());
    }
}
