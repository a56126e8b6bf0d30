//! `tracing` subscriber: coloured console output on stderr plus a plain
//! per-command log file.
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::sync::Mutex;

use tracing::{Level, Metadata};

use super::types::{DRY_RUN_TARGET, STAGE_TARGET};
use super::utils::{format_utc_datetime, format_utc_time, log_file_path, strip_ansi};

/// What an event is, as far as formatting goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Stage,
    DryRun,
    Error,
    Warn,
    Info,
    Debug,
}

impl EventKind {
    fn of(metadata: &Metadata<'_>) -> Self {
        match (*metadata.level(), metadata.target()) {
            (Level::ERROR, _) => Self::Error,
            (Level::WARN, _) => Self::Warn,
            (Level::INFO, STAGE_TARGET) => Self::Stage,
            (Level::INFO, DRY_RUN_TARGET) => Self::DryRun,
            (Level::INFO, _) => Self::Info,
            _ => Self::Debug,
        }
    }

    /// Fixed-width tag used in the log file.
    const fn tag(self) -> &'static str {
        match self {
            Self::Stage => "stage",
            Self::DryRun => "dry-run",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

/// Plain log-file line: time, tag, message without ANSI codes.
fn file_line(kind: EventKind, time: &str, msg: &str) -> String {
    format!("{time} {:<7} {}", kind.tag(), strip_ansi(msg))
}

/// Coloured console line.
fn console_line(kind: EventKind, msg: &str) -> String {
    match kind {
        EventKind::Error => format!("\x1b[31merror:\x1b[0m {msg}"),
        EventKind::Warn => format!("\x1b[33mwarning:\x1b[0m {msg}"),
        EventKind::Stage => format!("\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
        EventKind::DryRun => format!("  \x1b[33m[dry run]\x1b[0m {msg}"),
        EventKind::Info => format!("  {msg}"),
        EventKind::Debug => format!("  \x1b[2m{msg}\x1b[0m"),
    }
}

/// Pulls the formatted `message` field out of an event.
#[derive(Default)]
struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.0 = value.to_string();
        }
    }
}

fn message_of(event: &tracing::Event<'_>) -> String {
    let mut visitor = MessageVisitor::default();
    event.record(&mut visitor);
    visitor.0
}

/// Layer appending every event it sees to the command's log file.
#[derive(Debug)]
struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Truncate `path`, write a run header and keep the file open for appends.
    fn open(path: &Path) -> std::io::Result<Self> {
        let version = option_env!("PAM_LIMITS_VERSION")
            .unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let mut file = fs::File::create(path)?;
        writeln!(file, "# pam-limits {version} {}", format_utc_datetime())?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    fn write_line(&self, line: &str) {
        if let Ok(mut file) = self.file.lock() {
            writeln!(file, "{line}").ok();
        }
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let kind = EventKind::of(event.metadata());
        self.write_line(&file_line(kind, &format_utc_time(), &message_of(event)));
    }
}

struct ConsoleFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let kind = EventKind::of(event.metadata());
        writeln!(writer, "{}", console_line(kind, &message_of(event)))
    }
}

/// Install the global subscriber. Call once, before anything logs.
///
/// The console writes to stderr so `render` output on stdout stays clean.
/// `RUST_LOG` overrides the console level; `verbose` lowers the default to
/// `DEBUG`. The log file `$XDG_CACHE_HOME/pam-limits/<command>.log` always
/// receives `DEBUG` and above, and is skipped if it cannot be created.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::{
        EnvFilter, Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let console_layer = fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        );

    let file_layer = log_file_path(command)
        .and_then(|path| FileLayer::open(&path).ok())
        .map(|layer| layer.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}
