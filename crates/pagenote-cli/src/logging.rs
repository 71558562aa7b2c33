use std::io::Write;

use nu_ansi_term::Color::{Blue, Magenta, Red, Yellow};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::{
    fmt::{
        self,
        format::{FmtSpan, Writer},
        FmtContext, FormatEvent, FormatFields, MakeWriter,
    },
    registry::LookupSpan,
};

use crate::{
    cli::{Args, Commands},
    utils::Colored,
};

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        }
    }
}

/// Plain message for INFO, a colored `[LEVEL]` prefix for everything else.
pub struct LevelPrefixFormatter;

impl<S, N> FormatEvent<S, N> for LevelPrefixFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let prefix = match *event.metadata().level() {
            Level::TRACE => Some(Colored(Magenta, "[TRACE]")),
            Level::DEBUG => Some(Colored(Blue, "[DEBUG]")),
            Level::INFO => None,
            Level::WARN => Some(Colored(Yellow, "[WARN]")),
            Level::ERROR => Some(Colored(Red, "[ERROR]")),
        };
        if let Some(prefix) = prefix {
            write!(writer, "{prefix} ")?;
        }

        writeln!(writer, "{}", visitor.message.unwrap_or_default())
    }
}

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    /// INFO lines are user-facing output and go to stdout, unless stdout is
    /// reserved for machine-readable replies. Everything else goes to stderr.
    pub fn for_level(level: &Level, stdout_reserved: bool) -> Self {
        if *level == Level::INFO && !stdout_reserved {
            Self::Stdout
        } else {
            Self::Stderr
        }
    }
}

/// Collects one formatted event and writes it out in a single call on drop.
pub struct EventWriter {
    buffer: Vec<u8>,
    stream: Stream,
}

impl Write for EventWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for EventWriter {
    fn drop(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let _ = match self.stream {
            Stream::Stdout => std::io::stdout().lock().write_all(&self.buffer),
            Stream::Stderr => std::io::stderr().lock().write_all(&self.buffer),
        };
    }
}

struct StreamSelector {
    stdout_reserved: bool,
}

impl<'a> MakeWriter<'a> for StreamSelector {
    type Writer = EventWriter;

    fn make_writer(&'a self) -> Self::Writer {
        EventWriter {
            buffer: Vec::new(),
            stream: Stream::Stderr,
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        EventWriter {
            buffer: Vec::new(),
            stream: Stream::for_level(meta.level(), self.stdout_reserved),
        }
    }
}

/// Whether stdout carries JSON replies that log lines must not interleave with.
pub fn stdout_reserved(args: &Args) -> bool {
    args.json || matches!(args.command, Commands::Route)
}

pub fn setup_logging(args: &Args) {
    let filter_level = if args.quiet {
        Level::ERROR
    } else if args.verbose >= 2 {
        Level::TRACE
    } else if args.verbose == 1 {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let builder = fmt::Subscriber::builder()
        .with_env_filter(format!("pagenote={filter_level}"))
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(StreamSelector {
            stdout_reserved: stdout_reserved(args),
        })
        .compact()
        .without_time();

    let subscriber: Box<dyn Subscriber + Send + Sync> = if args.json {
        Box::new(builder.json().flatten_event(true).finish())
    } else {
        Box::new(builder.event_format(LevelPrefixFormatter).finish())
    };

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}
