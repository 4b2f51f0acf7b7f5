use chrono::Local;
use nu_ansi_term::{Color, Style};
use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::Targets,
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields},
    prelude::*,
    registry::LookupSpan,
    EnvFilter, Layer,
};

/// Target used for every line an operator is expected to read.
pub const RESULT_TARGET: &str = "task_result";

/// Install the file + console subscriber.
///
/// Result lines (`task_result` target) always reach both sinks. Other events
/// go to the file at WARN and to the console at ERROR, or per `RUST_LOG`
/// when `verbose` is set. The guard must be kept alive by the caller.
pub fn setup_logger(verbose: bool) -> Option<WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all("logs") {
        eprintln!("Could not create logs directory: {}", e);
        return None;
    }

    // hourly rotation keeps individual files small
    let file_appender = tracing_appender::rolling::hourly("logs", "app");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_filter = Targets::new()
        .with_target(RESULT_TARGET, Level::INFO)
        .with_default(Level::WARN);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .event_format(FileFormatter)
        .with_filter(file_filter);

    let console_filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("info,{}=info", RESULT_TARGET)))
    } else {
        EnvFilter::new(format!("error,{}=info", RESULT_TARGET))
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .event_format(TerminalFormatter)
        .with_filter(console_filter);

    let installed = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init();

    if let Err(e) = installed {
        eprintln!("Logger already initialised: {}", e);
        return None;
    }

    Some(guard)
}

// --- Formatters ---

struct MessageVisitor {
    message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

fn colorize(msg: String) -> String {
    if msg.contains("SUCCESS") {
        let green_text = Style::new().fg(Color::LightGreen).bold();
        msg.replace("SUCCESS", &format!("{}", green_text.paint("SUCCESS")))
    } else if msg.contains("FAILED") || msg.contains("REVERTED") {
        let red_text = Style::new().fg(Color::LightRed).bold();
        msg.replace("FAILED", &format!("{}", red_text.paint("FAILED")))
            .replace("REVERTED", &format!("{}", red_text.paint("REVERTED")))
    } else {
        msg
    }
}

pub struct TerminalFormatter;

impl<S, N> FormatEvent<S, N> for TerminalFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut msg_visitor = MessageVisitor {
            message: String::new(),
        };
        event.record(&mut msg_visitor);

        if event.metadata().target() != RESULT_TARGET {
            let level = *event.metadata().level();
            let style = match level {
                Level::ERROR => Style::new().fg(Color::Red),
                Level::WARN => Style::new().fg(Color::Yellow),
                _ => Style::new().dimmed(),
            };
            write!(writer, "{} ", style.paint(format!("[{}]", level)))?;
        }

        write!(writer, "{}", colorize(msg_visitor.message))?;
        writeln!(writer)
    }
}

pub struct FileFormatter;

impl<S, N> FormatEvent<S, N> for FileFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let level = event.metadata().level();

        write!(writer, "{} [{}] ", timestamp, level)?;

        let mut msg_visitor = MessageVisitor {
            message: String::new(),
        };
        event.record(&mut msg_visitor);
        writeln!(writer, "{}", msg_visitor.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorize_marks_outcomes() {
        let ok = colorize("SUCCESS monad 0x1234...abcd".to_string());
        assert!(ok.contains("\u{1b}["));
        let plain = colorize("Waiting 1.2s before next wallet".to_string());
        assert_eq!(plain, "Waiting 1.2s before next wallet");
    }
}
