//! Console report lines
//!
//! Every line is prefixed with a `MM/DD/YY HH:MM:SS` timestamp and carries a
//! severity keyword (`INFO`, `WARN`, `ERROR`, ...). With color enabled the
//! whole line is colorized by the first keyword it contains.

use std::io::Write;
use std::sync::{Arc, Mutex};

use chrono::Local;
use colored::Colorize;
use serde::Serialize;
use tracing::warn;

use crate::config::LogSettings;

const TIMESTAMP_FORMAT: &str = "%m/%d/%y %H:%M:%S";

/// Color class of a report line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warn,
    Success,
    Plain,
}

impl Severity {
    /// Classify a message by keyword containment, most severe first.
    pub fn classify(message: &str) -> Self {
        if message.contains("ERROR") {
            Severity::Error
        } else if message.contains("WARN") {
            Severity::Warn
        } else if message.contains("SUCCESS") {
            Severity::Success
        } else {
            Severity::Plain
        }
    }
}

pub struct ConsoleLogger {
    settings: LogSettings,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleLogger {
    pub fn stdout(settings: LogSettings) -> Self {
        Self::with_sink(settings, std::io::stdout())
    }

    pub fn with_sink(settings: LogSettings, sink: impl Write + Send + 'static) -> Self {
        Self {
            settings,
            sink: Mutex::new(Box::new(sink)),
        }
    }

    pub fn settings(&self) -> LogSettings {
        self.settings
    }

    /// Write one timestamped line
    pub fn log(&self, message: &str) {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        let line = format!("{} {}", timestamp, message);
        let line = if self.settings.color {
            match Severity::classify(message) {
                Severity::Error => line.bright_red().to_string(),
                Severity::Warn => line.bright_yellow().to_string(),
                Severity::Success => line.bright_green().to_string(),
                Severity::Plain => line,
            }
        } else {
            line
        };
        self.write_line(&line);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(&format!("INFO {}", message.as_ref()));
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(&format!("WARN {}", message.as_ref()));
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(&format!("ERROR {}", message.as_ref()));
    }

    pub fn success(&self, message: impl AsRef<str>) {
        self.log(&format!("SUCCESS {}", message.as_ref()));
    }

    pub fn dry_run(&self, message: impl AsRef<str>) {
        self.log(&format!("DRYRUN {}", message.as_ref()));
    }

    /// Only emitted with verbose output enabled
    pub fn verbose(&self, message: impl AsRef<str>) {
        if self.settings.verbose {
            self.log(&format!("VERBOSE {}", message.as_ref()));
        }
    }

    /// Pretty-print a service response when debug output is enabled
    pub fn debug_dump<T: Serialize + ?Sized>(&self, label: &str, value: &T) {
        if !self.settings.debug {
            return;
        }
        match serde_json::to_string_pretty(value) {
            Ok(json) => self.write_line(&format!("{}:\n{}", label, json)),
            Err(e) => warn!("Failed to render {} for debug output: {}", label, e),
        }
    }

    fn write_line(&self, line: &str) {
        let mut sink = self.sink.lock().unwrap_or_else(|p| p.into_inner());
        if let Err(e) = writeln!(sink, "{}", line).and_then(|_| sink.flush()) {
            warn!("Failed to write report line: {}", e);
        }
    }
}

/// In-memory sink, handy for capturing report output
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(|p| p.into_inner());
        String::from_utf8_lossy(&buffer).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut buffer = self.buffer.lock().unwrap_or_else(|p| p.into_inner());
        buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logger(settings: LogSettings) -> (ConsoleLogger, MemorySink) {
        let sink = MemorySink::new();
        (ConsoleLogger::with_sink(settings, sink.clone()), sink)
    }

    #[test]
    fn test_classify_by_containment() {
        assert_eq!(Severity::classify("ERROR boom"), Severity::Error);
        assert_eq!(Severity::classify("WARN careful"), Severity::Warn);
        assert_eq!(Severity::classify("SUCCESS done"), Severity::Success);
        assert_eq!(Severity::classify("INFO hello"), Severity::Plain);
        // keyword anywhere in the text counts, not just at the start
        assert_eq!(Severity::classify("INFO saw an ERROR"), Severity::Error);
        assert_eq!(Severity::classify("record WARN later"), Severity::Warn);
        assert_eq!(Severity::classify("ERROR and WARN"), Severity::Error);
    }

    #[test]
    fn test_line_format() {
        let (logger, sink) = logger(LogSettings::default());
        logger.info("Deleting DNS Record");

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        // "MM/DD/YY HH:MM:SS " is 18 characters
        assert_eq!(&line[2..3], "/");
        assert_eq!(&line[5..6], "/");
        assert_eq!(&line[8..9], " ");
        assert_eq!(&line[17..], " INFO Deleting DNS Record");
    }

    #[test]
    fn test_keyword_helpers() {
        let (logger, sink) = logger(LogSettings::default());
        logger.warn("a");
        logger.error("b");
        logger.success("c");
        logger.dry_run("d");

        let lines = sink.lines();
        assert!(lines[0].ends_with(" WARN a"));
        assert!(lines[1].ends_with(" ERROR b"));
        assert!(lines[2].ends_with(" SUCCESS c"));
        assert!(lines[3].ends_with(" DRYRUN d"));
    }

    #[test]
    fn test_verbose_only_when_enabled() {
        let (quiet, quiet_sink) = logger(LogSettings::default());
        quiet.verbose("fqdn = web01.internal.example.com.");
        assert!(quiet_sink.contents().is_empty());

        let (loud, loud_sink) = logger(LogSettings {
            verbose: true,
            ..Default::default()
        });
        loud.verbose("fqdn = web01.internal.example.com.");
        assert!(loud_sink
            .contents()
            .contains("VERBOSE fqdn = web01.internal.example.com."));
    }

    #[test]
    fn test_debug_dump_only_when_enabled() {
        #[derive(Serialize)]
        struct Zone {
            id: &'static str,
        }

        let (quiet, quiet_sink) = logger(LogSettings::default());
        quiet.debug_dump("zones", &[Zone { id: "Z1" }]);
        assert!(quiet_sink.contents().is_empty());

        let (loud, loud_sink) = logger(LogSettings {
            debug: true,
            ..Default::default()
        });
        loud.debug_dump("zones", &[Zone { id: "Z1" }]);
        let out = loud_sink.contents();
        assert!(out.starts_with("zones:\n"));
        assert!(out.contains("\"id\": \"Z1\""));
    }

    #[test]
    fn test_plain_lines_are_never_colored() {
        colored::control::set_override(true);
        let (logger, sink) = logger(LogSettings {
            color: true,
            ..Default::default()
        });
        logger.info("hello");
        logger.error("boom");

        let lines = sink.lines();
        assert!(!lines[0].contains('\u{1b}'));
        assert!(lines[1].starts_with('\u{1b}'));
        assert!(lines[1].contains("ERROR boom"));
    }

    #[test]
    fn test_no_color_when_disabled() {
        let (logger, sink) = logger(LogSettings::default());
        logger.error("boom");
        assert!(!sink.contents().contains('\u{1b}'));
    }
}
