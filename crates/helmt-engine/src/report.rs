//! User-facing progress lines

use console::style;
use std::fmt::Display;

use crate::sink::Sink;

/// Writes one progress line per pipeline step
#[derive(Debug, Clone)]
pub struct Reporter {
    sink: Sink,
    color: bool,
}

impl Reporter {
    pub fn new(sink: Sink, color: bool) -> Self {
        Self { sink, color }
    }

    /// Report to stdout, styled when the terminal supports colours
    pub fn stdout() -> Self {
        Self::new(Sink::Stdout, console::colors_enabled())
    }

    /// Emit a progress line
    pub fn step(&self, message: impl Display) {
        let line = if self.color {
            style(message).magenta().force_styling(true).to_string()
        } else {
            message.to_string()
        };

        if let Err(e) = self.sink.write_all(format!("{}\n", line).as_bytes()) {
            tracing::warn!("failed to write progress output: {}", e);
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::stdout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::Capture;

    #[test]
    fn test_plain_step() {
        let capture = Capture::new();
        let reporter = Reporter::new(capture.sink(), false);

        reporter.step("downloaded /tmp/helmt1/nginx-1.2.3.tgz");

        assert_eq!(capture.contents(), "downloaded /tmp/helmt1/nginx-1.2.3.tgz\n");
    }

    #[test]
    fn test_colored_step_keeps_text() {
        let capture = Capture::new();
        let reporter = Reporter::new(capture.sink(), true);

        reporter.step("helm version");

        let out = capture.contents();
        assert!(out.contains("helm version"));
        assert!(out.contains('\u{1b}'));
    }
}
