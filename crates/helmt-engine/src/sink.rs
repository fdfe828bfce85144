//! Output destinations for subprocess output and progress lines

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// A cloneable handle to somewhere output can be written
#[derive(Clone)]
pub enum Sink {
    /// The process stdout (inherited by subprocesses)
    Stdout,
    /// The process stderr
    Stderr,
    /// Any shared writer
    Writer(Arc<Mutex<dyn Write + Send>>),
}

impl Sink {
    /// Wrap a writer into a shareable sink
    pub fn writer<W: Write + Send + 'static>(writer: W) -> Self {
        Sink::Writer(Arc::new(Mutex::new(writer)))
    }

    /// Whether subprocesses can write here directly
    pub fn is_stdout(&self) -> bool {
        matches!(self, Sink::Stdout)
    }

    /// Write the whole buffer and flush
    pub fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        match self {
            Sink::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(buf)?;
                out.flush()
            }
            Sink::Stderr => io::stderr().lock().write_all(buf),
            Sink::Writer(writer) => {
                let mut writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
                writer.write_all(buf)?;
                writer.flush()
            }
        }
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::Stdout => f.write_str("Sink::Stdout"),
            Sink::Stderr => f.write_str("Sink::Stderr"),
            Sink::Writer(_) => f.write_str("Sink::Writer(..)"),
        }
    }
}

/// In-memory sink, useful to capture output in tests
#[derive(Debug, Clone, Default)]
pub struct Capture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink writing into this capture
    pub fn sink(&self) -> Sink {
        Sink::writer(CaptureWriter {
            buffer: Arc::clone(&self.buffer),
        })
    }

    /// Everything written so far (lossy UTF-8)
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(String::from).collect()
    }
}

struct CaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_collects_writes_from_clones() {
        let capture = Capture::new();
        let sink = capture.sink();
        let other = sink.clone();

        sink.write_all(b"first\n").unwrap();
        other.write_all(b"second\n").unwrap();

        assert_eq!(capture.lines(), vec!["first", "second"]);
    }

    #[test]
    fn test_only_stdout_is_inheritable() {
        assert!(Sink::Stdout.is_stdout());
        assert!(!Sink::Stderr.is_stdout());
        assert!(!Capture::new().sink().is_stdout());
    }
}
