//! Per-column progress notifications.

use std::io::Write;

/// Receives `(current, total)` notifications while definition lines are built.
///
/// Notifications are fire-and-forget: implementations must not fail and
/// should return quickly.
pub trait Progress {
    fn step(&mut self, current: usize, total: usize);
}

impl<F: FnMut(usize, usize)> Progress for F {
    fn step(&mut self, current: usize, total: usize) {
        self(current, total);
    }
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn step(&mut self, _current: usize, _total: usize) {}
}

/// Writes `PROGRESS <current>/<total>` lines to a writer.
///
/// Write errors (a closed pipe, a full disk) are dropped so a vanished
/// consumer never interrupts generation.
#[derive(Debug)]
pub struct WriteProgress<W> {
    writer: W,
}

impl<W: Write> WriteProgress<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Progress for WriteProgress<W> {
    fn step(&mut self, current: usize, total: usize) {
        let _ = writeln!(self.writer, "PROGRESS {current}/{total}").and_then(|()| self.writer.flush());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::generate;
    use crate::stats::ColumnWidths;
    use std::io;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn test_write_progress_format() {
        let mut progress = WriteProgress::new(Vec::new());
        progress.step(1, 2);
        progress.step(2, 2);
        assert_eq!(progress.into_inner(), b"PROGRESS 1/2\nPROGRESS 2/2\n");
    }

    #[test]
    fn test_closed_consumer_does_not_stop_generation() {
        let headers = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut progress = WriteProgress::new(ClosedPipe);

        let lines = generate(&headers, &ColumnWidths::from(vec![1, 2, 3]), &mut progress);

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].width, 3);
    }
}
