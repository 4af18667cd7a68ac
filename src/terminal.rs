use crossterm::{
    cursor::{Hide, Show},
    event::{poll, read, Event},
    execute,
    style::{Attribute, ResetColor, SetAttribute},
    terminal::{
        disable_raw_mode, enable_raw_mode, size, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::Duration;

/// Raw-mode, alternate-screen terminal session. Restores the terminal on drop.
pub struct Terminal {
    active: bool,
}

impl Terminal {
    /// Initialize the terminal for drawing
    pub fn new() -> io::Result<Self> {
        let mut term = Self { active: false };
        term.enter()?;
        Ok(term)
    }

    pub fn is_tty() -> bool {
        io::stdin().is_terminal() && io::stdout().is_terminal()
    }

    fn enter(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, Hide)?;
        self.active = true;
        Ok(())
    }

    fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        let mut out = io::stdout();
        execute!(out, SetAttribute(Attribute::Reset), ResetColor, Clear(ClearType::All))?;
        execute!(out, Show, LeaveAlternateScreen)?;
        disable_raw_mode()
    }

    /// Get terminal dimensions
    pub fn size(&self) -> io::Result<(usize, usize)> {
        let (cols, rows) = size()?;
        Ok((cols as usize, rows as usize))
    }

    /// Wait up to `timeout` for an input event.
    pub fn poll_event(&self, timeout: Duration) -> io::Result<Option<Event>> {
        if poll(timeout)? {
            return read().map(Some);
        }
        Ok(None)
    }

    /// Restore the terminal before the process stops.
    pub fn suspend(&mut self) -> io::Result<()> {
        self.leave()
    }

    /// Take the terminal back after a stop.
    pub fn resume(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }
        self.enter()
    }

    /// Write a whole frame to stdout.
    pub fn write_frame(&self, frame: &[u8]) -> io::Result<()> {
        if frame.is_empty() {
            return Ok(());
        }
        let mut out = io::stdout().lock();
        write_all_retry(&mut out, frame)?;
        flush_retry(&mut out)
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

fn retryable(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock)
}

/// `write_all` that keeps going through interrupts and full pipes.
pub fn write_all_retry(out: &mut impl Write, mut buf: &[u8]) -> io::Result<()> {
    while !buf.is_empty() {
        match out.write(buf) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => buf = &buf[n..],
            Err(e) if retryable(&e) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn flush_retry(out: &mut impl Write) -> io::Result<()> {
    loop {
        match out.flush() {
            Err(e) if retryable(&e) => continue,
            r => return r,
        }
    }
}

/// File that receives each frame as plain text, replacing the previous one.
pub struct RawSink {
    file: File,
    frame: Vec<u8>,
}

impl RawSink {
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().write(true).create(true).truncate(true).open(path)?;
        Ok(Self { file, frame: Vec::new() })
    }

    /// Buffer to render the next frame into.
    pub fn frame(&mut self) -> &mut Vec<u8> {
        self.frame.clear();
        &mut self.frame
    }

    pub fn commit(&mut self) -> io::Result<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        write_all_retry(&mut self.file, &self.frame)?;
        flush_retry(&mut self.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writes at most `chunk` bytes per call, failing every other call.
    struct Flaky {
        data: Vec<u8>,
        chunk: usize,
        calls: usize,
        error: io::ErrorKind,
    }

    impl Write for Flaky {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls += 1;
            if self.calls % 2 == 1 {
                return Err(self.error.into());
            }
            let n = buf.len().min(self.chunk);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn retries_through_interrupts_and_short_writes() {
        for error in [io::ErrorKind::Interrupted, io::ErrorKind::WouldBlock] {
            let mut w = Flaky { data: Vec::new(), chunk: 3, calls: 0, error };
            write_all_retry(&mut w, b"0123456789").unwrap();
            assert_eq!(w.data, b"0123456789");
        }
    }

    #[test]
    fn other_errors_are_returned() {
        let mut w = Flaky { data: Vec::new(), chunk: 3, calls: 0, error: io::ErrorKind::BrokenPipe };
        let err = write_all_retry(&mut w, b"abc").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn zero_length_write_fails() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let err = write_all_retry(&mut Full, b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
    }

    #[test]
    fn raw_sink_keeps_only_the_latest_frame() {
        let path = std::env::temp_dir().join(format!("termscope-raw-{}.txt", std::process::id()));
        let mut sink = RawSink::create(&path).unwrap();
        sink.frame().extend_from_slice(b"first frame\nlonger line\n");
        sink.commit().unwrap();
        sink.frame().extend_from_slice(b"second\n");
        sink.commit().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\n");
        let _ = std::fs::remove_file(&path);
    }
}
