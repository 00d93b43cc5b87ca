// src/output.rs

//! Human-readable progress output.

use std::fmt;
use std::io::Write;

use tracing::debug;

/// Writes status lines to the session's output sink.
///
/// While the keyboard watcher holds the terminal in raw mode the terminal
/// no longer translates `\n` into `\r\n`, so the printer emits `\r\n`
/// itself in that case.
pub struct Printer {
    out: Box<dyn Write + Send>,
    line_ending: &'static str,
}

impl fmt::Debug for Printer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Printer")
            .field("line_ending", &self.line_ending)
            .finish_non_exhaustive()
    }
}

impl Printer {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            line_ending: "\n",
        }
    }

    pub fn set_raw_line_endings(&mut self, raw: bool) {
        self.line_ending = if raw { "\r\n" } else { "\n" };
    }

    pub fn line(&mut self, msg: impl fmt::Display) {
        let text = msg.to_string();
        let mut buf = String::with_capacity(text.len() + 2);
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                buf.push_str(self.line_ending);
            }
            buf.push_str(part);
        }
        buf.push_str(self.line_ending);
        self.write(&buf);
    }

    pub fn blank(&mut self) {
        let ending = self.line_ending;
        self.write(ending);
    }

    pub fn success(&mut self, msg: impl fmt::Display) {
        self.line(format_args!(" ✓  {msg}"));
    }

    pub fn warning(&mut self, msg: impl fmt::Display) {
        self.line(format_args!(" ⚠  {msg}"));
    }

    /// A titled section, underlined, preceded by a blank line.
    pub fn section(&mut self, title: impl fmt::Display) {
        let title = title.to_string();
        let underline = "=".repeat(title.chars().count());
        self.blank();
        self.line(&title);
        self.line(underline);
    }

    fn write(&mut self, s: &str) {
        let res = self
            .out
            .write_all(s.as_bytes())
            .and_then(|()| self.out.flush());
        if let Err(err) = res {
            debug!(error = %err, "failed to write to output");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Buf(Arc<Mutex<Vec<u8>>>);

    impl Write for Buf {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Buf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn styles_and_line_endings() {
        let buf = Buf::default();
        let mut p = Printer::new(Box::new(buf.clone()));
        p.success("Pod is Running");
        p.warning("Pod is Pending");
        p.section("Dev mode");
        assert_eq!(
            buf.text(),
            " ✓  Pod is Running\n ⚠  Pod is Pending\n\nDev mode\n========\n"
        );

        let raw = Buf::default();
        let mut p = Printer::new(Box::new(raw.clone()));
        p.set_raw_line_endings(true);
        p.line("a\nb");
        assert_eq!(raw.text(), "a\r\nb\r\n");
    }
}
