//! No-echo input for secrets typed at a terminal.

use std::io::{self, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

#[derive(Debug, PartialEq, Eq)]
enum KeyStep {
    Continue,
    Done,
    Abort,
}

fn apply_key(buf: &mut String, key: KeyEvent) -> KeyStep {
    if key.kind != KeyEventKind::Press {
        return KeyStep::Continue;
    }
    match key.code {
        KeyCode::Enter => KeyStep::Done,
        KeyCode::Char('c') | KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            KeyStep::Abort
        }
        KeyCode::Esc => KeyStep::Abort,
        KeyCode::Backspace => {
            buf.pop();
            KeyStep::Continue
        }
        KeyCode::Char(c) => {
            buf.push(c);
            KeyStep::Continue
        }
        _ => KeyStep::Continue,
    }
}

/// Restores cooked mode when dropped, including on error paths.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Read one line from the terminal without echoing it.
///
/// Returns `None` when the user aborts with Ctrl-C, Ctrl-D or Esc.
pub fn read_secret(out: &mut impl Write, prompt: &str) -> io::Result<Option<String>> {
    write!(out, "{}", prompt)?;
    out.flush()?;

    let mut buf = String::new();
    let step = {
        let _raw = RawMode::enable()?;
        loop {
            match event::read()? {
                Event::Key(key) => match apply_key(&mut buf, key) {
                    KeyStep::Continue => {}
                    step => break step,
                },
                Event::Paste(text) => buf.push_str(text.trim_end_matches(['\r', '\n'])),
                _ => {}
            }
        }
    };
    writeln!(out)?;

    Ok((step == KeyStep::Done).then_some(buf))
}
