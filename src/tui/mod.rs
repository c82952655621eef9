// src/tui/mod.rs
pub mod menu;
pub mod session;

use crossterm::{
    cursor::MoveTo,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
};
use std::io::{self, BufRead, IsTerminal, Write};

/// Line-oriented terminal the session talks to. `None` from a prompt means
/// input is exhausted (EOF or the user cancelled).
pub trait Terminal {
    fn print(&mut self, line: &str) -> anyhow::Result<()>;
    fn prompt(&mut self, label: &str) -> anyhow::Result<Option<String>>;
    fn prompt_secret(&mut self, label: &str) -> anyhow::Result<Option<String>>;
    fn pause(&mut self) -> anyhow::Result<()>;
    fn clear(&mut self) -> anyhow::Result<()>;
}

/// Real stdin/stdout. Raw-mode features (key press, hidden input, clearing)
/// are only used when stdin is a TTY; piped input degrades to plain lines.
pub struct Console {
    interactive: bool,
}

impl Console {
    pub fn new() -> Self {
        Self {
            interactive: io::stdin().is_terminal(),
        }
    }

    fn read_line(&mut self) -> anyhow::Result<Option<String>> {
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

impl Terminal for Console {
    fn print(&mut self, line: &str) -> anyhow::Result<()> {
        let mut stdout = io::stdout();
        writeln!(stdout, "{}", line)?;
        stdout.flush()?;
        Ok(())
    }

    fn prompt(&mut self, label: &str) -> anyhow::Result<Option<String>> {
        self.print(label)?;
        self.read_line()
    }

    fn prompt_secret(&mut self, label: &str) -> anyhow::Result<Option<String>> {
        if !self.interactive {
            return self.prompt(label);
        }
        self.print(label)?;

        let mut secret = String::new();
        let cancelled = {
            let _raw = RawModeGuard::enable()?;
            loop {
                let Event::Key(key) = event::read()? else {
                    continue;
                };
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Enter => break false,
                    KeyCode::Esc => break true,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        break true
                    }
                    KeyCode::Backspace => {
                        secret.pop();
                    }
                    KeyCode::Char(c) => secret.push(c),
                    _ => {}
                }
            }
        };
        // raw mode swallowed the newline
        self.print("")?;

        Ok(if cancelled { None } else { Some(secret) })
    }

    fn pause(&mut self) -> anyhow::Result<()> {
        self.print("Press any key to continue...")?;
        if !self.interactive {
            self.read_line()?;
            return Ok(());
        }

        let _raw = RawModeGuard::enable()?;
        loop {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(());
                }
            }
        }
    }

    fn clear(&mut self) -> anyhow::Result<()> {
        if self.interactive {
            execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0))?;
        }
        Ok(())
    }
}
