use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::widgets::Paragraph;
use ratatui::DefaultTerminal;
use std::io;
use std::time::Duration;

/// Full-screen status panel. The terminal is put back into normal mode when
/// this is dropped, including on early returns and panics.
pub struct Screen {
    terminal: DefaultTerminal,
    contents: String,
}

impl Screen {
    pub fn open() -> io::Result<Screen> {
        let terminal = ratatui::try_init()?;
        Ok(Screen {
            terminal: terminal,
            contents: String::new(),
        })
    }

    pub fn show(&mut self, text: &str) -> io::Result<()> {
        self.contents = text.to_string();
        self.terminal.clear()?;
        self.terminal.draw(|frame| {
            let area = frame.area();
            frame.render_widget(Paragraph::new(text), area);
        })?;
        Ok(())
    }

    /// What was last drawn.
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Drains pending input without blocking; true if a quit key was pressed.
    pub fn quit_requested(&mut self) -> io::Result<bool> {
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if is_quit_key(&key) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        ratatui::restore();
    }
}

fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => true,
        // Raw mode swallows SIGINT, so Ctrl-C arrives as a key press.
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}
