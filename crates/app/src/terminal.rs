use std::io::{IsTerminal, Write, stdout};

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use services::{PresentationError, PresentationModeController};

/// Presentation mode for a terminal: the exam runs on the alternate screen
/// and the shell scrollback comes back when it ends.
#[derive(Debug, Default)]
pub struct AlternateScreen;

impl PresentationModeController for AlternateScreen {
    fn enter(&mut self) -> Result<(), PresentationError> {
        let mut out = stdout();
        if !out.is_terminal() {
            return Err(PresentationError::Unsupported);
        }
        execute!(out, EnterAlternateScreen)?;
        Ok(())
    }

    fn exit(&mut self) -> Result<(), PresentationError> {
        let mut out = stdout();
        execute!(out, LeaveAlternateScreen)?;
        out.flush()?;
        Ok(())
    }
}
