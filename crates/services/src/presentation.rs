use tracing::{debug, warn};

use crate::error::PresentationError;

/// Host adapter for the distraction-free exam view (fullscreen, alternate
/// screen, kiosk window, ...).
pub trait PresentationModeController: Send {
    /// # Errors
    ///
    /// Returns `PresentationError` when the host refuses or cannot comply.
    fn enter(&mut self) -> Result<(), PresentationError>;

    /// # Errors
    ///
    /// Returns `PresentationError` when the host cannot restore the normal view.
    fn exit(&mut self) -> Result<(), PresentationError>;
}

/// Controller for hosts without a presentation mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPresentation;

impl PresentationModeController for NoopPresentation {
    fn enter(&mut self) -> Result<(), PresentationError> {
        Ok(())
    }

    fn exit(&mut self) -> Result<(), PresentationError> {
        Ok(())
    }
}

/// Best-effort wrapper: failures are logged and reported as `false`.
pub(crate) struct PresentationMode {
    controller: Box<dyn PresentationModeController>,
    active: bool,
}

impl PresentationMode {
    pub(crate) fn new(controller: Box<dyn PresentationModeController>) -> Self {
        Self {
            controller,
            active: false,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn enter(&mut self) -> bool {
        if self.active {
            return true;
        }
        match self.controller.enter() {
            Ok(()) => {
                debug!("entered presentation mode");
                self.active = true;
            }
            Err(err) => warn!(error = %err, "could not enter presentation mode"),
        }
        self.active
    }

    /// Leaves presentation mode if it was entered.
    pub(crate) fn exit(&mut self) -> bool {
        if !self.active {
            return true;
        }
        self.active = false;
        match self.controller.exit() {
            Ok(()) => {
                debug!("left presentation mode");
                true
            }
            Err(err) => {
                warn!(error = %err, "could not leave presentation mode");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Refusing;

    impl PresentationModeController for Refusing {
        fn enter(&mut self) -> Result<(), PresentationError> {
            Err(PresentationError::Denied("not triggered by a user gesture".into()))
        }

        fn exit(&mut self) -> Result<(), PresentationError> {
            Err(PresentationError::Unsupported)
        }
    }

    #[test]
    fn refused_enter_is_not_fatal() {
        let mut mode = PresentationMode::new(Box::new(Refusing));
        assert!(!mode.enter());
        assert!(!mode.is_active());
        // Nothing was entered, so there is nothing to leave.
        assert!(mode.exit());
    }

    #[test]
    fn noop_enters_and_exits_once() {
        let mut mode = PresentationMode::new(Box::new(NoopPresentation));
        assert!(mode.enter());
        assert!(mode.is_active());
        assert!(mode.exit());
        assert!(!mode.is_active());
    }
}
