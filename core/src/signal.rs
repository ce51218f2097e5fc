//! Interrupt handling
//!
//! The signal handler runs on its own thread and only touches the two flags
//! below. The acquisition loop polls [`StopSignal::is_requested`] between
//! iterations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What the signal handler should do with an interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// A device session is running; it will stop and release the device
    StopSession,
    /// Nothing to tear down; the process may exit now
    Exit,
}

/// Shared stop flag plus whether a device session is currently armed
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    requested: Arc<AtomicBool>,
    armed: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a device session; clears any stale request
    pub fn arm(&self) {
        self.requested.store(false, Ordering::SeqCst);
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
        self.requested.store(false, Ordering::SeqCst);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    pub fn request_stop(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Called from the interrupt handler
    pub fn interrupt(&self) -> InterruptAction {
        if self.is_armed() {
            self.request_stop();
            InterruptAction::StopSession
        } else {
            InterruptAction::Exit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_outside_session_exits() {
        let signal = StopSignal::new();
        assert_eq!(signal.interrupt(), InterruptAction::Exit);
        assert!(!signal.is_requested());
    }

    #[test]
    fn test_interrupt_inside_session_requests_stop() {
        let signal = StopSignal::new();
        let handler_view = signal.clone();
        signal.arm();

        assert_eq!(handler_view.interrupt(), InterruptAction::StopSession);
        assert!(signal.is_requested());

        signal.disarm();
        assert!(!signal.is_requested());
        assert_eq!(handler_view.interrupt(), InterruptAction::Exit);
    }

    #[test]
    fn test_arm_clears_stale_request() {
        let signal = StopSignal::new();
        signal.request_stop();
        signal.arm();
        assert!(!signal.is_requested());
    }
}
