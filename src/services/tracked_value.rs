use crate::models::ocr_result::ValueChange;
use parking_lot::Mutex;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct TrackedState {
    current: Option<u32>,
    manual_override: Option<u32>,
}

/// Last accepted SR value plus the manual override.
///
/// Both the recognition worker and configuration updates go through the
/// same lock, so neither can overwrite the other's change unseen.
#[derive(Debug, Default)]
pub struct TrackedValue {
    state: Mutex<TrackedState>,
}

impl TrackedValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<u32> {
        self.state.lock().current
    }

    pub fn manual_override(&self) -> Option<u32> {
        self.state.lock().manual_override
    }

    /// Whether recognition is currently suppressed by an override
    pub fn is_overridden(&self) -> bool {
        self.state.lock().manual_override.is_some()
    }

    /// Record a recognized value.
    ///
    /// Returns the change when the value differs from the current one.
    /// Ignored while a manual override is active.
    pub fn accept_recognized(&self, value: u32) -> Option<ValueChange> {
        self.accept_recognized_then(value, |_| {})
    }

    /// Like [`accept_recognized`](Self::accept_recognized), running
    /// `on_change` before the lock is released. Effects of competing
    /// transitions therefore land in the same order as the transitions.
    /// `on_change` must not call back into this value.
    pub fn accept_recognized_then(
        &self,
        value: u32,
        on_change: impl FnOnce(ValueChange),
    ) -> Option<ValueChange> {
        let mut state = self.state.lock();
        if state.manual_override.is_some() || state.current == Some(value) {
            return None;
        }

        let previous = state.current.replace(value);
        let change = ValueChange {
            previous,
            current: value,
        };
        on_change(change);
        Some(change)
    }

    /// Apply the configured override (`0` clears it).
    ///
    /// Returns a change when a new positive override is set; the override
    /// becomes the current value even if it equals it. Clearing keeps the
    /// current value so recognition resumes from it.
    pub fn set_manual_override(&self, value: u32) -> Option<ValueChange> {
        self.set_manual_override_then(value, |_| {})
    }

    /// Like [`set_manual_override`](Self::set_manual_override), running
    /// `on_change` under the lock
    pub fn set_manual_override_then(
        &self,
        value: u32,
        on_change: impl FnOnce(ValueChange),
    ) -> Option<ValueChange> {
        let mut state = self.state.lock();

        if value == 0 {
            state.manual_override = None;
            return None;
        }

        if state.manual_override == Some(value) {
            return None;
        }

        state.manual_override = Some(value);
        let previous = state.current.replace(value);
        let change = ValueChange {
            previous,
            current: value,
        };
        on_change(change);
        Some(change)
    }

    /// Run `f` with the current value while holding the lock
    pub fn with_current<R>(&self, f: impl FnOnce(Option<u32>) -> R) -> R {
        f(self.state.lock().current)
    }
}
