//! # Update Policy
//!
//! Decides, for every accepted notification, whether the resize callback
//! fires and whether the reading is committed.
//!
//! ```text
//! callback: breakpoints configured → only when the label changed
//!           otherwise              → always
//! commit:   should_update given    → predicate decides
//!           update_on_breakpoint_change + breakpoints
//!                                  → only when the label changed
//!           otherwise              → always
//! ```

use std::fmt;
use std::rc::Rc;

use crate::state::Reading;

/// Predicate over the candidate reading; `false` skips the commit.
pub type ShouldUpdate = Rc<dyn Fn(&Reading) -> bool>;

/// Per-notification decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decision {
    /// Invoke the resize callback.
    pub notify: bool,
    /// Commit the candidate reading.
    pub commit: bool,
}

/// Gate state for callbacks and commits.
#[derive(Clone, Default)]
pub struct UpdatePolicy {
    classifying: bool,
    update_on_breakpoint_change: bool,
    should_update: Option<ShouldUpdate>,
    last_notified: Option<String>,
}

impl fmt::Debug for UpdatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdatePolicy")
            .field("classifying", &self.classifying)
            .field("update_on_breakpoint_change", &self.update_on_breakpoint_change)
            .field("should_update", &self.should_update.is_some())
            .field("last_notified", &self.last_notified)
            .finish()
    }
}

impl UpdatePolicy {
    /// Create a policy.
    ///
    /// `classifying` is whether a breakpoint table is configured.
    #[must_use]
    pub fn new(
        classifying: bool,
        update_on_breakpoint_change: bool,
        should_update: Option<ShouldUpdate>,
    ) -> Self {
        Self {
            classifying,
            update_on_breakpoint_change,
            should_update,
            last_notified: None,
        }
    }

    /// Callback gate. Records `label` as notified when it fires.
    pub fn should_notify(&mut self, label: &str) -> bool {
        if !self.classifying {
            return true;
        }
        if self.last_notified.as_deref() == Some(label) {
            return false;
        }
        self.last_notified = Some(label.to_owned());
        true
    }

    /// Replace the commit predicate.
    pub fn set_should_update(&mut self, should_update: Option<ShouldUpdate>) {
        self.should_update = should_update;
    }

    /// Commit gate, comparing `candidate` against the latest approved reading.
    #[must_use]
    pub fn should_commit(&self, candidate: &Reading, latest: &Reading) -> bool {
        if let Some(predicate) = &self.should_update {
            return predicate(candidate);
        }
        if self.classifying && self.update_on_breakpoint_change {
            return candidate.label != latest.label;
        }
        true
    }

    /// Run both gates.
    pub fn decide(&mut self, candidate: &Reading, latest: &Reading) -> Decision {
        Decision {
            notify: self.should_notify(&candidate.label),
            commit: self.should_commit(candidate, latest),
        }
    }

    /// Label last passed through the callback gate.
    #[must_use]
    pub fn last_notified(&self) -> Option<&str> {
        self.last_notified.as_deref()
    }

    /// Forget the last notified label.
    pub fn reset(&mut self) {
        self.last_notified = None;
    }
}
