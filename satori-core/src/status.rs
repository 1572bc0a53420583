//! Tri-state synchronisation status of an editable entity.
//!
//! Transitions:
//! - `Synced → Modified` on a local edit
//! - `Synced | Modified → Outdated` when the remote copy diverges or vanishes
//! - `* → Synced` only through [`DataStatus::mark_up_to_date`]
//!
//! A local edit never clears `Outdated`. Callers notify observers themselves.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Synced,
    Modified,
    Outdated,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Synced => write!(f, "synced"),
            Status::Modified => write!(f, "modified"),
            Status::Outdated => write!(f, "outdated"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataStatus {
    status: Status,
}

impl DataStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn mark_modified(&mut self) {
        if self.status != Status::Outdated {
            self.status = Status::Modified;
        }
    }

    pub fn mark_outdated(&mut self) {
        self.status = Status::Outdated;
    }

    pub fn mark_up_to_date(&mut self) {
        self.status = Status::Synced;
    }

    /// True whenever the working copy is not known to match the remote one.
    pub fn is_modified(&self) -> bool {
        self.status != Status::Synced
    }

    pub fn is_outdated(&self) -> bool {
        self.status == Status::Outdated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn in_state(status: Status) -> DataStatus {
        let mut s = DataStatus::new();
        match status {
            Status::Synced => {}
            Status::Modified => s.mark_modified(),
            Status::Outdated => s.mark_outdated(),
        }
        s
    }

    #[rstest]
    #[case(Status::Synced, Status::Modified)]
    #[case(Status::Modified, Status::Modified)]
    #[case(Status::Outdated, Status::Outdated)]
    fn mark_modified_transitions(#[case] from: Status, #[case] to: Status) {
        let mut s = in_state(from);
        s.mark_modified();
        assert_eq!(s.status(), to);
    }

    #[rstest]
    #[case(Status::Synced)]
    #[case(Status::Modified)]
    #[case(Status::Outdated)]
    fn mark_outdated_from_any_state(#[case] from: Status) {
        let mut s = in_state(from);
        s.mark_outdated();
        assert!(s.is_outdated());
        assert!(s.is_modified());
    }

    #[rstest]
    #[case(Status::Synced)]
    #[case(Status::Modified)]
    #[case(Status::Outdated)]
    fn mark_up_to_date_from_any_state(#[case] from: Status) {
        let mut s = in_state(from);
        s.mark_up_to_date();
        assert_eq!(s.status(), Status::Synced);
        assert!(!s.is_modified());
        assert!(!s.is_outdated());
    }

    #[test]
    fn fresh_status_is_synced() {
        let s = DataStatus::new();
        assert_eq!(s.status(), Status::Synced);
        assert_eq!(s.status().to_string(), "synced");
    }
}
