// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Druckbote cloud print bridge.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A printer known to the bridge.
///
/// The local print subsystem and the cloud service each have their own
/// identifier for the same physical queue; a `Printer` carries both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Printer {
    /// Queue name on the local print subsystem (unique per host).
    pub name: String,
    /// Identifier assigned by the cloud service on registration.
    /// Empty until the printer has been registered.
    pub remote_id: String,
    /// Hash over the driver descriptor.  A change means the driver or its
    /// options changed and the descriptor must be uploaded again.
    pub caps_hash: String,
    /// Human-readable description shown to cloud users.
    pub description: String,
}

/// A print job dispatched by the cloud service.
///
/// Immutable once produced by the intake loop; the execution pipeline owns
/// it until a terminal status has been reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// The cloud service's job identifier.
    pub remote_job_id: String,
    /// The cloud identifier of the printer this job targets.
    pub remote_printer_id: String,
    /// URL of the job ticket (options document).
    pub ticket_url: String,
    /// URL of the payload to download and print.
    pub file_url: String,
    /// Identifier of the submitting user; may be an email-like form.
    pub owner_id: String,
}

/// Job status in the cloud service's domain.
///
/// Only `Done` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteJobStatus {
    InProgress,
    Done,
    Error,
}

impl RemoteJobStatus {
    /// Whether this status ends a job's lifecycle.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

impl std::fmt::Display for RemoteJobStatus {
    /// Wire keyword as the cloud service expects it.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keyword = match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
            Self::Error => "ERROR",
        };
        write!(f, "{keyword}")
    }
}

/// Job state as reported by the local print subsystem (the IPP job-state
/// keywords, RFC 8011 §5.3.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalJobState {
    Pending,
    Held,
    Processing,
    Stopped,
    Canceled,
    Aborted,
    Completed,
}

impl LocalJobState {
    /// Project the local state onto the cloud status domain.
    pub fn remote_status(&self) -> RemoteJobStatus {
        match self {
            Self::Pending | Self::Held | Self::Processing => RemoteJobStatus::InProgress,
            Self::Completed => RemoteJobStatus::Done,
            Self::Stopped | Self::Canceled | Self::Aborted => RemoteJobStatus::Error,
        }
    }
}

/// Options document fetched from a job's ticket URL (media, duplex, copies
/// and the like), passed through to the local print subsystem verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOptions(pub HashMap<String, String>);

/// Aggregate job counters exposed by the manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobStats {
    /// Jobs that have reached a terminal status since the bridge started.
    pub processed: u64,
    /// Jobs currently holding a printer queue slot.
    pub processing: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_maps_active_states_to_in_progress() {
        for state in [
            LocalJobState::Pending,
            LocalJobState::Held,
            LocalJobState::Processing,
        ] {
            assert_eq!(state.remote_status(), RemoteJobStatus::InProgress);
        }
    }

    #[test]
    fn projection_maps_terminal_states() {
        assert_eq!(
            LocalJobState::Completed.remote_status(),
            RemoteJobStatus::Done
        );
        for state in [
            LocalJobState::Stopped,
            LocalJobState::Canceled,
            LocalJobState::Aborted,
        ] {
            assert_eq!(state.remote_status(), RemoteJobStatus::Error);
        }
    }

    #[test]
    fn only_done_and_error_are_terminal() {
        assert!(!RemoteJobStatus::InProgress.is_terminal());
        assert!(RemoteJobStatus::Done.is_terminal());
        assert!(RemoteJobStatus::Error.is_terminal());
    }

    #[test]
    fn status_wire_keywords() {
        assert_eq!(RemoteJobStatus::InProgress.to_string(), "IN_PROGRESS");
        assert_eq!(RemoteJobStatus::Done.to_string(), "DONE");
        assert_eq!(RemoteJobStatus::Error.to_string(), "ERROR");
    }
}
