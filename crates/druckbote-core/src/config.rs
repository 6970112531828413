// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use serde::{Deserialize, Serialize};

/// Resource budgets and behavior flags for the bridge.
///
/// Fixed at manager construction; changing them requires a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Seconds between printer reconciliation passes.
    pub printer_poll_interval_secs: u64,
    /// Seconds between local status queries while a job is in flight.
    pub job_poll_interval_secs: u64,
    /// Global cap on concurrent payload downloads.
    pub max_concurrent_downloads: usize,
    /// Queue slots per printer (identical for every printer).
    pub printer_queue_capacity: usize,
    /// Strip the domain part of the submitting user (everything from the
    /// first `@`) before handing a job to the local print subsystem.
    pub truncate_job_owner: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            printer_poll_interval_secs: 60,
            job_poll_interval_secs: 5,
            max_concurrent_downloads: 5,
            printer_queue_capacity: 3,
            truncate_job_owner: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.printer_poll_interval_secs, 60);
        assert_eq!(config.job_poll_interval_secs, 5);
        assert_eq!(config.max_concurrent_downloads, 5);
        assert_eq!(config.printer_queue_capacity, 3);
        assert!(config.truncate_job_owner);
    }

    #[test]
    fn round_trips_through_json() {
        let config = BridgeConfig::default();
        let json = serde_json::to_string(&config).expect("serialize");
        let parsed: BridgeConfig = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed.max_concurrent_downloads, config.max_concurrent_downloads);
        assert_eq!(parsed.truncate_job_owner, config.truncate_job_owner);
    }
}
