// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Seam to the cloud print service: printer advertisement, job dispatch,
// and job control updates.

use std::path::Path;

use async_trait::async_trait;

use druckbote_core::diff::PrinterDiff;
use druckbote_core::error::Result;
use druckbote_core::types::{Job, JobOptions, Printer, RemoteJobStatus};

/// Client surface of the cloud print service.
///
/// [`next_job_batch`](CloudPrintService::next_job_batch) is a long-poll:
/// it blocks until new jobs arrive or the service reports an error.
#[async_trait]
pub trait CloudPrintService: Send + Sync {
    /// List the printers the cloud currently has registered for this host.
    async fn list(&self) -> Result<Vec<Printer>>;

    /// Register a printer together with its driver descriptor.  Returns
    /// the remote id the cloud assigned.
    async fn register(&self, printer: &Printer, descriptor: &str) -> Result<String>;

    /// Push changed printer fields; `descriptor` accompanies a
    /// capabilities change.
    async fn update(&self, diff: &PrinterDiff, descriptor: Option<&str>) -> Result<()>;

    /// Remove a printer from the cloud.
    async fn delete(&self, remote_id: &str) -> Result<()>;

    /// Whether this deployment supports sharing registered printers.
    fn can_share(&self) -> bool;

    /// Share a registered printer.
    async fn share(&self, remote_id: &str) -> Result<()>;

    /// Block until the cloud dispatches a batch of pending jobs.
    async fn next_job_batch(&self) -> Result<Vec<Job>>;

    /// Fetch the options document behind a job's ticket URL.
    async fn ticket(&self, ticket_url: &str) -> Result<JobOptions>;

    /// Download a job payload into `dest`.
    async fn download(&self, file_url: &str, dest: &Path) -> Result<()>;

    /// Report a job status change to the cloud.
    async fn report_job_state(
        &self,
        remote_job_id: &str,
        status: RemoteJobStatus,
        message: &str,
    ) -> Result<()>;
}
