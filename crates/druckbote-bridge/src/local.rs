// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Seam to the local print subsystem — the daemon that owns the physical
// and virtual printers on this host.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use druckbote_core::error::Result;
use druckbote_core::types::{JobOptions, LocalJobState, Printer};

/// Client surface of the local print subsystem.
#[async_trait]
pub trait LocalPrintSystem: Send + Sync {
    /// Enumerate the printers currently configured locally.
    async fn printers(&self) -> Result<Vec<Printer>>;

    /// Fetch the driver descriptor (PPD) for a printer by queue name.
    async fn driver_descriptor(&self, printer_name: &str) -> Result<String>;

    /// Allocate a fresh spool file.  The subsystem owns path allocation so
    /// the location is one it will later accept for submission.
    async fn create_spool_file(&self) -> Result<SpoolFile>;

    /// Submit a job for printing.  Returns the subsystem's job id.
    async fn print(
        &self,
        printer_name: &str,
        path: &Path,
        title: &str,
        owner: &str,
        options: &JobOptions,
    ) -> Result<u32>;

    /// Query the state of a previously submitted job.
    async fn job_state(&self, local_job_id: u32) -> Result<(LocalJobState, String)>;
}

/// Owned spool file path.
///
/// Removes the file when dropped, so every exit path of a job pipeline
/// cleans up its payload.
#[derive(Debug)]
pub struct SpoolFile {
    path: PathBuf,
}

impl SpoolFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SpoolFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!(path = %self.path.display(), error = %e, "failed to remove spool file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spool_file_removed_on_drop() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("payload.pdf");
        std::fs::write(&path, b"%PDF-1.4").expect("write");

        let spool = SpoolFile::new(path.clone());
        assert!(path.exists());
        drop(spool);
        assert!(!path.exists());
    }

    #[test]
    fn dropping_a_missing_spool_file_is_harmless() {
        let dir = tempfile::tempdir().expect("temp dir");
        let spool = SpoolFile::new(dir.path().join("never-created.pdf"));
        drop(spool);
    }
}
