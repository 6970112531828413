// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The printer manager — the concurrent coordinator at the heart of the
// bridge.  It owns three long-running activities:
//
//   1. a periodic reconciler that keeps the cloud's printer set equal to
//      the local subsystem's,
//   2. a job intake loop that long-polls the cloud for pending jobs,
//   3. one execution pipeline per job:
//      ticket -> download -> submit -> poll -> terminal report.
//
// Two resource budgets apply: a global cap on concurrent payload downloads
// and a per-printer queue budget held from submission until the job
// reaches a terminal status.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use druckbote_core::config::BridgeConfig;
use druckbote_core::diff::{PrinterDiff, PrinterOp, diff_printers};
use druckbote_core::error::Result;
use druckbote_core::slots::JobSlots;
use druckbote_core::types::{Job, JobStats, Printer, RemoteJobStatus};

use crate::cloud::CloudPrintService;
use crate::local::LocalPrintSystem;
use crate::registry::{PrinterRegistry, RegisteredPrinter};

// ---------------------------------------------------------------------------
// PrinterManager
// ---------------------------------------------------------------------------

/// Handle to the running bridge.
///
/// Created with [`start`](PrinterManager::start), which seeds the registry
/// from the cloud, runs one reconciliation pass, and spawns the background
/// loops.  [`quit`](PrinterManager::quit) stops the loops and waits for
/// them; job pipelines already executing are left to finish on their own.
pub struct PrinterManager<L, C> {
    inner: Arc<ManagerInner<L, C>>,
    shutdown: CancellationToken,
    reconciler: JoinHandle<()>,
    intake_consumer: JoinHandle<()>,
    intake_producer: JoinHandle<()>,
}

/// State shared by the loops and every job pipeline.
struct ManagerInner<L, C> {
    local: L,
    cloud: C,
    registry: PrinterRegistry,
    download_slots: JobSlots,
    counters: Mutex<JobCounters>,
    job_poll_interval: Duration,
    printer_queue_capacity: usize,
    truncate_job_owner: bool,
}

#[derive(Debug, Default)]
struct JobCounters {
    done: u64,
    errored: u64,
}

impl<L, C> PrinterManager<L, C>
where
    L: LocalPrintSystem + 'static,
    C: CloudPrintService + 'static,
{
    /// Start the bridge.
    ///
    /// Seeds the registry from the cloud's current printer list (a failure
    /// here aborts construction), runs one synchronous reconciliation
    /// pass, then spawns the periodic reconciler and the job intake loop.
    pub async fn start(local: L, cloud: C, config: &BridgeConfig) -> Result<Self> {
        let seeded = cloud.list().await?;
        let mut printers = HashMap::with_capacity(seeded.len());
        for printer in seeded {
            printers.insert(
                printer.remote_id.clone(),
                RegisteredPrinter::new(printer, config.printer_queue_capacity),
            );
        }

        let inner = Arc::new(ManagerInner {
            local,
            cloud,
            registry: PrinterRegistry::new(printers),
            download_slots: JobSlots::new(config.max_concurrent_downloads),
            counters: Mutex::new(JobCounters::default()),
            job_poll_interval: Duration::from_secs(config.job_poll_interval_secs),
            printer_queue_capacity: config.printer_queue_capacity,
            truncate_job_owner: config.truncate_job_owner,
        });

        Arc::clone(&inner).reconcile_pass().await;

        let shutdown = CancellationToken::new();
        let reconciler = tokio::spawn(Arc::clone(&inner).reconcile_loop(
            Duration::from_secs(config.printer_poll_interval_secs),
            shutdown.clone(),
        ));

        // Rendezvous channel between the batch producer and the consumer.
        let (job_tx, job_rx) = mpsc::channel(1);
        let intake_producer =
            tokio::spawn(Arc::clone(&inner).intake_producer(job_tx, shutdown.clone()));
        let intake_consumer =
            tokio::spawn(Arc::clone(&inner).intake_consumer(job_rx, shutdown.clone()));

        info!(printers = inner.registry.len(), "printer manager started");

        Ok(Self {
            inner,
            shutdown,
            reconciler,
            intake_consumer,
            intake_producer,
        })
    }

    /// Stop the background loops and wait until they have exited.
    ///
    /// Returns only after the reconciler and both intake tasks have
    /// observed the stop; no further reconciliation pass begins afterward.
    pub async fn quit(self) {
        info!("stopping printer manager");
        self.shutdown.cancel();

        for (task, handle) in [
            ("reconciler", self.reconciler),
            ("intake consumer", self.intake_consumer),
            ("intake producer", self.intake_producer),
        ] {
            if let Err(e) = handle.await {
                error!(task, error = %e, "bridge task failed during shutdown");
            }
        }

        info!("printer manager stopped");
    }

    /// Aggregate job statistics: terminal jobs since start, and jobs
    /// currently holding a printer queue slot.
    pub fn job_stats(&self) -> JobStats {
        self.inner.job_stats()
    }

    /// Snapshot of the printers currently registered with the cloud.
    pub fn printers(&self) -> Vec<Printer> {
        self.inner
            .registry
            .snapshot()
            .values()
            .map(|entry| entry.printer.clone())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Printer reconciliation
// ---------------------------------------------------------------------------

impl<L, C> ManagerInner<L, C>
where
    L: LocalPrintSystem + 'static,
    C: CloudPrintService + 'static,
{
    /// Periodic reconciliation: sleep one interval, run a pass, repeat
    /// until told to stop.  Passes are strictly serial.
    async fn reconcile_loop(
        self: Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("printer reconciler stopped");
                    return;
                }
                _ = tokio::time::sleep(interval) => {
                    Arc::clone(&self).reconcile_pass().await;
                }
            }
        }
    }

    /// One compare-and-apply pass over the two printer truth sources.
    ///
    /// A local enumeration failure skips the pass entirely.  The registry
    /// is replaced wholesale, and only once every diff has produced its
    /// result.
    async fn reconcile_pass(self: Arc<Self>) {
        info!("synchronizing printers with the cloud");

        let local_printers = match self.local.printers().await {
            Ok(printers) => printers,
            Err(e) => {
                error!(error = %e, "skipping reconciliation pass: local printer enumeration failed");
                return;
            }
        };

        let registered: Vec<Printer> = self
            .registry
            .snapshot()
            .values()
            .map(|entry| entry.printer.clone())
            .collect();

        let Some(diffs) = diff_printers(&local_printers, &registered) else {
            info!(count = local_printers.len(), "printers already in sync");
            return;
        };

        let mut applies = JoinSet::new();
        for diff in diffs {
            let worker = Arc::clone(&self);
            applies.spawn(async move { worker.apply_diff(diff).await });
        }

        let mut next = HashMap::new();
        while let Some(applied) = applies.join_next().await {
            match applied {
                Ok(Some(entry)) => {
                    next.insert(entry.printer.remote_id.clone(), entry);
                }
                Ok(None) => {}
                Err(e) => error!(error = %e, "diff application task failed"),
            }
        }

        let count = next.len();
        self.registry.replace(next);
        info!(printers = count, "finished synchronizing printers");
    }

    /// Apply one diff against the cloud.
    ///
    /// Returns the registry entry the printer should have in the next
    /// snapshot, or `None` to drop it.  A failed registration drops the
    /// printer for this cycle only: the next pass diffs it as unknown
    /// again and retries.
    async fn apply_diff(&self, diff: PrinterDiff) -> Option<RegisteredPrinter> {
        match diff.op {
            PrinterOp::Register => {
                let descriptor = match self.local.driver_descriptor(&diff.printer.name).await {
                    Ok(descriptor) => descriptor,
                    Err(e) => {
                        error!(printer = %diff.printer.name, error = %e, "driver descriptor fetch failed; not registering");
                        return None;
                    }
                };

                let remote_id = match self.cloud.register(&diff.printer, &descriptor).await {
                    Ok(remote_id) => remote_id,
                    Err(e) => {
                        error!(printer = %diff.printer.name, error = %e, "printer registration failed");
                        return None;
                    }
                };
                info!(printer = %diff.printer.name, remote_id = %remote_id, "registered printer");

                if self.cloud.can_share() {
                    match self.cloud.share(&remote_id).await {
                        Ok(()) => info!(printer = %diff.printer.name, "shared printer"),
                        Err(e) => {
                            error!(printer = %diff.printer.name, error = %e, "printer share failed")
                        }
                    }
                }

                let mut printer = diff.printer;
                printer.remote_id = remote_id;
                Some(RegisteredPrinter::new(printer, self.printer_queue_capacity))
            }

            PrinterOp::Update => {
                let mut descriptor = None;
                if diff.caps_changed {
                    match self.local.driver_descriptor(&diff.printer.name).await {
                        Ok(d) => descriptor = Some(d),
                        Err(e) => {
                            error!(printer = %diff.printer.name, error = %e, "driver descriptor fetch failed; keeping stale registration");
                            // The old entry keeps its old caps hash, so the
                            // next pass diffs and retries.
                            return self.registry.lookup(&diff.printer.remote_id);
                        }
                    }
                }

                match self.cloud.update(&diff, descriptor.as_deref()).await {
                    Ok(()) => info!(printer = %diff.printer.name, "updated printer"),
                    Err(e) => {
                        error!(printer = %diff.printer.name, error = %e, "printer update failed")
                    }
                }

                Some(self.carry_entry(diff.printer))
            }

            PrinterOp::Delete => {
                match self.cloud.delete(&diff.printer.remote_id).await {
                    Ok(()) => info!(printer = %diff.printer.name, "deleted printer"),
                    Err(e) => {
                        error!(printer = %diff.printer.name, error = %e, "printer delete failed")
                    }
                }
                None
            }

            PrinterOp::Leave => {
                debug!(printer = %diff.printer.name, "no change");
                Some(self.carry_entry(diff.printer))
            }
        }
    }

    /// Build the next-snapshot entry for a printer that stays registered,
    /// carrying its existing queue slots forward so in-flight holder
    /// counts survive the snapshot swap.
    fn carry_entry(&self, printer: Printer) -> RegisteredPrinter {
        match self.registry.lookup(&printer.remote_id) {
            Some(existing) => RegisteredPrinter {
                printer,
                job_slots: existing.job_slots,
            },
            None => RegisteredPrinter::new(printer, self.printer_queue_capacity),
        }
    }
}

// ---------------------------------------------------------------------------
// Job intake
// ---------------------------------------------------------------------------

impl<L, C> ManagerInner<L, C>
where
    L: LocalPrintSystem + 'static,
    C: CloudPrintService + 'static,
{
    /// Long-poll the cloud for job batches and hand each job to the
    /// consumer in batch order.  Errors are logged and retried
    /// immediately; only shutdown ends the loop.
    async fn intake_producer(
        self: Arc<Self>,
        jobs: mpsc::Sender<Job>,
        shutdown: CancellationToken,
    ) {
        loop {
            let batch = tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("job intake producer stopped");
                    return;
                }
                batch = self.cloud.next_job_batch() => batch,
            };

            match batch {
                Ok(incoming) => {
                    for job in incoming {
                        if jobs.send(job).await.is_err() {
                            // Consumer is gone; nothing left to feed.
                            return;
                        }
                    }
                }
                Err(e) => warn!(error = %e, "waiting for the next job batch failed"),
            }
        }
    }

    /// Fan incoming jobs out to pipelines until told to stop.  Pipelines
    /// run in parallel; no cross-job ordering is guaranteed past this
    /// point.
    async fn intake_consumer(
        self: Arc<Self>,
        mut jobs: mpsc::Receiver<Job>,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("job intake consumer stopped");
                    return;
                }
                job = jobs.recv() => match job {
                    Some(job) => {
                        tokio::spawn(Arc::clone(&self).process_job(job));
                    }
                    None => return,
                },
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Job execution pipeline
// ---------------------------------------------------------------------------

impl<L, C> ManagerInner<L, C>
where
    L: LocalPrintSystem + 'static,
    C: CloudPrintService + 'static,
{
    /// Execute one job end to end.
    ///
    /// Linear stages; the first failure reports an error status to the
    /// cloud, counts the job as errored, and ends the pipeline.  The spool
    /// file guard removes the payload on every exit path past its
    /// creation.
    async fn process_job(self: Arc<Self>, job: Job) {
        info!(job_id = %job.remote_job_id, "received job");

        let Some(entry) = self.registry.lookup(&job.remote_printer_id) else {
            self.fail_job(
                &job,
                format!(
                    "no printer {} registered for job {}",
                    job.remote_printer_id, job.remote_job_id
                ),
            )
            .await;
            return;
        };

        let options = match self.cloud.ticket(&job.ticket_url).await {
            Ok(options) => options,
            Err(e) => {
                self.fail_job(
                    &job,
                    format!("ticket fetch for job {} failed: {e}", job.remote_job_id),
                )
                .await;
                return;
            }
        };

        let spool = match self.local.create_spool_file().await {
            Ok(spool) => spool,
            Err(e) => {
                self.fail_job(
                    &job,
                    format!(
                        "spool file creation for job {} failed: {e}",
                        job.remote_job_id
                    ),
                )
                .await;
                return;
            }
        };

        // Download under the global budget; the permit is released on
        // every outcome.
        let (downloaded, elapsed) = {
            let _permit = self.download_slots.acquire().await;
            let started = Instant::now();
            let result = self.cloud.download(&job.file_url, spool.path()).await;
            (result, started.elapsed())
        };
        if let Err(e) = downloaded {
            self.fail_job(
                &job,
                format!(
                    "payload download for job {} failed: {e}",
                    job.remote_job_id
                ),
            )
            .await;
            return;
        }
        info!(
            job_id = %job.remote_job_id,
            elapsed_ms = elapsed.as_millis() as u64,
            "payload downloaded"
        );

        let owner = if self.truncate_job_owner {
            job.owner_id.split('@').next().unwrap_or("")
        } else {
            job.owner_id.as_str()
        };
        let title = format!("gcp:{}", job.remote_job_id);

        // Queue slot held from submission to the terminal status below.
        let _queue_slot = entry.job_slots.acquire().await;

        let local_job_id = match self
            .local
            .print(&entry.printer.name, spool.path(), &title, owner, &options)
            .await
        {
            Ok(local_job_id) => local_job_id,
            Err(e) => {
                self.fail_job(
                    &job,
                    format!(
                        "submission of job {} to printer {} failed: {e}",
                        job.remote_job_id, entry.printer.name
                    ),
                )
                .await;
                return;
            }
        };
        info!(
            job_id = %job.remote_job_id,
            local_job_id,
            printer = %entry.printer.name,
            "job submitted"
        );

        // Poll the local status until it projects to a terminal value,
        // reporting each distinct (status, message) pair exactly once.
        let mut last_reported: Option<(RemoteJobStatus, String)> = None;
        loop {
            tokio::time::sleep(self.job_poll_interval).await;

            let (state, message) = match self.local.job_state(local_job_id).await {
                Ok(status) => status,
                Err(e) => {
                    self.fail_job(
                        &job,
                        format!("status query for local job {local_job_id} failed: {e}"),
                    )
                    .await;
                    return;
                }
            };
            let status = state.remote_status();

            let changed = last_reported
                .as_ref()
                .is_none_or(|(s, m)| *s != status || *m != message);
            if changed {
                if let Err(e) = self
                    .cloud
                    .report_job_state(&job.remote_job_id, status, &message)
                    .await
                {
                    warn!(job_id = %job.remote_job_id, error = %e, "status report failed");
                }
                info!(job_id = %job.remote_job_id, status = %status, "job status changed");
                last_reported = Some((status, message));
            }

            if status.is_terminal() {
                self.record_job_outcome(status == RemoteJobStatus::Done);
                return;
            }
        }
    }

    /// Report a job as failed to the cloud and count it.
    async fn fail_job(&self, job: &Job, message: String) {
        error!(job_id = %job.remote_job_id, "{message}");
        if let Err(e) = self
            .cloud
            .report_job_state(&job.remote_job_id, RemoteJobStatus::Error, &message)
            .await
        {
            warn!(job_id = %job.remote_job_id, error = %e, "error report failed");
        }
        self.record_job_outcome(false);
    }

    fn record_job_outcome(&self, success: bool) {
        let mut counters = self.counters.lock().expect("stats lock poisoned");
        if success {
            counters.done += 1;
        } else {
            counters.errored += 1;
        }
    }

    fn job_stats(&self) -> JobStats {
        let processed = {
            let counters = self.counters.lock().expect("stats lock poisoned");
            counters.done + counters.errored
        };
        let processing = self
            .registry
            .snapshot()
            .values()
            .map(|entry| entry.job_slots.in_use() as u64)
            .sum();
        JobStats {
            processed,
            processing,
        }
    }
}
