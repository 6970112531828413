// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory printer registry keyed by the cloud-assigned printer id.
//
// The reconciler publishes by whole-snapshot replacement: readers clone an
// `Arc` to the current map and can never observe a partially built one.
// Entries are immutable after publication.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use druckbote_core::slots::JobSlots;
use druckbote_core::types::Printer;

/// A printer currently registered with the cloud, paired with its queue
/// budget.
#[derive(Debug, Clone)]
pub struct RegisteredPrinter {
    pub printer: Printer,
    /// Per-printer queue slots, held by a pipeline from submission until
    /// the job reaches a terminal status.
    pub job_slots: JobSlots,
}

impl RegisteredPrinter {
    pub fn new(printer: Printer, queue_capacity: usize) -> Self {
        Self {
            printer,
            job_slots: JobSlots::new(queue_capacity),
        }
    }
}

/// Snapshot-published map of registered printers.
pub struct PrinterRegistry {
    printers: RwLock<Arc<HashMap<String, RegisteredPrinter>>>,
}

impl PrinterRegistry {
    pub fn new(initial: HashMap<String, RegisteredPrinter>) -> Self {
        Self {
            printers: RwLock::new(Arc::new(initial)),
        }
    }

    /// The current snapshot.  Cheap; the map behind the `Arc` is never
    /// mutated after publication.
    pub fn snapshot(&self) -> Arc<HashMap<String, RegisteredPrinter>> {
        Arc::clone(&self.printers.read().expect("registry lock poisoned"))
    }

    /// Look up a printer by its cloud id.
    pub fn lookup(&self, remote_id: &str) -> Option<RegisteredPrinter> {
        self.snapshot().get(remote_id).cloned()
    }

    /// Replace the whole registry with a freshly built map.
    pub fn replace(&self, next: HashMap<String, RegisteredPrinter>) {
        *self.printers.write().expect("registry lock poisoned") = Arc::new(next);
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printer(name: &str, remote_id: &str) -> Printer {
        Printer {
            name: name.into(),
            remote_id: remote_id.into(),
            caps_hash: "h1".into(),
            description: String::new(),
        }
    }

    fn entry(name: &str, remote_id: &str) -> RegisteredPrinter {
        RegisteredPrinter::new(printer(name, remote_id), 3)
    }

    #[test]
    fn lookup_finds_by_remote_id() {
        let registry = PrinterRegistry::new(HashMap::from([(
            "r7".to_string(),
            entry("HP", "r7"),
        )]));

        let found = registry.lookup("r7").expect("present");
        assert_eq!(found.printer.name, "HP");
        assert!(registry.lookup("r99").is_none());
    }

    #[test]
    fn snapshots_survive_replacement() {
        let registry = PrinterRegistry::new(HashMap::from([(
            "r7".to_string(),
            entry("HP", "r7"),
        )]));

        let before = registry.snapshot();
        registry.replace(HashMap::new());

        // The old snapshot is untouched; new readers see the replacement.
        assert_eq!(before.len(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn replacement_is_wholesale() {
        let registry = PrinterRegistry::new(HashMap::new());
        registry.replace(HashMap::from([
            ("r1".to_string(), entry("HP", "r1")),
            ("r2".to_string(), entry("Epson", "r2")),
        ]));

        assert_eq!(registry.len(), 2);
        registry.replace(HashMap::from([("r2".to_string(), entry("Epson", "r2"))]));
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup("r1").is_none());
    }
}
