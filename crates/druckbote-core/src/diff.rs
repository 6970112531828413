// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer diff computation.
//
// Compares the local print subsystem's view of the printers against the
// bridge registry's view and produces one decision record per printer on
// either side.  Pure computation; the reconciler applies the decisions.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::Printer;

/// What the reconciler should do about one printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrinterOp {
    /// Present locally, unknown to the cloud.
    Register,
    /// Present on both sides but drifted (capabilities or description).
    Update,
    /// Registered with the cloud but gone locally.
    Delete,
    /// Identical on both sides.
    Leave,
}

/// Decision record produced by [`diff_printers`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterDiff {
    pub op: PrinterOp,
    /// The printer acted upon.  For `Register` the `remote_id` is still
    /// empty; for `Update` and `Leave` it is the registered id merged onto
    /// the current local fields; for `Delete` it is the registered printer.
    pub printer: Printer,
    /// Whether the driver descriptor must be refetched.  Only meaningful
    /// for `Update`.
    pub caps_changed: bool,
}

/// Compare a local printer snapshot against a registry snapshot.
///
/// Matching is by local queue name.  Returns `None` when the two views are
/// identical (every printer would be left alone), otherwise one diff per
/// printer.
pub fn diff_printers(local: &[Printer], registered: &[Printer]) -> Option<Vec<PrinterDiff>> {
    let registered_by_name: HashMap<&str, &Printer> =
        registered.iter().map(|p| (p.name.as_str(), p)).collect();
    let local_names: HashSet<&str> = local.iter().map(|p| p.name.as_str()).collect();

    let mut diffs = Vec::with_capacity(local.len() + registered.len());
    let mut dirty = false;

    for candidate in local {
        match registered_by_name.get(candidate.name.as_str()) {
            None => {
                dirty = true;
                diffs.push(PrinterDiff {
                    op: PrinterOp::Register,
                    printer: candidate.clone(),
                    caps_changed: false,
                });
            }
            Some(current) => {
                let caps_changed = candidate.caps_hash != current.caps_hash;
                if caps_changed || candidate.description != current.description {
                    dirty = true;
                    let mut merged = candidate.clone();
                    merged.remote_id = current.remote_id.clone();
                    diffs.push(PrinterDiff {
                        op: PrinterOp::Update,
                        printer: merged,
                        caps_changed,
                    });
                } else {
                    diffs.push(PrinterDiff {
                        op: PrinterOp::Leave,
                        printer: (*current).clone(),
                        caps_changed: false,
                    });
                }
            }
        }
    }

    for current in registered {
        if !local_names.contains(current.name.as_str()) {
            dirty = true;
            diffs.push(PrinterDiff {
                op: PrinterOp::Delete,
                printer: current.clone(),
                caps_changed: false,
            });
        }
    }

    if dirty { Some(diffs) } else { None }
}
