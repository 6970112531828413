// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Druckbote Bridge — keeps a local print subsystem and a cloud print
// service in sync: local printers are mirrored up to the cloud, pending
// cloud jobs are pulled down, executed locally, and their lifecycle status
// reflected back.  This crate consumes the two client seams; the concrete
// clients live with the enclosing process.

pub mod cloud;
pub mod local;
pub mod manager;
pub mod registry;

pub use cloud::CloudPrintService;
pub use local::{LocalPrintSystem, SpoolFile};
pub use manager::PrinterManager;
pub use registry::{PrinterRegistry, RegisteredPrinter};
