// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Druckbote — core types, configuration, and primitives shared across the
// bridge crates.

pub mod config;
pub mod diff;
pub mod error;
pub mod slots;
pub mod types;

pub use config::BridgeConfig;
pub use diff::{PrinterDiff, PrinterOp, diff_printers};
pub use error::DruckboteError;
pub use slots::JobSlots;
pub use types::*;
