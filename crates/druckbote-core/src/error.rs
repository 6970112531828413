// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Druckbote.

use thiserror::Error;

/// Top-level error type for all Druckbote operations.
#[derive(Debug, Error)]
pub enum DruckboteError {
    // -- Local print subsystem --
    #[error("local print system error: {0}")]
    Local(String),

    #[error("spool file error: {0}")]
    Spool(String),

    // -- Cloud print service --
    #[error("cloud print service error: {0}")]
    Cloud(String),

    // -- Configuration / plumbing --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DruckboteError>;
