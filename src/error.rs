// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Domain failures surfaced by the store and the parsers. They travel inside
/// `anyhow::Error` and can be recovered with `downcast_ref`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{entity} {id} not found for user '{user_id}'")]
    NotFound {
        entity: &'static str,
        id: i64,
        user_id: String,
    },
    #[error("Unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
    #[error("Unsupported currency '{0}'")]
    UnsupportedCurrency(String),
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: String },
}
