// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::format::EngineError;
use crate::model::ShapeIdsExhausted;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("{message}")]
    Validation { message: String },
    #[error("{what} not found")]
    NotFound { what: String },
    #[error(
        "unsupported operation '{operation}' for tool '{tool}'{}",
        suggestion_suffix(.suggestion)
    )]
    UnsupportedOperation {
        tool: String,
        operation: String,
        suggestion: Option<String>,
    },
    #[error(transparent)]
    Io(#[from] EngineError),
    #[error("{message}")]
    Concurrency { message: String },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(candidate) => format!(" (did you mean '{candidate}'?)"),
        None => String::new(),
    }
}

/// Stable, machine-readable error category surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    UnsupportedOperation,
    Io,
    Concurrency,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::UnsupportedOperation => "unsupported_operation",
            Self::Io => "io",
            Self::Concurrency => "concurrency",
        }
    }
}

impl OperationError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            Self::Io(_) => ErrorKind::Io,
            Self::Concurrency { .. } => ErrorKind::Concurrency,
        }
    }
}

impl From<StoreError> for OperationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { session_id } => {
                Self::not_found(format!("session '{session_id}'"))
            }
            StoreError::Busy { .. } | StoreError::Full { .. } => Self::Concurrency {
                message: err.to_string(),
            },
            StoreError::Engine(err) => Self::Io(err),
        }
    }
}

impl From<ShapeIdsExhausted> for OperationError {
    fn from(err: ShapeIdsExhausted) -> Self {
        Self::validation(err.to_string())
    }
}
