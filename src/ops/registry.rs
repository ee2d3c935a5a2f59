// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{OperationError, OperationHandler};

/// Builds a fresh handler instance for a registry slot.
pub type HandlerFactory<D> = fn() -> Arc<dyn OperationHandler<D>>;

const SUGGESTION_MIN_RATIO: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("tool '{tool}' registers operation '{operation}' twice")]
    DuplicateOperation {
        tool: &'static str,
        operation: String,
    },
    #[error("tool '{tool}' registers an operation with an invalid key '{operation}'")]
    InvalidKey {
        tool: &'static str,
        operation: String,
    },
}

/// Operation name → handler table for one tool family.
///
/// Keys are matched case-insensitively. The table order is kept so the advertised operation
/// list reads the same as the source table.
pub struct HandlerRegistry<D> {
    tool: &'static str,
    operations: Vec<&'static str>,
    handlers: HashMap<String, Arc<dyn OperationHandler<D>>>,
}

impl<D> fmt::Debug for HandlerRegistry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("tool", &self.tool)
            .field("operations", &self.operations)
            .finish()
    }
}

impl<D> HandlerRegistry<D> {
    pub fn from_table(
        tool: &'static str,
        table: &[(&'static str, HandlerFactory<D>)],
    ) -> Result<Self, RegistryError> {
        let mut operations = Vec::with_capacity(table.len());
        let mut handlers = HashMap::with_capacity(table.len());

        for (operation, factory) in table {
            let key = normalize_key(operation);
            if key.is_empty() || key != *operation {
                return Err(RegistryError::InvalidKey {
                    tool,
                    operation: (*operation).to_owned(),
                });
            }
            if handlers.insert(key, factory()).is_some() {
                return Err(RegistryError::DuplicateOperation {
                    tool,
                    operation: (*operation).to_owned(),
                });
            }
            operations.push(*operation);
        }

        Ok(Self {
            tool,
            operations,
            handlers,
        })
    }

    pub fn tool(&self) -> &'static str {
        self.tool
    }

    /// Registered operation keys, in table order.
    pub fn operations(&self) -> &[&'static str] {
        &self.operations
    }

    pub fn get_handler(
        &self,
        operation: &str,
    ) -> Result<Arc<dyn OperationHandler<D>>, OperationError> {
        let key = normalize_key(operation);
        self.handlers
            .get(&key)
            .cloned()
            .ok_or_else(|| OperationError::UnsupportedOperation {
                tool: self.tool.to_owned(),
                operation: operation.trim().to_owned(),
                suggestion: closest_match(&key, self.operations.iter().copied())
                    .map(str::to_owned),
            })
    }
}

pub(crate) fn normalize_key(operation: &str) -> String {
    operation.trim().to_ascii_lowercase()
}

/// Closest candidate to a (normalized) key, if any is similar enough to suggest.
pub(crate) fn closest_match(
    key: &str,
    candidates: impl IntoIterator<Item = &'static str>,
) -> Option<&'static str> {
    if key.is_empty() {
        return None;
    }
    candidates
        .into_iter()
        .map(|candidate| (candidate, rapidfuzz::fuzz::ratio(key.chars(), candidate.chars())))
        .filter(|(_, ratio)| *ratio >= SUGGESTION_MIN_RATIO)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate)
}
