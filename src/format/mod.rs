// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Document engines: how a working document is read from and written to storage.
//!
//! The dispatch layer only ever talks to [`DocumentEngine`]; the object model the handlers
//! mutate is the engine's `Document` type.

use std::io;
use std::path::{Path, PathBuf};

pub mod deck_json;

pub use deck_json::JsonDeckEngine;

/// Load/save seam for the document object model.
pub trait DocumentEngine: Send + Sync + 'static {
    type Document: Send + 'static;

    fn load(&self, path: &Path) -> Result<Self::Document, EngineError>;

    fn save(&self, document: &Self::Document, path: &Path) -> Result<(), EngineError>;

    /// A fresh, empty document that has never been on disk.
    fn create(&self) -> Self::Document;
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("i/o error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed document at {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("refusing to write through symlink at {}", .path.display())]
    SymlinkRefused { path: PathBuf },
}

impl EngineError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::Json { path, .. } | Self::SymlinkRefused { path } => path,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// Attempts to flush written file contents and rename operations to stable storage where
    /// possible. Exact guarantees are platform/filesystem-dependent.
    Durable,
}
