// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::{Path, PathBuf};

use crate::format::DocumentEngine;
use crate::model::{IdentityKey, SessionId};
use crate::store::{SessionLease, SessionStore};

use super::OperationError;

enum DocumentSource<D> {
    /// Loaded for this call only; dropped with the context.
    File(D),
    /// Borrowed from the session store under its per-session lock.
    Session(SessionLease<D>),
}

/// Where the working document of one call comes from and where it goes.
///
/// Dropping the context releases whatever was acquired: the loaded document in file mode, the
/// session lock (but never the session) in session mode.
pub struct DocumentContext<D> {
    source: DocumentSource<D>,
    source_path: Option<PathBuf>,
}

impl<D> DocumentContext<D> {
    /// Reuses the session when `session_id` is given (loading it from `path` on first use),
    /// otherwise loads `path` fresh.
    pub async fn create<E>(
        store: &SessionStore<D>,
        engine: &E,
        session_id: Option<&SessionId>,
        path: Option<&Path>,
        identity: &IdentityKey,
    ) -> Result<Self, OperationError>
    where
        E: DocumentEngine<Document = D>,
    {
        match session_id {
            Some(session_id) => {
                let lease = match path {
                    Some(path) => {
                        store
                            .get_or_create(identity, session_id, Some(path.to_path_buf()), || {
                                engine.load(path)
                            })
                            .await?
                    }
                    None => store.acquire(identity, session_id).await?,
                };
                if lease.created() {
                    tracing::debug!(
                        session_id = %session_id,
                        path = ?path,
                        "loaded document into session"
                    );
                }
                let source_path = lease.origin_path();
                Ok(Self {
                    source: DocumentSource::Session(lease),
                    source_path,
                })
            }
            None => {
                let Some(path) = path else {
                    return Err(OperationError::validation("either path or sessionId is required"));
                };
                let document = engine.load(path)?;
                tracing::debug!(path = %path.display(), "loaded document");
                Ok(Self {
                    source: DocumentSource::File(document),
                    source_path: Some(path.to_path_buf()),
                })
            }
        }
    }

    pub fn document(&self) -> &D {
        match &self.source {
            DocumentSource::File(document) => document,
            DocumentSource::Session(lease) => lease.document(),
        }
    }

    pub fn document_mut(&mut self) -> &mut D {
        match &mut self.source {
            DocumentSource::File(document) => document,
            DocumentSource::Session(lease) => lease.document_mut(),
        }
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        match &self.source {
            DocumentSource::File(_) => None,
            DocumentSource::Session(lease) => Some(lease.session_id()),
        }
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Persists a mutation. Returns the path written, if any.
    ///
    /// File mode always writes, to `output_path` or back to the source. Session mode keeps the
    /// change in memory (marking the session dirty) and only mirrors it to disk when an
    /// `output_path` is given.
    pub fn save<E>(
        &self,
        engine: &E,
        output_path: Option<&Path>,
    ) -> Result<Option<PathBuf>, OperationError>
    where
        E: DocumentEngine<Document = D>,
    {
        match &self.source {
            DocumentSource::File(document) => {
                let Some(target) = output_path.or(self.source_path.as_deref()) else {
                    return Err(OperationError::validation("no output path to save to"));
                };
                engine.save(document, target)?;
                tracing::info!(path = %target.display(), "document saved");
                Ok(Some(target.to_path_buf()))
            }
            DocumentSource::Session(lease) => {
                lease.mark_dirty();
                let Some(target) = output_path else {
                    return Ok(None);
                };
                engine.save(lease.document(), target)?;
                if self.source_path.as_deref() == Some(target) {
                    lease.mark_clean();
                }
                tracing::info!(
                    session_id = %lease.session_id(),
                    path = %target.display(),
                    "session mirrored to disk"
                );
                Ok(Some(target.to_path_buf()))
            }
        }
    }
}
