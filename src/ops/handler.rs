// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{IdentityKey, SessionId};
use crate::store::{SessionInfo, SessionStore};

use super::{OperationError, OperationParameters};

/// What a handler hands back: a status line for mutations, structured data for queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationOutput {
    Message { message: String },
    Payload { data: serde_json::Value },
}

impl OperationOutput {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    pub fn payload<T: Serialize>(data: &T) -> Result<Self, OperationError> {
        let data = serde_json::to_value(data).map_err(|err| {
            OperationError::validation(format!("cannot encode operation result: {err}"))
        })?;
        Ok(Self::Payload { data })
    }
}

/// Per-call envelope handed to a handler.
///
/// The document is borrowed for the duration of the call; `modified` starts out false and only
/// the handler flips it.
pub struct OperationContext<'a, D> {
    document: &'a mut D,
    store: &'a SessionStore<D>,
    identity: &'a IdentityKey,
    session_id: Option<&'a SessionId>,
    source_path: Option<&'a Path>,
    output_path: Option<&'a Path>,
    modified: bool,
}

impl<'a, D> OperationContext<'a, D> {
    pub fn new(
        document: &'a mut D,
        store: &'a SessionStore<D>,
        identity: &'a IdentityKey,
        session_id: Option<&'a SessionId>,
        source_path: Option<&'a Path>,
        output_path: Option<&'a Path>,
    ) -> Self {
        Self {
            document,
            store,
            identity,
            session_id,
            source_path,
            output_path,
            modified: false,
        }
    }

    pub fn document(&self) -> &D {
        &*self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut *self.document
    }

    pub fn identity(&self) -> &IdentityKey {
        self.identity
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output_path
    }

    /// Metadata of the session this call runs in, if any.
    pub fn session_info(&self) -> Option<SessionInfo> {
        let session_id = self.session_id?;
        self.store.info(self.identity, session_id).ok()
    }

    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

/// One named operation of a tool family.
///
/// Handlers are stateless and shared between calls. They must validate everything before
/// touching the document, mutate in place, and call [`OperationContext::mark_modified`] only
/// when they actually changed something.
pub trait OperationHandler<D>: Send + Sync {
    /// Parameters checked by the dispatcher before the document is loaded.
    fn required_params(&self) -> &'static [&'static str] {
        &[]
    }

    fn execute(
        &self,
        ctx: &mut OperationContext<'_, D>,
        params: &OperationParameters,
    ) -> Result<OperationOutput, OperationError>;
}
