// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::Instrument;

use crate::format::DocumentEngine;
use crate::model::{IdentityKey, SessionId};
use crate::store::{CallContext, IdentityAccessor, SessionStore};

use super::finalize::{finalize, CallSummary};
use super::{
    DocumentContext, HandlerRegistry, OperationContext, OperationError, OperationParameters,
    OperationResponse,
};

/// One call against a tool family, as marshalled by the transport layer.
#[derive(Debug, Clone, Default)]
pub struct OperationRequest {
    pub operation: String,
    pub path: Option<PathBuf>,
    pub session_id: Option<String>,
    pub output_path: Option<PathBuf>,
    pub params: OperationParameters,
}

impl OperationRequest {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn in_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(output_path.into());
        self
    }

    pub fn with_params(mut self, params: OperationParameters) -> Self {
        self.params = params;
        self
    }
}

/// Drives a call through resolve → acquire → execute → persist → finalize.
pub struct Dispatcher<E: DocumentEngine> {
    engine: Arc<E>,
    store: Arc<SessionStore<E::Document>>,
    identity: Arc<dyn IdentityAccessor>,
}

impl<E: DocumentEngine> Dispatcher<E> {
    pub fn new(
        engine: Arc<E>,
        store: Arc<SessionStore<E::Document>>,
        identity: Arc<dyn IdentityAccessor>,
    ) -> Self {
        Self {
            engine,
            store,
            identity,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn store(&self) -> &Arc<SessionStore<E::Document>> {
        &self.store
    }

    pub fn resolve_identity(&self, call: &CallContext) -> IdentityKey {
        self.identity.resolve(call)
    }

    pub async fn dispatch(
        &self,
        registry: &HandlerRegistry<E::Document>,
        call: &CallContext,
        request: OperationRequest,
    ) -> Result<OperationResponse, OperationError> {
        let identity = self.resolve_identity(call);
        let span = tracing::info_span!(
            "dispatch",
            tool = registry.tool(),
            operation = %request.operation.trim(),
            identity = %identity,
            session_id = request.session_id.as_deref().unwrap_or(""),
        );
        let result = self
            .run(registry, &identity, request)
            .instrument(span.clone())
            .await;
        if let Err(err) = &result {
            span.in_scope(|| {
                tracing::debug!(kind = err.kind().as_str(), error = %err, "call failed");
            });
        }
        result
    }

    async fn run(
        &self,
        registry: &HandlerRegistry<E::Document>,
        identity: &IdentityKey,
        request: OperationRequest,
    ) -> Result<OperationResponse, OperationError> {
        let OperationRequest {
            operation,
            path,
            session_id,
            output_path,
            params,
        } = request;

        // Everything that can be rejected up front is rejected before the document is touched.
        let handler = registry.get_handler(&operation)?;
        let missing = params.missing(handler.required_params());
        if !missing.is_empty() {
            return Err(OperationError::validation(format!(
                "missing required parameter(s) for '{}': {}",
                operation.trim(),
                missing.join(", ")
            )));
        }
        let session_id = parse_session_id(session_id.as_deref())?;

        let mut document = DocumentContext::create(
            &self.store,
            self.engine.as_ref(),
            session_id.as_ref(),
            path.as_deref(),
            identity,
        )
        .await?;
        let session_id = document.session_id().cloned();
        let source_path = document.source_path().map(Path::to_path_buf);

        let (output, modified) = {
            let mut ctx = OperationContext::new(
                document.document_mut(),
                &self.store,
                identity,
                session_id.as_ref(),
                source_path.as_deref(),
                output_path.as_deref(),
            );
            let output = handler.execute(&mut ctx, &params)?;
            (output, ctx.is_modified())
        };

        let written = if modified {
            document.save(self.engine.as_ref(), output_path.as_deref())?
        } else {
            None
        };
        drop(document);

        Ok(finalize(
            registry.tool(),
            &operation,
            output,
            CallSummary {
                modified,
                output_path: written,
                session_id,
            },
        ))
    }
}

pub(crate) fn parse_session_id(raw: Option<&str>) -> Result<Option<SessionId>, OperationError> {
    raw.map(|raw| {
        SessionId::new(raw.to_owned())
            .map_err(|err| OperationError::validation(format!("invalid sessionId: {err}")))
    })
    .transpose()
}
