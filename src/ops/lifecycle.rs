// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::Instrument;

use crate::format::DocumentEngine;
use crate::model::{IdentityKey, SessionId};
use crate::store::{CallContext, SessionInfo};

use super::dispatcher::parse_session_id;
use super::registry::{closest_match, normalize_key};
use super::{Dispatcher, OperationError};

pub const SESSION_TOOL: &str = "session";

/// Operations of the `session` lifecycle tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOperation {
    Open,
    Create,
    Save,
    Close,
    List,
    Status,
}

impl SessionOperation {
    pub const ALL: [Self; 6] =
        [Self::Open, Self::Create, Self::Save, Self::Close, Self::List, Self::Status];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Create => "create",
            Self::Save => "save",
            Self::Close => "close",
            Self::List => "list",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for SessionOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionOperation {
    type Err = OperationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let key = normalize_key(raw);
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == key)
            .ok_or_else(|| OperationError::UnsupportedOperation {
                tool: SESSION_TOOL.to_owned(),
                operation: raw.trim().to_owned(),
                suggestion: closest_match(&key, Self::ALL.map(Self::as_str))
                    .map(str::to_owned),
            })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionRequest {
    pub operation: String,
    pub session_id: Option<String>,
    pub path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
}

impl SessionRequest {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Self::default()
        }
    }

    pub fn in_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(output_path.into());
        self
    }
}

/// Result of a lifecycle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub operation: SessionOperation,
    pub message: String,
    /// The session the call targeted, as it stands after the call.
    pub session: Option<SessionInfo>,
    /// Only filled by `list`.
    pub sessions: Vec<SessionInfo>,
    pub output_path: Option<PathBuf>,
}

impl SessionOutcome {
    fn new(operation: SessionOperation, message: String) -> Self {
        Self {
            operation,
            message,
            session: None,
            sessions: Vec::new(),
            output_path: None,
        }
    }

    fn with_session(mut self, session: SessionInfo) -> Self {
        self.session = Some(session);
        self
    }
}

impl<E: DocumentEngine> Dispatcher<E> {
    pub async fn session(
        &self,
        call: &CallContext,
        request: SessionRequest,
    ) -> Result<SessionOutcome, OperationError> {
        let operation = request.operation.parse::<SessionOperation>()?;
        let identity = self.resolve_identity(call);
        let span = tracing::info_span!(
            "session",
            operation = operation.as_str(),
            identity = %identity,
            session_id = request.session_id.as_deref().unwrap_or(""),
        );
        self.run_session(operation, &identity, request)
            .instrument(span)
            .await
    }

    async fn run_session(
        &self,
        operation: SessionOperation,
        identity: &IdentityKey,
        request: SessionRequest,
    ) -> Result<SessionOutcome, OperationError> {
        let session_id = parse_session_id(request.session_id.as_deref())?;

        if operation == SessionOperation::List {
            let sessions = self.store().list(identity);
            let mut outcome =
                SessionOutcome::new(operation, format!("{} open session(s)", sessions.len()));
            outcome.sessions = sessions;
            return Ok(outcome);
        }

        let Some(session_id) = session_id else {
            return Err(OperationError::validation(format!(
                "sessionId is required for session '{operation}'"
            )));
        };

        match operation {
            SessionOperation::Open => {
                let Some(path) = request.path.as_deref() else {
                    return Err(OperationError::validation("path is required to open a session"));
                };
                self.open_session(identity, &session_id, path).await
            }
            SessionOperation::Create => self.create_session(identity, &session_id).await,
            SessionOperation::Save => {
                self.export_session(identity, &session_id, request.output_path.as_deref())
                    .await
            }
            SessionOperation::Close => {
                let info = self.store().release(identity, &session_id)?;
                let message = if info.dirty {
                    format!("closed session '{session_id}' (unsaved changes discarded)")
                } else {
                    format!("closed session '{session_id}'")
                };
                Ok(SessionOutcome::new(operation, message).with_session(info))
            }
            SessionOperation::Status | SessionOperation::List => {
                let info = self.store().info(identity, &session_id)?;
                let message = format!("session '{session_id}' is open");
                Ok(SessionOutcome::new(operation, message).with_session(info))
            }
        }
    }

    async fn open_session(
        &self,
        identity: &IdentityKey,
        session_id: &SessionId,
        path: &Path,
    ) -> Result<SessionOutcome, OperationError> {
        let engine = self.engine();
        let lease = self
            .store()
            .get_or_create(identity, session_id, Some(path.to_path_buf()), || {
                engine.load(path)
            })
            .await?;
        let message = if lease.created() {
            format!("opened session '{session_id}' from {}", path.display())
        } else {
            format!("session '{session_id}' is already open; path ignored")
        };
        drop(lease);
        let info = self.store().info(identity, session_id)?;
        Ok(SessionOutcome::new(SessionOperation::Open, message).with_session(info))
    }

    async fn create_session(
        &self,
        identity: &IdentityKey,
        session_id: &SessionId,
    ) -> Result<SessionOutcome, OperationError> {
        let engine = self.engine();
        let lease = self
            .store()
            .get_or_create(identity, session_id, None, || Ok(engine.create()))
            .await?;
        if !lease.created() {
            return Err(OperationError::validation(format!(
                "session '{session_id}' already exists"
            )));
        }
        drop(lease);
        let info = self.store().info(identity, session_id)?;
        Ok(SessionOutcome::new(
            SessionOperation::Create,
            format!("created session '{session_id}' with an empty document"),
        )
        .with_session(info))
    }

    /// Writes the session document to `output_path`, or back to where it was opened from.
    async fn export_session(
        &self,
        identity: &IdentityKey,
        session_id: &SessionId,
        output_path: Option<&Path>,
    ) -> Result<SessionOutcome, OperationError> {
        let lease = self.store().acquire(identity, session_id).await?;
        let origin = lease.origin_path();
        let Some(target) = output_path.map(Path::to_path_buf).or_else(|| origin.clone()) else {
            return Err(OperationError::validation(format!(
                "session '{session_id}' has no origin path; outputPath is required"
            )));
        };

        self.engine().save(lease.document(), &target)?;
        match origin {
            None => {
                lease.set_origin_path(target.clone());
                lease.mark_clean();
            }
            Some(origin) if origin == target => lease.mark_clean(),
            Some(_) => {}
        }
        tracing::info!(session_id = %session_id, path = %target.display(), "session exported");

        drop(lease);
        let info = self.store().info(identity, session_id)?;
        let mut outcome = SessionOutcome::new(
            SessionOperation::Save,
            format!("saved session '{session_id}' to {}", target.display()),
        )
        .with_session(info);
        outcome.output_path = Some(target);
        Ok(outcome)
    }
}
