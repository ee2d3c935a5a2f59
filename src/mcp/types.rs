// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::store::SessionInfo;

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlideParams {
    /// One of: add, delete, duplicate, move, list.
    pub operation: String,
    /// Deck file for a one-off call (ignored when the session already exists).
    pub path: Option<String>,
    pub session_id: Option<String>,
    /// Where to write the result instead of the source file.
    pub output_path: Option<String>,
    pub slide_index: Option<i64>,
    pub to_index: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextParams {
    /// One of: add, get, edit, replace, delete.
    pub operation: String,
    pub path: Option<String>,
    pub session_id: Option<String>,
    pub output_path: Option<String>,
    pub slide_index: Option<i64>,
    pub shape_index: Option<i64>,
    pub text: Option<String>,
    pub find: Option<String>,
    pub replace_with: Option<String>,
    /// Treat `find` as a regular expression.
    pub regex: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentParams {
    /// One of: add, list, delete.
    pub operation: String,
    pub path: Option<String>,
    pub session_id: Option<String>,
    pub output_path: Option<String>,
    pub slide_index: Option<i64>,
    pub comment_index: Option<i64>,
    pub text: Option<String>,
    /// Defaults to the caller identity.
    pub author: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionParams {
    /// One of: open, create, save, close, list, status.
    pub operation: String,
    pub session_id: Option<String>,
    /// Deck file to open (`open` only).
    pub path: Option<String>,
    /// Export target for `save`; defaults to the path the session was opened from.
    pub output_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub created_at_ms: u64,
    pub last_accessed_ms: u64,
    pub origin_path: Option<String>,
    /// Holds changes not yet written to `originPath`.
    pub dirty: bool,
    pub busy: bool,
}

impl From<SessionInfo> for SessionView {
    fn from(info: SessionInfo) -> Self {
        Self {
            session_id: info.session_id.into_string(),
            created_at_ms: info.created_at_ms,
            last_accessed_ms: info.last_accessed_ms,
            origin_path: info.origin_path.map(|path| path.display().to_string()),
            dirty: info.dirty,
            busy: info.busy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub operation: String,
    pub message: String,
    pub session: Option<SessionView>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sessions: Vec<SessionView>,
    pub output_path: Option<String>,
}
