// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::SessionId;

use super::OperationOutput;

/// Uniform response for every tool-family call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    pub tool: String,
    pub operation: String,
    pub result: OperationOutput,
    /// Whether the handler changed the document.
    pub modified: bool,
    /// Path written by this call, if it persisted anything.
    pub output_path: Option<String>,
    pub session_id: Option<String>,
    /// True when the document stays open in a session after this call.
    pub session_open: bool,
}

/// Call metadata collected by the dispatcher for the finalizer.
#[derive(Debug, Clone, Default)]
pub struct CallSummary {
    pub modified: bool,
    pub output_path: Option<PathBuf>,
    pub session_id: Option<SessionId>,
}

pub fn finalize(
    tool: &str,
    operation: &str,
    output: OperationOutput,
    summary: CallSummary,
) -> OperationResponse {
    let session_open = summary.session_id.is_some();
    OperationResponse {
        tool: tool.to_owned(),
        operation: operation.trim().to_ascii_lowercase(),
        result: output,
        modified: summary.modified,
        output_path: summary.output_path.map(|path| path.display().to_string()),
        session_id: summary.session_id.map(SessionId::into_string),
        session_open,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{finalize, CallSummary};
    use crate::model::SessionId;
    use crate::ops::OperationOutput;

    #[test]
    fn file_mode_response_reports_written_path() {
        let response = finalize(
            "text",
            " ADD ",
            OperationOutput::message("added"),
            CallSummary {
                modified: true,
                output_path: Some(PathBuf::from("a.pptx")),
                session_id: None,
            },
        );
        assert_eq!(response.operation, "add");
        assert_eq!(response.output_path.as_deref(), Some("a.pptx"));
        assert!(!response.session_open);
    }

    #[test]
    fn session_mode_response_keeps_session_open_and_serializes_tagged_result() {
        let response = finalize(
            "text",
            "get",
            OperationOutput::Payload {
                data: serde_json::json!({ "count": 1 }),
            },
            CallSummary {
                modified: false,
                output_path: None,
                session_id: Some(SessionId::new("S1").expect("session id")),
            },
        );
        assert!(response.session_open);

        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["sessionId"], "S1");
        assert_eq!(json["result"]["kind"], "payload");
        assert_eq!(json["result"]["data"]["count"], 1);
        assert_eq!(json["outputPath"], serde_json::Value::Null);
    }
}
