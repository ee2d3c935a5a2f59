// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::request::Parts;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::service::RequestContext;
use rmcp::{tool, tool_handler, tool_router, ErrorData, RoleServer, ServerHandler, ServiceExt};

use crate::config::{ServerConfig, Transport};
use crate::format::JsonDeckEngine;
use crate::model::Deck;
use crate::ops::{
    Dispatcher, ErrorKind, HandlerRegistry, OperationError, OperationParameters, OperationRequest,
    OperationResponse, RegistryError, SessionOutcome, SessionRequest,
};
use crate::store::{CallContext, HeaderIdentity, IdentityAccessor, SessionStore, StaticIdentity};
use crate::tools::ToolRegistries;

use super::types::*;

#[derive(Clone)]
pub struct DecksmithMcp {
    dispatcher: Arc<Dispatcher<JsonDeckEngine>>,
    tools: Arc<ToolRegistries>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl DecksmithMcp {
    pub fn new(dispatcher: Arc<Dispatcher<JsonDeckEngine>>, tools: Arc<ToolRegistries>) -> Self {
        Self {
            dispatcher,
            tools,
            tool_router: Self::tool_router(),
        }
    }

    /// Wires engine, session store and identity resolution for the configured transport.
    ///
    /// Stdio serves a single caller, so every call shares the anonymous identity; HTTP callers
    /// are told apart by the identity header.
    pub fn from_config(config: &ServerConfig) -> Result<Self, RegistryError> {
        let engine = Arc::new(JsonDeckEngine::new().with_durability(config.durability));
        let store = Arc::new(SessionStore::new(config.session.clone()));
        let identity: Arc<dyn IdentityAccessor> = match config.transport {
            Transport::Stdio => Arc::new(StaticIdentity::default()),
            Transport::StreamableHttp => Arc::new(
                config
                    .identity_header
                    .clone()
                    .map(HeaderIdentity::new)
                    .unwrap_or_default(),
            ),
        };
        let dispatcher = Arc::new(Dispatcher::new(engine, store, identity));
        Ok(Self::new(dispatcher, Arc::new(ToolRegistries::new()?)))
    }

    pub fn store(&self) -> &Arc<SessionStore<Deck>> {
        self.dispatcher.store()
    }

    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        service.waiting().await?;
        Ok(())
    }

    /// Slide structure of a deck. Operations: add, delete, duplicate, move, list.
    /// Pass `path` for a one-off call or `sessionId` to work on an open session.
    #[tool(name = "slide")]
    async fn slide(
        &self,
        params: Parameters<SlideParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<Json<OperationResponse>, ErrorData> {
        self.run_slide(params.0, &call_context(&context)).await.map(Json)
    }

    /// Text shapes on slides. Operations: add, get, edit, replace, delete.
    /// `add` appends to the first slide unless `slideIndex` is given.
    /// `replace` works deck-wide unless `slideIndex` is given; set `regex` for patterns.
    #[tool(name = "text")]
    async fn text(
        &self,
        params: Parameters<TextParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<Json<OperationResponse>, ErrorData> {
        self.run_text(params.0, &call_context(&context)).await.map(Json)
    }

    /// Review comments on slides. Operations: add, list, delete.
    #[tool(name = "comment")]
    async fn comment(
        &self,
        params: Parameters<CommentParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<Json<OperationResponse>, ErrorData> {
        self.run_comment(params.0, &call_context(&context)).await.map(Json)
    }

    /// In-memory editing sessions. Operations: open, create, save, close, list, status.
    /// Changes made in a session stay in memory until `save` (or a call with `outputPath`).
    #[tool(name = "session")]
    async fn session(
        &self,
        params: Parameters<SessionParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<Json<SessionResponse>, ErrorData> {
        self.run_session(params.0, &call_context(&context)).await.map(Json)
    }

    async fn run_slide(
        &self,
        params: SlideParams,
        call: &CallContext,
    ) -> Result<OperationResponse, ErrorData> {
        let SlideParams {
            operation,
            path,
            session_id,
            output_path,
            slide_index,
            to_index,
        } = params;
        let mut extra = OperationParameters::new();
        extra.insert_opt("slideIndex", slide_index);
        extra.insert_opt("toIndex", to_index);

        let request = operation_request(operation, path, session_id, output_path, extra);
        self.dispatch(&self.tools.slide, call, request).await
    }

    async fn run_text(
        &self,
        params: TextParams,
        call: &CallContext,
    ) -> Result<OperationResponse, ErrorData> {
        let TextParams {
            operation,
            path,
            session_id,
            output_path,
            slide_index,
            shape_index,
            text,
            find,
            replace_with,
            regex,
        } = params;
        let mut extra = OperationParameters::new();
        extra.insert_opt("slideIndex", slide_index);
        extra.insert_opt("shapeIndex", shape_index);
        extra.insert_opt("text", text);
        extra.insert_opt("find", find);
        extra.insert_opt("replaceWith", replace_with);
        extra.insert_opt("regex", regex);

        let request = operation_request(operation, path, session_id, output_path, extra);
        self.dispatch(&self.tools.text, call, request).await
    }

    async fn run_comment(
        &self,
        params: CommentParams,
        call: &CallContext,
    ) -> Result<OperationResponse, ErrorData> {
        let CommentParams {
            operation,
            path,
            session_id,
            output_path,
            slide_index,
            comment_index,
            text,
            author,
        } = params;
        let mut extra = OperationParameters::new();
        extra.insert_opt("slideIndex", slide_index);
        extra.insert_opt("commentIndex", comment_index);
        extra.insert_opt("text", text);
        extra.insert_opt("author", author);

        let request = operation_request(operation, path, session_id, output_path, extra);
        self.dispatch(&self.tools.comment, call, request).await
    }

    async fn run_session(
        &self,
        params: SessionParams,
        call: &CallContext,
    ) -> Result<SessionResponse, ErrorData> {
        let SessionParams { operation, session_id, path, output_path } = params;
        let request = SessionRequest {
            operation,
            session_id,
            path: path.map(PathBuf::from),
            output_path: output_path.map(PathBuf::from),
        };
        let outcome = self.dispatcher.session(call, request).await.map_err(to_error_data)?;
        Ok(session_response(outcome))
    }

    async fn dispatch(
        &self,
        registry: &HandlerRegistry<Deck>,
        call: &CallContext,
        request: OperationRequest,
    ) -> Result<OperationResponse, ErrorData> {
        self.dispatcher.dispatch(registry, call, request).await.map_err(to_error_data)
    }
}

#[tool_handler]
impl ServerHandler for DecksmithMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Decksmith deck editing server (tools: slide, text, comment, session). Every tool takes an `operation`; pass `path` for one-off edits or open a session with `session` and pass `sessionId`."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Request headers when the call arrived over streamable HTTP.
fn call_context(context: &RequestContext<RoleServer>) -> CallContext {
    context
        .extensions
        .get::<Parts>()
        .map(|parts| CallContext::with_headers(parts.headers.clone()))
        .unwrap_or_default()
}

fn operation_request(
    operation: String,
    path: Option<String>,
    session_id: Option<String>,
    output_path: Option<String>,
    params: OperationParameters,
) -> OperationRequest {
    OperationRequest {
        operation,
        path: path.map(PathBuf::from),
        session_id,
        output_path: output_path.map(PathBuf::from),
        params,
    }
}

fn session_response(outcome: SessionOutcome) -> SessionResponse {
    SessionResponse {
        operation: outcome.operation.as_str().to_owned(),
        message: outcome.message,
        session: outcome.session.map(SessionView::from),
        sessions: outcome.sessions.into_iter().map(SessionView::from).collect(),
        output_path: outcome.output_path.map(|path| path.display().to_string()),
    }
}

fn to_error_data(err: OperationError) -> ErrorData {
    let kind = err.kind();
    let data = Some(serde_json::json!({ "kind": kind.as_str() }));
    let message = err.to_string();
    match kind {
        ErrorKind::Validation | ErrorKind::UnsupportedOperation => {
            ErrorData::invalid_params(message, data)
        }
        ErrorKind::NotFound => ErrorData::resource_not_found(message, data),
        ErrorKind::Io | ErrorKind::Concurrency => ErrorData::internal_error(message, data),
    }
}
