// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Operation dispatch for tool families.
//!
//! A call names an operation, a document (file path or session id) and typed parameters. The
//! [`Dispatcher`] resolves the handler, acquires the document, runs the handler and persists
//! only when the handler reports a mutation.

mod dispatcher;
mod document;
mod error;
mod finalize;
mod handler;
mod lifecycle;
mod params;
mod registry;

pub use dispatcher::{Dispatcher, OperationRequest};
pub use document::DocumentContext;
pub use error::{ErrorKind, OperationError};
pub use finalize::{finalize, CallSummary, OperationResponse};
pub use handler::{OperationContext, OperationHandler, OperationOutput};
pub use lifecycle::{SessionOperation, SessionOutcome, SessionRequest, SESSION_TOOL};
pub use params::{OperationParameters, ParamValue};
pub use registry::{HandlerFactory, HandlerRegistry, RegistryError};
