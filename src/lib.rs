// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Decksmith: deck editing tools over MCP, with identity-scoped in-memory sessions.
//!
//! Tool families (`slide`, `text`, `comment`) are tables of operation handlers. The
//! [`ops::Dispatcher`] runs one call: resolve the handler, acquire the document from a file or a
//! session, execute, and persist only when the handler changed something.

pub mod config;
pub mod format;
pub mod mcp;
pub mod model;
pub mod ops;
pub mod store;
pub mod tools;
