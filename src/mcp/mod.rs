// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Model Context Protocol (MCP) server surface.
//!
//! One MCP tool per tool family plus the `session` lifecycle tool; each call is handed to the
//! operation dispatcher.

mod server;
mod types;

pub use server::DecksmithMcp;
pub use types::{
    CommentParams, SessionParams, SessionResponse, SessionView, SlideParams, TextParams,
};
