// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Identity-scoped, in-memory document sessions.
//!
//! Sessions are keyed by (identity, session id) so a session id is never enough on its own to
//! reach another caller's document.

pub mod identity;
pub mod session_store;

pub use identity::{
    CallContext, HeaderIdentity, IdentityAccessor, StaticIdentity, DEFAULT_IDENTITY_HEADER,
};
pub use session_store::{SessionInfo, SessionLease, SessionStore, StoreError};
