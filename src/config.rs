// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Runtime configuration shared by the binary and tests.

use std::time::Duration;

use axum::http::HeaderName;

use crate::format::WriteDurability;

pub const DEFAULT_MCP_HTTP_PORT: u16 = 27436;

/// Limits applied to identity-scoped in-memory sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Sessions untouched for this long are evicted by the sweeper.
    pub idle_timeout: Duration,
    /// Upper bound on open sessions across all identities.
    pub max_sessions: usize,
    /// Upper bound on open sessions owned by a single identity.
    pub max_sessions_per_identity: usize,
    /// How often the sweeper looks for idle sessions.
    pub sweep_interval: Duration,
    /// How long a call waits for another call on the same session to finish.
    pub lock_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(30 * 60),
            max_sessions: 64,
            max_sessions_per_identity: 16,
            sweep_interval: Duration::from_secs(60),
            lock_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    #[default]
    StreamableHttp,
    Stdio,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub transport: Transport,
    /// Port for streamable HTTP (0 = ephemeral).
    pub port: u16,
    pub durability: WriteDurability,
    /// Header carrying the caller identity in HTTP mode; `None` uses the default header.
    pub identity_header: Option<HeaderName>,
    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            port: DEFAULT_MCP_HTTP_PORT,
            durability: WriteDurability::default(),
            identity_header: None,
            session: SessionConfig::default(),
        }
    }
}
