// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use axum::http::{HeaderMap, HeaderName};

use crate::model::IdentityKey;

pub const DEFAULT_IDENTITY_HEADER: &str = "x-decksmith-identity";

/// Ambient information about the transport-level call.
///
/// Stdio calls carry nothing; streamable HTTP calls carry the request headers.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    headers: Option<HeaderMap>,
}

impl CallContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_headers(headers: HeaderMap) -> Self {
        Self {
            headers: Some(headers),
        }
    }

    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.as_ref()?.get(name)?.to_str().ok()
    }
}

/// Resolves the identity that namespaces sessions for a call.
pub trait IdentityAccessor: Send + Sync {
    fn resolve(&self, call: &CallContext) -> IdentityKey;
}

/// Every call resolves to the same key.
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    key: IdentityKey,
}

impl StaticIdentity {
    pub fn new(key: IdentityKey) -> Self {
        Self { key }
    }
}

impl Default for StaticIdentity {
    fn default() -> Self {
        Self::new(IdentityKey::anonymous())
    }
}

impl IdentityAccessor for StaticIdentity {
    fn resolve(&self, _call: &CallContext) -> IdentityKey {
        self.key.clone()
    }
}

/// Reads the identity from a request header, falling back to the anonymous key when the
/// header is missing or not a valid id.
#[derive(Debug, Clone)]
pub struct HeaderIdentity {
    header: HeaderName,
}

impl HeaderIdentity {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl Default for HeaderIdentity {
    fn default() -> Self {
        Self::new(HeaderName::from_static(DEFAULT_IDENTITY_HEADER))
    }
}

impl IdentityAccessor for HeaderIdentity {
    fn resolve(&self, call: &CallContext) -> IdentityKey {
        let Some(raw) = call.header(&self.header) else {
            return IdentityKey::anonymous();
        };
        match IdentityKey::new(raw.trim().to_owned()) {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!(
                    header = %self.header,
                    error = %err,
                    "ignoring invalid identity header"
                );
                IdentityKey::anonymous()
            }
        }
    }
}
