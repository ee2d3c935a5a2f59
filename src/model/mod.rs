// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core identifiers and the deck object model.
//!
//! Decks contain slides; slides hold text shapes and review comments.

pub mod deck;
pub mod ids;

pub use deck::{Comment, Deck, Shape, ShapeIdsExhausted, Slide};
pub use ids::{IdError, IdentityKey, SessionId, DEFAULT_IDENTITY};
