// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Deck tool families and their handler tables.
//!
//! Each family is a const table of `(operation, factory)` pairs; [`ToolRegistries`] builds them
//! once at startup.

use std::sync::Arc;

use crate::model::{Deck, Slide};
use crate::ops::{HandlerRegistry, OperationError, OperationHandler, RegistryError};

pub mod comment;
pub mod slide;
pub mod text;

/// The handler registries of every deck tool family.
#[derive(Debug)]
pub struct ToolRegistries {
    pub slide: HandlerRegistry<Deck>,
    pub text: HandlerRegistry<Deck>,
    pub comment: HandlerRegistry<Deck>,
}

impl ToolRegistries {
    pub fn new() -> Result<Self, RegistryError> {
        Ok(Self {
            slide: slide::registry()?,
            text: text::registry()?,
            comment: comment::registry()?,
        })
    }

    pub fn families(&self) -> [&HandlerRegistry<Deck>; 3] {
        [&self.slide, &self.text, &self.comment]
    }
}

fn factory<H>() -> Arc<dyn OperationHandler<Deck>>
where
    H: OperationHandler<Deck> + Default + 'static,
{
    Arc::new(H::default())
}

pub(crate) fn slide_at(deck: &Deck, index: usize) -> Result<&Slide, OperationError> {
    deck.slide(index).ok_or_else(|| slide_not_found(index, deck.slides().len()))
}

pub(crate) fn slide_at_mut(deck: &mut Deck, index: usize) -> Result<&mut Slide, OperationError> {
    let count = deck.slides().len();
    deck.slide_mut(index).ok_or_else(|| slide_not_found(index, count))
}

pub(crate) fn slide_not_found(index: usize, count: usize) -> OperationError {
    OperationError::not_found(format!("slide {index} (deck has {count} slide(s))"))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use crate::config::SessionConfig;
    use crate::model::{Deck, IdentityKey};
    use crate::ops::{
        HandlerRegistry, OperationContext, OperationError, OperationOutput, OperationParameters,
    };
    use crate::store::SessionStore;

    /// Runs one operation directly against `deck`, outside any dispatcher.
    pub(crate) fn run(
        registry: &HandlerRegistry<Deck>,
        deck: &mut Deck,
        operation: &str,
        params: OperationParameters,
    ) -> (Result<OperationOutput, OperationError>, bool) {
        let store = SessionStore::new(SessionConfig::default());
        let identity = IdentityKey::anonymous();
        let handler = match registry.get_handler(operation) {
            Ok(handler) => handler,
            Err(err) => return (Err(err), false),
        };
        let mut ctx = OperationContext::new(
            deck,
            &store,
            &identity,
            None,
            Some(Path::new("deck.json")),
            None,
        );
        let result = handler.execute(&mut ctx, &params);
        (result, ctx.is_modified())
    }

    pub(crate) fn payload(output: OperationOutput) -> serde_json::Value {
        match output {
            OperationOutput::Payload { data } => data,
            OperationOutput::Message { message } => {
                panic!("expected payload, got message {message:?}")
            }
        }
    }
}
