// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::Serialize;

use crate::model::{Deck, Shape, Slide};
use crate::ops::{
    HandlerFactory, HandlerRegistry, OperationContext, OperationError, OperationHandler,
    OperationOutput, OperationParameters, RegistryError,
};

use super::{factory, slide_at, slide_not_found};

pub const TOOL: &str = "slide";

pub const TABLE: &[(&str, HandlerFactory<Deck>)] = &[
    ("add", factory::<AddSlide>),
    ("delete", factory::<DeleteSlide>),
    ("duplicate", factory::<DuplicateSlide>),
    ("move", factory::<MoveSlide>),
    ("list", factory::<ListSlides>),
];

pub fn registry() -> Result<HandlerRegistry<Deck>, RegistryError> {
    HandlerRegistry::from_table(TOOL, TABLE)
}

/// Appends an empty slide, or inserts it at `slideIndex`.
#[derive(Default)]
struct AddSlide;

impl OperationHandler<Deck> for AddSlide {
    fn execute(
        &self,
        ctx: &mut OperationContext<'_, Deck>,
        params: &OperationParameters,
    ) -> Result<OperationOutput, OperationError> {
        let count = ctx.document().slides().len();
        let position = params.opt_index("slideIndex")?.unwrap_or(count);
        if position > count {
            return Err(OperationError::not_found(format!(
                "slide position {position} (deck has {count} slide(s))"
            )));
        }

        ctx.document_mut().slides_mut().insert(position, Slide::new());
        ctx.mark_modified();
        Ok(OperationOutput::message(format!("added slide at index {position}")))
    }
}

#[derive(Default)]
struct DeleteSlide;

impl OperationHandler<Deck> for DeleteSlide {
    fn required_params(&self) -> &'static [&'static str] {
        &["slideIndex"]
    }

    fn execute(
        &self,
        ctx: &mut OperationContext<'_, Deck>,
        params: &OperationParameters,
    ) -> Result<OperationOutput, OperationError> {
        let index = params.index("slideIndex")?;
        slide_at(ctx.document(), index)?;

        ctx.document_mut().slides_mut().remove(index);
        ctx.mark_modified();
        Ok(OperationOutput::message(format!("deleted slide {index}")))
    }
}

/// Copies a slide right after the original. Copied shapes get fresh ids.
#[derive(Default)]
struct DuplicateSlide;

impl OperationHandler<Deck> for DuplicateSlide {
    fn required_params(&self) -> &'static [&'static str] {
        &["slideIndex"]
    }

    fn execute(
        &self,
        ctx: &mut OperationContext<'_, Deck>,
        params: &OperationParameters,
    ) -> Result<OperationOutput, OperationError> {
        let index = params.index("slideIndex")?;
        let mut copy = slide_at(ctx.document(), index)?.clone();

        let deck = ctx.document_mut();
        let ids = deck.allocate_shape_ids(copy.shapes().len())?;
        for (shape, id) in copy.shapes_mut().iter_mut().zip(ids) {
            *shape = Shape::new(id, shape.text());
        }
        deck.slides_mut().insert(index + 1, copy);
        ctx.mark_modified();
        Ok(OperationOutput::message(format!("duplicated slide {index} to index {}", index + 1)))
    }
}

#[derive(Default)]
struct MoveSlide;

impl OperationHandler<Deck> for MoveSlide {
    fn required_params(&self) -> &'static [&'static str] {
        &["slideIndex", "toIndex"]
    }

    fn execute(
        &self,
        ctx: &mut OperationContext<'_, Deck>,
        params: &OperationParameters,
    ) -> Result<OperationOutput, OperationError> {
        let from = params.index("slideIndex")?;
        let to = params.index("toIndex")?;
        let count = ctx.document().slides().len();
        for index in [from, to] {
            if index >= count {
                return Err(slide_not_found(index, count));
            }
        }
        if from == to {
            return Ok(OperationOutput::message(format!("slide {from} is already at index {to}")));
        }

        let slides = ctx.document_mut().slides_mut();
        let slide = slides.remove(from);
        slides.insert(to, slide);
        ctx.mark_modified();
        Ok(OperationOutput::message(format!("moved slide {from} to index {to}")))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SlideListing {
    title: Option<String>,
    slide_count: usize,
    slides: Vec<SlideSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<SessionSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SlideSummary {
    index: usize,
    shape_count: usize,
    comment_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    preview: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionSummary {
    session_id: String,
    dirty: bool,
    last_accessed_ms: u64,
}

const PREVIEW_CHARS: usize = 40;

#[derive(Default)]
struct ListSlides;

impl OperationHandler<Deck> for ListSlides {
    fn execute(
        &self,
        ctx: &mut OperationContext<'_, Deck>,
        _params: &OperationParameters,
    ) -> Result<OperationOutput, OperationError> {
        let deck = ctx.document();
        let slides = deck
            .slides()
            .iter()
            .enumerate()
            .map(|(index, slide)| SlideSummary {
                index,
                shape_count: slide.shapes().len(),
                comment_count: slide.comments().len(),
                preview: slide
                    .shapes()
                    .first()
                    .map(|shape| shape.text().chars().take(PREVIEW_CHARS).collect()),
            })
            .collect::<Vec<_>>();
        let session = ctx.session_info().map(|info| SessionSummary {
            session_id: info.session_id.into_string(),
            dirty: info.dirty,
            last_accessed_ms: info.last_accessed_ms,
        });

        OperationOutput::payload(&SlideListing {
            title: deck.title().map(str::to_owned),
            slide_count: slides.len(),
            slides,
            session,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::registry;
    use crate::model::{Deck, Shape, Slide};
    use crate::ops::{ErrorKind, OperationParameters};
    use crate::tools::test_support::{payload, run};

    fn deck_with(texts: &[&str]) -> Deck {
        let mut deck = Deck::new();
        for text in texts {
            let id = deck.allocate_shape_id().expect("shape id");
            let mut slide = Slide::new();
            slide.shapes_mut().push(Shape::new(id, *text));
            deck.slides_mut().push(slide);
        }
        deck
    }

    fn first_texts(deck: &Deck) -> Vec<&str> {
        deck.slides().iter().map(|slide| slide.shapes()[0].text()).collect()
    }

    #[test]
    fn add_appends_or_inserts() {
        let registry = registry().expect("registry");
        let mut deck = deck_with(&["a", "b"]);

        let (result, modified) = run(&registry, &mut deck, "add", OperationParameters::new());
        result.expect("append");
        assert!(modified);
        assert_eq!(deck.slides().len(), 3);
        assert!(deck.slides()[2].shapes().is_empty());

        let params = OperationParameters::new().with("slideIndex", 0_i64);
        run(&registry, &mut deck, "add", params).0.expect("insert");
        assert!(deck.slides()[0].shapes().is_empty());
        assert_eq!(deck.slides()[1].shapes()[0].text(), "a");
    }

    #[test]
    fn duplicate_reissues_shape_ids() {
        let registry = registry().expect("registry");
        let mut deck = deck_with(&["a", "b"]);

        let params = OperationParameters::new().with("slideIndex", 0_i64);
        run(&registry, &mut deck, "duplicate", params).0.expect("duplicate");

        assert_eq!(first_texts(&deck), vec!["a", "a", "b"]);
        let original = deck.slides()[0].shapes()[0].shape_id();
        let copy = deck.slides()[1].shapes()[0].shape_id();
        assert_ne!(original, copy);
    }

    #[test]
    fn move_reorders_and_same_position_is_not_a_mutation() {
        let registry = registry().expect("registry");
        let mut deck = deck_with(&["a", "b", "c"]);

        let params = OperationParameters::new().with("slideIndex", 0_i64).with("toIndex", 2_i64);
        let (result, modified) = run(&registry, &mut deck, "MOVE", params);
        result.expect("move");
        assert!(modified);
        assert_eq!(first_texts(&deck), vec!["b", "c", "a"]);

        let params = OperationParameters::new().with("slideIndex", 1_i64).with("toIndex", 1_i64);
        let (result, modified) = run(&registry, &mut deck, "move", params);
        result.expect("noop move");
        assert!(!modified);
    }

    #[rstest]
    #[case::delete("delete", OperationParameters::new().with("slideIndex", 5_i64))]
    #[case::duplicate("duplicate", OperationParameters::new().with("slideIndex", 2_i64))]
    #[case::move_target(
        "move",
        OperationParameters::new().with("slideIndex", 0_i64).with("toIndex", 9_i64)
    )]
    #[case::insert_past_end("add", OperationParameters::new().with("slideIndex", 3_i64))]
    fn out_of_range_index_is_not_found_and_leaves_deck_alone(
        #[case] operation: &str,
        #[case] params: OperationParameters,
    ) {
        let registry = registry().expect("registry");
        let mut deck = deck_with(&["a", "b"]);
        let before = deck.clone();

        let (result, modified) = run(&registry, &mut deck, operation, params);
        let Err(err) = result else {
            panic!("expected not found");
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!modified);
        assert_eq!(deck, before);
    }

    #[test]
    fn list_is_a_query() {
        let registry = registry().expect("registry");
        let mut deck = deck_with(&["hello", "world"]);

        let (result, modified) = run(&registry, &mut deck, "list", OperationParameters::new());
        assert!(!modified);
        let data = payload(result.expect("list"));
        assert_eq!(data["slideCount"], 2);
        assert_eq!(data["slides"][1]["preview"], "world");
        assert!(data.get("session").is_none());
    }
}
