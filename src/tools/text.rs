// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use regex::Regex;
use serde::Serialize;

use crate::model::{Deck, Shape, Slide};
use crate::ops::{
    HandlerFactory, HandlerRegistry, OperationContext, OperationError, OperationHandler,
    OperationOutput, OperationParameters, RegistryError,
};

use super::{factory, slide_at, slide_at_mut};

pub const TOOL: &str = "text";

pub const TABLE: &[(&str, HandlerFactory<Deck>)] = &[
    ("add", factory::<AddText>),
    ("get", factory::<GetText>),
    ("edit", factory::<EditText>),
    ("replace", factory::<ReplaceText>),
    ("delete", factory::<DeleteText>),
];

pub fn registry() -> Result<HandlerRegistry<Deck>, RegistryError> {
    HandlerRegistry::from_table(TOOL, TABLE)
}

fn shape_not_found(slide_index: usize, shape_index: usize, slide: &Slide) -> OperationError {
    OperationError::not_found(format!(
        "shape {shape_index} on slide {slide_index} (slide has {} shape(s))",
        slide.shapes().len()
    ))
}

fn checked_shape(
    deck: &Deck,
    slide_index: usize,
    shape_index: usize,
) -> Result<&Shape, OperationError> {
    let slide = slide_at(deck, slide_index)?;
    slide.shapes().get(shape_index).ok_or_else(|| shape_not_found(slide_index, shape_index, slide))
}

/// Appends a text shape to `slideIndex`, or to the first slide when no index is given.
#[derive(Default)]
struct AddText;

impl OperationHandler<Deck> for AddText {
    fn required_params(&self) -> &'static [&'static str] {
        &["text"]
    }

    fn execute(
        &self,
        ctx: &mut OperationContext<'_, Deck>,
        params: &OperationParameters,
    ) -> Result<OperationOutput, OperationError> {
        let slide_index = params.opt_index("slideIndex")?.unwrap_or(0);
        let text = params.text("text")?;
        slide_at(ctx.document(), slide_index)?;

        let deck = ctx.document_mut();
        let shape_id = deck.allocate_shape_id()?;
        slide_at_mut(deck, slide_index)?.shapes_mut().push(Shape::new(shape_id, text));
        ctx.mark_modified();
        Ok(OperationOutput::message(format!("added text shape {shape_id} to slide {slide_index}")))
    }
}

#[derive(Debug, Serialize)]
struct TextListing {
    slides: Vec<SlideText>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SlideText {
    slide_index: usize,
    shapes: Vec<ShapeText>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShapeText {
    shape_index: usize,
    shape_id: u64,
    text: String,
}

fn slide_text(slide_index: usize, slide: &Slide) -> SlideText {
    SlideText {
        slide_index,
        shapes: slide
            .shapes()
            .iter()
            .enumerate()
            .map(|(shape_index, shape)| ShapeText {
                shape_index,
                shape_id: shape.shape_id(),
                text: shape.text().to_owned(),
            })
            .collect(),
    }
}

/// Text of every shape, or only of the shapes on `slideIndex`.
#[derive(Default)]
struct GetText;

impl OperationHandler<Deck> for GetText {
    fn execute(
        &self,
        ctx: &mut OperationContext<'_, Deck>,
        params: &OperationParameters,
    ) -> Result<OperationOutput, OperationError> {
        let deck = ctx.document();
        let slides = match params.opt_index("slideIndex")? {
            Some(index) => vec![slide_text(index, slide_at(deck, index)?)],
            None => deck
                .slides()
                .iter()
                .enumerate()
                .map(|(i, slide)| slide_text(i, slide))
                .collect(),
        };
        OperationOutput::payload(&TextListing { slides })
    }
}

#[derive(Default)]
struct EditText;

impl OperationHandler<Deck> for EditText {
    fn required_params(&self) -> &'static [&'static str] {
        &["slideIndex", "shapeIndex", "text"]
    }

    fn execute(
        &self,
        ctx: &mut OperationContext<'_, Deck>,
        params: &OperationParameters,
    ) -> Result<OperationOutput, OperationError> {
        let slide_index = params.index("slideIndex")?;
        let shape_index = params.index("shapeIndex")?;
        let text = params.text("text")?;
        if checked_shape(ctx.document(), slide_index, shape_index)?.text() == text {
            return Ok(OperationOutput::message("text unchanged"));
        }

        let slide = slide_at_mut(ctx.document_mut(), slide_index)?;
        if let Some(shape) = slide.shapes_mut().get_mut(shape_index) {
            shape.set_text(text);
        }
        ctx.mark_modified();
        Ok(OperationOutput::message(format!(
            "updated shape {shape_index} on slide {slide_index}"
        )))
    }
}

enum Matcher {
    Literal(String),
    Pattern(Regex),
}

impl Matcher {
    fn new(find: &str, regex: bool) -> Result<Self, OperationError> {
        if find.is_empty() {
            return Err(OperationError::validation("find must not be empty"));
        }
        if !regex {
            return Ok(Self::Literal(find.to_owned()));
        }
        Regex::new(find)
            .map(Self::Pattern)
            .map_err(|err| OperationError::validation(format!("invalid regex: {err}")))
    }

    /// Replacement text and number of matches, or `None` when nothing matches.
    fn apply(&self, text: &str, replace_with: &str) -> Option<(String, usize)> {
        let count = match self {
            Self::Literal(find) => text.matches(find.as_str()).count(),
            Self::Pattern(re) => re.find_iter(text).count(),
        };
        if count == 0 {
            return None;
        }
        let replaced = match self {
            Self::Literal(find) => text.replace(find.as_str(), replace_with),
            Self::Pattern(re) => re.replace_all(text, replace_with).into_owned(),
        };
        Some((replaced, count))
    }
}

/// Find/replace across the deck (or one slide). `regex: true` treats `find` as a pattern and
/// allows `$1`-style group references in `replaceWith`.
#[derive(Default)]
struct ReplaceText;

impl OperationHandler<Deck> for ReplaceText {
    fn required_params(&self) -> &'static [&'static str] {
        &["find", "replaceWith"]
    }

    fn execute(
        &self,
        ctx: &mut OperationContext<'_, Deck>,
        params: &OperationParameters,
    ) -> Result<OperationOutput, OperationError> {
        let regex = params.opt_flag("regex")?.unwrap_or(false);
        let matcher = Matcher::new(params.text("find")?, regex)?;
        let replace_with = params.text("replaceWith")?;
        let scope = params.opt_index("slideIndex")?;
        if let Some(index) = scope {
            slide_at(ctx.document(), index)?;
        }

        let mut replacements = 0;
        let mut shapes_changed = 0;
        for (index, slide) in ctx.document_mut().slides_mut().iter_mut().enumerate() {
            if scope.is_some_and(|scope| scope != index) {
                continue;
            }
            for shape in slide.shapes_mut() {
                if let Some((text, count)) = matcher.apply(shape.text(), replace_with) {
                    shape.set_text(text);
                    replacements += count;
                    shapes_changed += 1;
                }
            }
        }

        if replacements > 0 {
            ctx.mark_modified();
        }
        OperationOutput::payload(&serde_json::json!({
            "replacements": replacements,
            "shapesChanged": shapes_changed,
        }))
    }
}

#[derive(Default)]
struct DeleteText;

impl OperationHandler<Deck> for DeleteText {
    fn required_params(&self) -> &'static [&'static str] {
        &["slideIndex", "shapeIndex"]
    }

    fn execute(
        &self,
        ctx: &mut OperationContext<'_, Deck>,
        params: &OperationParameters,
    ) -> Result<OperationOutput, OperationError> {
        let slide_index = params.index("slideIndex")?;
        let shape_index = params.index("shapeIndex")?;
        checked_shape(ctx.document(), slide_index, shape_index)?;

        slide_at_mut(ctx.document_mut(), slide_index)?.shapes_mut().remove(shape_index);
        ctx.mark_modified();
        Ok(OperationOutput::message(format!(
            "deleted shape {shape_index} from slide {slide_index}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::registry;
    use crate::model::{Deck, Shape, Slide};
    use crate::ops::{ErrorKind, OperationParameters};
    use crate::tools::test_support::{payload, run};

    fn sample_deck() -> Deck {
        let mut deck = Deck::new();
        for texts in [&["Hello world", "world peace"][..], &["Goodbye world"][..]] {
            let mut slide = Slide::new();
            for text in texts {
                let id = deck.allocate_shape_id().expect("shape id");
                slide.shapes_mut().push(Shape::new(id, *text));
            }
            deck.slides_mut().push(slide);
        }
        deck
    }

    #[test]
    fn add_then_get_reflects_new_shape() {
        let registry = registry().expect("registry");
        let mut deck = sample_deck();

        let params = OperationParameters::new().with("slideIndex", 1_i64).with("text", "Hi");
        let (result, modified) = run(&registry, &mut deck, "add", params);
        result.expect("add");
        assert!(modified);
        assert_eq!(deck.shape_count(), 4);

        let params = OperationParameters::new().with("slideIndex", 1_i64);
        let (result, modified) = run(&registry, &mut deck, "get", params);
        assert!(!modified);
        let data = payload(result.expect("get"));
        assert_eq!(data["slides"][0]["shapes"][1]["text"], "Hi");
    }

    #[test]
    fn add_defaults_to_first_slide() {
        let registry = registry().expect("registry");
        let mut deck = sample_deck();

        let params = OperationParameters::new().with("text", "Hi");
        let (result, modified) = run(&registry, &mut deck, "add", params);
        result.expect("add");
        assert!(modified);
        assert_eq!(deck.slides()[0].shapes().len(), 3);
        assert_eq!(deck.slides()[0].shapes()[2].text(), "Hi");

        let mut empty = Deck::new();
        let params = OperationParameters::new().with("text", "Hi");
        let (result, modified) = run(&registry, &mut empty, "add", params);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::NotFound);
        assert!(!modified);
    }

    #[test]
    fn edit_with_same_text_is_not_a_mutation() {
        let registry = registry().expect("registry");
        let mut deck = sample_deck();

        let params = OperationParameters::new()
            .with("slideIndex", 0_i64)
            .with("shapeIndex", 0_i64)
            .with("text", "Hello world");
        let (result, modified) = run(&registry, &mut deck, "edit", params);
        result.expect("edit");
        assert!(!modified);

        let params = OperationParameters::new()
            .with("slideIndex", 0_i64)
            .with("shapeIndex", 0_i64)
            .with("text", "Hello there");
        let (result, modified) = run(&registry, &mut deck, "edit", params);
        result.expect("edit");
        assert!(modified);
        assert_eq!(deck.slides()[0].shapes()[0].text(), "Hello there");
    }

    #[rstest]
    #[case::literal(false, "world", "earth", 3, "Hello earth")]
    #[case::regex(true, r"(\w+) world", "$1 planet", 2, "Hello planet")]
    #[case::no_match(false, "mars", "venus", 0, "Hello world")]
    fn replace_counts_matches_and_only_mutates_on_hit(
        #[case] regex: bool,
        #[case] find: &str,
        #[case] replace_with: &str,
        #[case] expected: u64,
        #[case] first_text: &str,
    ) {
        let registry = registry().expect("registry");
        let mut deck = sample_deck();

        let params = OperationParameters::new()
            .with("find", find)
            .with("replaceWith", replace_with)
            .with("regex", regex);
        let (result, modified) = run(&registry, &mut deck, "replace", params);
        let data = payload(result.expect("replace"));

        assert_eq!(data["replacements"], expected);
        assert_eq!(modified, expected > 0);
        assert_eq!(deck.slides()[0].shapes()[0].text(), first_text);
    }

    #[test]
    fn replace_scoped_to_one_slide() {
        let registry = registry().expect("registry");
        let mut deck = sample_deck();

        let params = OperationParameters::new()
            .with("find", "world")
            .with("replaceWith", "moon")
            .with("slideIndex", 1_i64);
        run(&registry, &mut deck, "replace", params).0.expect("replace");

        assert_eq!(deck.slides()[0].shapes()[0].text(), "Hello world");
        assert_eq!(deck.slides()[1].shapes()[0].text(), "Goodbye moon");
    }

    #[rstest]
    #[case::bad_regex(
        OperationParameters::new()
            .with("find", "(")
            .with("replaceWith", "x")
            .with("regex", true)
    )]
    #[case::empty_find(OperationParameters::new().with("find", "").with("replaceWith", "x"))]
    fn replace_rejects_bad_patterns(#[case] params: OperationParameters) {
        let registry = registry().expect("registry");
        let mut deck = sample_deck();
        let before = deck.clone();

        let (result, modified) = run(&registry, &mut deck, "replace", params);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Validation);
        assert!(!modified);
        assert_eq!(deck, before);
    }

    #[test]
    fn delete_out_of_range_shape_is_not_found() {
        let registry = registry().expect("registry");
        let mut deck = sample_deck();

        let params = OperationParameters::new().with("slideIndex", 1_i64).with("shapeIndex", 3_i64);
        let (result, modified) = run(&registry, &mut deck, "delete", params);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "shape 3 on slide 1 (slide has 1 shape(s)) not found");
        assert!(!modified);

        let params = OperationParameters::new().with("slideIndex", 1_i64).with("shapeIndex", 0_i64);
        run(&registry, &mut deck, "delete", params).0.expect("delete");
        assert!(deck.slides()[1].shapes().is_empty());
    }
}
