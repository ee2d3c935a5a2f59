// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::Serialize;

use crate::model::{Comment, Deck};
use crate::ops::{
    HandlerFactory, HandlerRegistry, OperationContext, OperationError, OperationHandler,
    OperationOutput, OperationParameters, RegistryError,
};

use super::{factory, slide_at, slide_at_mut};

pub const TOOL: &str = "comment";

pub const TABLE: &[(&str, HandlerFactory<Deck>)] = &[
    ("add", factory::<AddComment>),
    ("list", factory::<ListComments>),
    ("delete", factory::<DeleteComment>),
];

pub fn registry() -> Result<HandlerRegistry<Deck>, RegistryError> {
    HandlerRegistry::from_table(TOOL, TABLE)
}

/// Attaches a review comment to a slide. The author defaults to the caller's identity.
#[derive(Default)]
struct AddComment;

impl OperationHandler<Deck> for AddComment {
    fn required_params(&self) -> &'static [&'static str] {
        &["slideIndex", "text"]
    }

    fn execute(
        &self,
        ctx: &mut OperationContext<'_, Deck>,
        params: &OperationParameters,
    ) -> Result<OperationOutput, OperationError> {
        let slide_index = params.index("slideIndex")?;
        let text = params.text("text")?;
        if text.trim().is_empty() {
            return Err(OperationError::validation("comment text must not be blank"));
        }
        let author = match params.opt_text("author")? {
            Some(author) => author.to_owned(),
            None => ctx.identity().to_string(),
        };

        let slide = slide_at_mut(ctx.document_mut(), slide_index)?;
        slide.comments_mut().push(Comment::new(author.as_str(), text));
        let comment_index = slide.comments().len() - 1;
        ctx.mark_modified();
        Ok(OperationOutput::message(format!(
            "added comment {comment_index} by {author} to slide {slide_index}"
        )))
    }
}

#[derive(Debug, Serialize)]
struct CommentListing {
    comments: Vec<CommentEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentEntry {
    slide_index: usize,
    comment_index: usize,
    author: String,
    text: String,
}

#[derive(Default)]
struct ListComments;

impl OperationHandler<Deck> for ListComments {
    fn execute(
        &self,
        ctx: &mut OperationContext<'_, Deck>,
        params: &OperationParameters,
    ) -> Result<OperationOutput, OperationError> {
        let deck = ctx.document();
        let scope = params.opt_index("slideIndex")?;
        if let Some(index) = scope {
            slide_at(deck, index)?;
        }

        let comments = deck
            .slides()
            .iter()
            .enumerate()
            .filter(|(index, _)| scope.is_none_or(|scope| scope == *index))
            .flat_map(|(slide_index, slide)| {
                slide.comments().iter().enumerate().map(move |(comment_index, comment)| {
                    CommentEntry {
                        slide_index,
                        comment_index,
                        author: comment.author().to_owned(),
                        text: comment.text().to_owned(),
                    }
                })
            })
            .collect::<Vec<_>>();
        OperationOutput::payload(&CommentListing { comments })
    }
}

#[derive(Default)]
struct DeleteComment;

impl OperationHandler<Deck> for DeleteComment {
    fn required_params(&self) -> &'static [&'static str] {
        &["slideIndex", "commentIndex"]
    }

    fn execute(
        &self,
        ctx: &mut OperationContext<'_, Deck>,
        params: &OperationParameters,
    ) -> Result<OperationOutput, OperationError> {
        let slide_index = params.index("slideIndex")?;
        let comment_index = params.index("commentIndex")?;

        let slide = slide_at_mut(ctx.document_mut(), slide_index)?;
        let count = slide.comments().len();
        if comment_index >= count {
            return Err(OperationError::not_found(format!(
                "comment {comment_index} on slide {slide_index} (slide has {count} comment(s))"
            )));
        }
        slide.comments_mut().remove(comment_index);
        ctx.mark_modified();
        Ok(OperationOutput::message(format!(
            "deleted comment {comment_index} from slide {slide_index}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::registry;
    use crate::model::{Deck, Slide};
    use crate::ops::{ErrorKind, OperationParameters};
    use crate::tools::test_support::{payload, run};

    fn two_slides() -> Deck {
        let mut deck = Deck::new();
        deck.slides_mut().push(Slide::new());
        deck.slides_mut().push(Slide::new());
        deck
    }

    #[test]
    fn add_defaults_author_to_caller_identity() {
        let registry = registry().expect("registry");
        let mut deck = two_slides();

        let params = OperationParameters::new().with("slideIndex", 1_i64).with("text", "tighten");
        let (result, modified) = run(&registry, &mut deck, "add", params);
        result.expect("add");
        assert!(modified);

        let params = OperationParameters::new()
            .with("slideIndex", 0_i64)
            .with("text", "typo")
            .with("author", "rev");
        run(&registry, &mut deck, "add", params).0.expect("add");

        let (result, modified) = run(&registry, &mut deck, "list", OperationParameters::new());
        assert!(!modified);
        let data = payload(result.expect("list"));
        let comments = data["comments"].as_array().expect("array");
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0]["author"], "rev");
        assert_eq!(comments[1]["author"], "default");
        assert_eq!(comments[1]["slideIndex"], 1);
    }

    #[test]
    fn blank_comment_is_rejected() {
        let registry = registry().expect("registry");
        let mut deck = two_slides();

        let params = OperationParameters::new().with("slideIndex", 0_i64).with("text", "  ");
        let (result, modified) = run(&registry, &mut deck, "add", params);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Validation);
        assert!(!modified);
    }

    #[test]
    fn delete_checks_comment_index() {
        let registry = registry().expect("registry");
        let mut deck = two_slides();
        let params = OperationParameters::new()
            .with("slideIndex", 0_i64)
            .with("text", "x");
        run(&registry, &mut deck, "add", params).0.expect("add");

        let params = OperationParameters::new()
            .with("slideIndex", 0_i64)
            .with("commentIndex", 1_i64);
        let (result, modified) = run(&registry, &mut deck, "delete", params);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::NotFound);
        assert!(!modified);

        let params = OperationParameters::new()
            .with("slideIndex", 0_i64)
            .with("commentIndex", 0_i64);
        let (result, modified) = run(&registry, &mut deck, "delete", params);
        result.expect("delete");
        assert!(modified);
        assert!(deck.slides()[0].comments().is_empty());
    }
}
