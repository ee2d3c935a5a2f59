// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Decksmith-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Decksmith and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("deck has run out of shape ids")]
pub struct ShapeIdsExhausted;

/// A presentation document: an ordered list of slides.
///
/// Shape ids are allocated from a deck-wide counter so they stay unique when slides are
/// duplicated or moved. Loading a deck raises the counter past every id already in use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredDeck")]
pub struct Deck {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    slides: Vec<Slide>,
    next_shape_id: u64,
}

#[derive(Deserialize)]
struct StoredDeck {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    slides: Vec<Slide>,
    #[serde(default)]
    next_shape_id: u64,
}

impl From<StoredDeck> for Deck {
    fn from(stored: StoredDeck) -> Self {
        let highest = stored
            .slides
            .iter()
            .flat_map(|slide| slide.shapes.iter())
            .map(Shape::shape_id)
            .max()
            .unwrap_or(0);
        Self {
            title: stored.title,
            slides: stored.slides,
            next_shape_id: stored.next_shape_id.max(highest),
        }
    }
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slides_mut(&mut self) -> &mut Vec<Slide> {
        &mut self.slides
    }

    pub fn slide(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    pub fn slide_mut(&mut self, index: usize) -> Option<&mut Slide> {
        self.slides.get_mut(index)
    }

    pub fn allocate_shape_id(&mut self) -> Result<u64, ShapeIdsExhausted> {
        let id = self.next_shape_id.checked_add(1).ok_or(ShapeIdsExhausted)?;
        self.next_shape_id = id;
        Ok(id)
    }

    /// Reserves `count` fresh ids at once; on failure the counter is left untouched.
    pub fn allocate_shape_ids(&mut self, count: usize) -> Result<Vec<u64>, ShapeIdsExhausted> {
        let first = self.next_shape_id;
        let last = u64::try_from(count)
            .ok()
            .and_then(|count| first.checked_add(count))
            .ok_or(ShapeIdsExhausted)?;
        self.next_shape_id = last;
        Ok((first..last).map(|id| id + 1).collect())
    }

    pub fn shape_count(&self) -> usize {
        self.slides.iter().map(|slide| slide.shapes().len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    #[serde(default)]
    shapes: Vec<Shape>,
    #[serde(default)]
    comments: Vec<Comment>,
}

impl Slide {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn shapes_mut(&mut self) -> &mut Vec<Shape> {
        &mut self.shapes
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn comments_mut(&mut self) -> &mut Vec<Comment> {
        &mut self.comments
    }
}

/// A text-bearing shape placed on a slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    shape_id: u64,
    text: String,
}

impl Shape {
    pub fn new(shape_id: u64, text: impl Into<String>) -> Self {
        Self {
            shape_id,
            text: text.into(),
        }
    }

    pub fn shape_id(&self) -> u64 {
        self.shape_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    author: String,
    text: String,
}

impl Comment {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
        }
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
