//! Tag-keyed classification and content rules.
//!
//! The base classifiers behind the `is_inline`, `is_void`,
//! `is_element_read_only` and `is_selectable` hooks are lookups into a
//! [`Schema`]. Extensions extend it when they are installed, and the CLI
//! builds one from configuration.

use std::collections::{BTreeMap, BTreeSet};

/// Block synthesized into a document left with no blocks.
pub const DEFAULT_ROOT_FILL: &str = "paragraph";

/// What an element may contain.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContentRule {
    /// Text and inline elements. An empty element gets an empty text child.
    #[default]
    Inline,
    /// Block elements only.
    Blocks {
        /// Tag of a block synthesized into an empty container.
        fill: Option<String>,
        /// An empty container without a fill is removed instead.
        removable: bool,
    },
}

impl ContentRule {
    pub fn blocks() -> Self {
        ContentRule::Blocks {
            fill: None,
            removable: true,
        }
    }

    pub fn blocks_filled_with(tag: impl Into<String>) -> Self {
        ContentRule::Blocks {
            fill: Some(tag.into()),
            removable: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    inline: BTreeSet<String>,
    void: BTreeSet<String>,
    read_only: BTreeSet<String>,
    unselectable: BTreeSet<String>,
    content: BTreeMap<String, ContentRule>,
    root_fill: Option<String>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inline<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inline.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_void<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.void.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_read_only<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.read_only.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_unselectable<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unselectable.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_content(mut self, tag: impl Into<String>, rule: ContentRule) -> Self {
        self.set_content(tag, rule);
        self
    }

    pub fn set_content(&mut self, tag: impl Into<String>, rule: ContentRule) {
        self.content.insert(tag.into(), rule);
    }

    pub fn with_root_fill(mut self, tag: impl Into<String>) -> Self {
        self.root_fill = Some(tag.into());
        self
    }

    /// Union of both schemas; rules in `other` win on conflict.
    pub fn merge(&mut self, other: &Schema) {
        self.inline.extend(other.inline.iter().cloned());
        self.void.extend(other.void.iter().cloned());
        self.read_only.extend(other.read_only.iter().cloned());
        self.unselectable.extend(other.unselectable.iter().cloned());
        for (tag, rule) in &other.content {
            self.content.insert(tag.clone(), rule.clone());
        }
        if other.root_fill.is_some() {
            self.root_fill = other.root_fill.clone();
        }
    }

    pub fn is_inline(&self, kind: &str) -> bool {
        self.inline.contains(kind)
    }

    pub fn is_void(&self, kind: &str) -> bool {
        self.void.contains(kind)
    }

    pub fn is_read_only(&self, kind: &str) -> bool {
        self.read_only.contains(kind)
    }

    pub fn is_selectable(&self, kind: &str) -> bool {
        !self.unselectable.contains(kind)
    }

    pub fn content(&self, kind: &str) -> ContentRule {
        self.content.get(kind).cloned().unwrap_or_default()
    }

    pub fn root_fill(&self) -> &str {
        self.root_fill.as_deref().unwrap_or(DEFAULT_ROOT_FILL)
    }
}
