//! Project, document, and excerpt types.
//!
//! A project is a named namespace of documents rooted at a directory.
//! Document paths are always relative to the project root and use `/`
//! separators regardless of platform.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A configured documentation project. Immutable after configuration load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Namespace key (e.g., "project_alpha").
    pub id: String,
    /// Human-readable name (e.g., "Project Alpha").
    pub name: String,
    /// Absolute root directory of the project's documents.
    pub root: PathBuf,
}

/// A document's full content as read during one retrieval pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub project: String,
    pub path: String,
    pub content: String,
}

/// A bounded slice of a document selected as model context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Excerpt {
    pub project: String,
    pub path: String,
    pub text: String,
    /// Relevance score the excerpt was ranked with.
    pub score: u32,
    /// True when `text` holds only the matching paragraphs of the document.
    pub partial: bool,
}

impl Excerpt {
    /// Size of the excerpt in characters, the unit of the context budget.
    pub fn size(&self) -> usize {
        self.text.chars().count()
    }
}
