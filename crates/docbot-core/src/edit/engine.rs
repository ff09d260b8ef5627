//! EditEngine: the only component that mutates documents.
//!
//! A directive applies only when its search string occurs exactly once in
//! the current file content. Validation and the write happen under a
//! per-file async lock, so two edits to the same file never interleave
//! between read and rename. The store's `write` is atomic; a rejected
//! directive never reaches it.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use docbot_types::edit::EditDirective;
use docbot_types::error::EditRejection;

use crate::store::DocumentStore;

/// Number of literal, non-overlapping occurrences of `needle` in `haystack`.
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

/// Validates and applies edit directives against a `DocumentStore`.
pub struct EditEngine<S> {
    store: Arc<S>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<S: DocumentStore> EditEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    /// Check that `directive` would apply cleanly right now.
    ///
    /// Returns the file's current content on success.
    pub async fn validate(&self, directive: &EditDirective) -> Result<String, EditRejection> {
        check_shape(directive)?;

        if !self.store.projects().iter().any(|p| p.id == directive.project) {
            return Err(EditRejection::UnknownProject(directive.project.clone()));
        }

        let content = self
            .store
            .read(&directive.project, &directive.path)
            .await
            .map_err(|e| match EditRejection::from(e) {
                EditRejection::FileNotFound(_) => EditRejection::FileNotFound(directive.target()),
                other => other,
            })?;

        match count_occurrences(&content, &directive.search) {
            0 => Err(EditRejection::NoMatch(directive.target())),
            1 => Ok(content),
            count => Err(EditRejection::AmbiguousMatch {
                path: directive.target(),
                count,
            }),
        }
    }

    /// Validate and apply one directive, returning the new content.
    ///
    /// Holds the target file's lock from the validating read through the
    /// atomic write.
    pub async fn apply(&self, directive: &EditDirective) -> Result<String, EditRejection> {
        let target = directive.target();
        let lock = self.file_lock(&target);
        let _guard = lock.lock().await;

        let content = match self.validate(directive).await {
            Ok(content) => content,
            Err(rejection) => {
                debug!(target = %target, reason = %rejection, "edit rejected");
                return Err(rejection);
            }
        };

        let updated = content.replacen(&directive.search, &directive.replace, 1);
        self.store
            .write(&directive.project, &directive.path, &updated)
            .await?;

        info!(
            target = %target,
            removed_chars = directive.search.chars().count(),
            inserted_chars = directive.replace.chars().count(),
            "applied edit"
        );
        Ok(updated)
    }

    fn file_lock(&self, target: &str) -> Arc<Mutex<()>> {
        Arc::clone(
            self.locks
                .entry(target.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }
}

/// Reject directives that could never apply regardless of file content.
fn check_shape(directive: &EditDirective) -> Result<(), EditRejection> {
    if directive.search.is_empty() {
        return Err(EditRejection::InvalidDirective(
            "search text is empty".to_string(),
        ));
    }
    if !has_markdown_extension(&directive.path) {
        return Err(EditRejection::InvalidDirective(format!(
            "only markdown files can be edited: {}",
            directive.target()
        )));
    }
    let escapes = directive.path.starts_with('/')
        || directive.path.starts_with('\\')
        || directive
            .path
            .split(['/', '\\'])
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if escapes {
        return Err(EditRejection::InvalidDirective(format!(
            "path is outside the project: {}",
            directive.target()
        )));
    }
    Ok(())
}

/// Same rule the corpus listing uses: a `.md` extension in any case.
fn has_markdown_extension(path: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && !stem.ends_with('/') && ext.eq_ignore_ascii_case("md"))
}
