//! RetrievalEngine: rank the allowed corpus and pack it into a budget.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use docbot_types::project::{Document, Excerpt};

use super::scoring::{paragraph_excerpt, query_terms, score};
use crate::store::DocumentStore;

/// Selects context for a query from the documents a channel may read.
///
/// Documents are read fresh on every call, so a file deleted since the last
/// retrieval is never served. Unreadable files are skipped.
pub struct RetrievalEngine<S> {
    store: Arc<S>,
}

struct Ranked {
    doc: Document,
    score: u32,
}

impl<S: DocumentStore> RetrievalEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Rank every readable document in `allowed` against `query` and return
    /// excerpts whose combined size stays within `budget` characters.
    ///
    /// Documents are taken whole in rank order (score descending, then path,
    /// then project). The first document that does not fit contributes only
    /// its matching paragraphs, if any fit, and packing stops there.
    pub async fn retrieve(
        &self,
        query: &str,
        allowed: &BTreeSet<String>,
        budget: usize,
    ) -> Vec<Excerpt> {
        let terms = query_terms(query);
        let mut ranked = self.load(allowed, &terms).await;

        ranked.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.doc.path.cmp(&b.doc.path))
                .then_with(|| a.doc.project.cmp(&b.doc.project))
        });

        let candidates = ranked.len();
        let mut excerpts = Vec::new();
        let mut used = 0usize;

        for Ranked { doc, score } in ranked {
            let size = doc.content.chars().count();
            if used + size <= budget {
                used += size;
                excerpts.push(Excerpt {
                    project: doc.project,
                    path: doc.path,
                    text: doc.content,
                    score,
                    partial: false,
                });
                continue;
            }

            if score > 0
                && let Some(text) = paragraph_excerpt(&doc.content, &terms, budget - used)
            {
                used += text.chars().count();
                excerpts.push(Excerpt {
                    project: doc.project,
                    path: doc.path,
                    text,
                    score,
                    partial: true,
                });
            }
            break;
        }

        debug!(
            candidates,
            selected = excerpts.len(),
            used_chars = used,
            budget,
            "retrieved context"
        );
        excerpts
    }

    async fn load(&self, allowed: &BTreeSet<String>, terms: &[String]) -> Vec<Ranked> {
        let mut ranked = Vec::new();

        for project in allowed {
            let paths = match self.store.list_documents(project).await {
                Ok(paths) => paths,
                Err(e) => {
                    warn!(project = %project, error = %e, "skipping project");
                    continue;
                }
            };

            for path in paths {
                let content = match self.store.read(project, &path).await {
                    Ok(content) => content,
                    Err(e) => {
                        warn!(project = %project, path = %path, error = %e, "skipping unreadable document");
                        continue;
                    }
                };
                if content.trim().is_empty() {
                    continue;
                }
                let score = score(terms, &path, &content);
                ranked.push(Ranked {
                    doc: Document {
                        project: project.clone(),
                        path,
                        content,
                    },
                    score,
                });
            }
        }
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryDocumentStore;

    fn allowed(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn paths(excerpts: &[Excerpt]) -> Vec<String> {
        excerpts
            .iter()
            .map(|e| format!("{}/{}", e.project, e.path))
            .collect()
    }

    #[tokio::test]
    async fn empty_corpus_yields_nothing() {
        let store = Arc::new(MemoryDocumentStore::new(&["alpha"]));
        let engine = RetrievalEngine::new(store);
        assert!(engine.retrieve("roadmap", &allowed(&["alpha"]), 1000).await.is_empty());
    }

    #[tokio::test]
    async fn ranks_by_score_then_path() {
        let store = Arc::new(
            MemoryDocumentStore::new(&["alpha", "beta"])
                .with_doc("alpha", "b.md", "deadline")
                .with_doc("alpha", "a.md", "deadline")
                .with_doc("beta", "a.md", "deadline")
                .with_doc("beta", "notes.md", "deadline deadline deadline")
                .with_doc("alpha", "misc.md", "nothing here"),
        );
        let engine = RetrievalEngine::new(store);
        let excerpts = engine
            .retrieve("deadline", &allowed(&["alpha", "beta"]), 10_000)
            .await;
        assert_eq!(
            paths(&excerpts),
            vec!["beta/notes.md", "alpha/a.md", "beta/a.md", "alpha/b.md", "alpha/misc.md"]
        );
        assert_eq!(excerpts[0].score, 3);
        assert_eq!(excerpts[4].score, 0);
    }

    #[tokio::test]
    async fn only_allowed_projects_are_read() {
        let store = Arc::new(
            MemoryDocumentStore::new(&["alpha", "beta"])
                .with_doc("alpha", "a.md", "alpha text")
                .with_doc("beta", "b.md", "beta text"),
        );
        let engine = RetrievalEngine::new(store);
        let excerpts = engine.retrieve("text", &allowed(&["beta"]), 1000).await;
        assert_eq!(paths(&excerpts), vec!["beta/b.md"]);
    }

    #[tokio::test]
    async fn combined_size_never_exceeds_budget() {
        let body = "word ".repeat(40);
        let mut store = MemoryDocumentStore::new(&["alpha"]);
        for i in 0..10 {
            store = store.with_doc("alpha", &format!("doc{i}.md"), &body);
        }
        let engine = RetrievalEngine::new(Arc::new(store));
        for budget in [0, 1, 199, 200, 450, 5000] {
            let excerpts = engine.retrieve("word", &allowed(&["alpha"]), budget).await;
            let total: usize = excerpts.iter().map(Excerpt::size).sum();
            assert!(total <= budget, "budget {budget} exceeded: {total}");
        }
    }

    #[tokio::test]
    async fn overflowing_document_contributes_matching_paragraphs() {
        let big = format!(
            "Intro {}\n\nThe launch date is June.\n\nAppendix {}",
            "x".repeat(100),
            "y".repeat(100)
        );
        let store = Arc::new(
            MemoryDocumentStore::new(&["alpha"])
                .with_doc("alpha", "plan.md", &big)
                .with_doc("alpha", "zzz.md", "launch"),
        );
        let engine = RetrievalEngine::new(store);
        let excerpts = engine.retrieve("launch", &allowed(&["alpha"]), 60).await;

        // plan.md (score 1) ties zzz.md (score 1) and sorts first by path.
        assert_eq!(excerpts.len(), 1);
        assert_eq!(excerpts[0].path, "plan.md");
        assert!(excerpts[0].partial);
        assert_eq!(excerpts[0].text, "The launch date is June.");
    }

    #[tokio::test]
    async fn unreadable_documents_are_skipped() {
        let store = MemoryDocumentStore::new(&["alpha"])
            .with_doc("alpha", "good.md", "status ok")
            .with_doc("alpha", "bad.md", "status broken");
        store.mark_unreadable("alpha", "bad.md");
        let engine = RetrievalEngine::new(Arc::new(store));
        let excerpts = engine.retrieve("status", &allowed(&["alpha"]), 1000).await;
        assert_eq!(paths(&excerpts), vec!["alpha/good.md"]);
    }

    #[tokio::test]
    async fn unknown_project_is_skipped() {
        let store = Arc::new(MemoryDocumentStore::new(&["alpha"]).with_doc("alpha", "a.md", "hello"));
        let engine = RetrievalEngine::new(store);
        let excerpts = engine.retrieve("hello", &allowed(&["alpha", "ghost"]), 1000).await;
        assert_eq!(paths(&excerpts), vec!["alpha/a.md"]);
    }

    #[tokio::test]
    async fn deleted_document_is_not_served() {
        let store = Arc::new(MemoryDocumentStore::new(&["alpha"]).with_doc("alpha", "gone.md", "temp"));
        let engine = RetrievalEngine::new(Arc::clone(&store));
        assert_eq!(engine.retrieve("temp", &allowed(&["alpha"]), 1000).await.len(), 1);

        store.remove("alpha", "gone.md");
        assert!(engine.retrieve("temp", &allowed(&["alpha"]), 1000).await.is_empty());
    }
}
