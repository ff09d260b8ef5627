//! DocumentStore trait for abstracting corpus I/O.
//!
//! Defined in docbot-core so retrieval and editing can read/write documents
//! without depending on any specific filesystem implementation. The
//! `LocalDocumentStore` adapter lives in docbot-infra.

use docbot_types::error::StoreError;
use docbot_types::project::Project;

/// Abstraction over the per-project document corpus.
///
/// Paths are relative to the project root with `/` separators. Every read
/// goes to the backing storage; implementations must not serve content of a
/// document that no longer exists.
pub trait DocumentStore: Send + Sync {
    /// All configured projects, in configuration order.
    fn projects(&self) -> &[Project];

    /// List the relative paths of a project's documents, sorted.
    fn list_documents(
        &self,
        project: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>, StoreError>> + Send;

    /// Read a document's full content.
    fn read(
        &self,
        project: &str,
        path: &str,
    ) -> impl std::future::Future<Output = Result<String, StoreError>> + Send;

    /// Replace a document's content. Implementations must persist all-or-nothing:
    /// a crash mid-write leaves either the old or the new content.
    fn write(
        &self,
        project: &str,
        path: &str,
        content: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
