//! AccessGate: which channel may see which projects.
//!
//! A channel with a configured policy may only reach the projects listed for
//! it. A channel without a policy reaches every configured project. Policies
//! are fixed at construction; the gate holds no mutable state and is shared
//! freely across tasks.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use docbot_types::error::AccessError;
use docbot_types::project::Project;

/// Immutable channel policy table.
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    projects: BTreeSet<String>,
    policies: HashMap<String, BTreeSet<String>>,
}

impl AccessGate {
    /// Build a gate over `projects`, restricting the channels in `policies`.
    pub fn new<P, I>(projects: P, policies: I) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        Self {
            projects: projects.into_iter().map(Into::into).collect(),
            policies: policies
                .into_iter()
                .map(|(channel, allowed)| (channel, allowed.into_iter().collect()))
                .collect(),
        }
    }

    /// Build a gate from loaded project definitions and the `[channel_access]` table.
    pub fn from_config(projects: &[Project], channel_access: &BTreeMap<String, Vec<String>>) -> Self {
        Self::new(
            projects.iter().map(|p| p.id.clone()),
            channel_access
                .iter()
                .map(|(channel, allowed)| (channel.clone(), allowed.clone())),
        )
    }

    /// Projects the channel may access: its configured set, or every project.
    pub fn allowed_projects(&self, channel_id: &str) -> BTreeSet<String> {
        match self.policies.get(channel_id) {
            Some(allowed) => allowed.clone(),
            None => self.projects.clone(),
        }
    }

    /// Whether the channel has an explicit policy.
    pub fn is_restricted(&self, channel_id: &str) -> bool {
        self.policies.contains_key(channel_id)
    }

    /// Intersect `requested` with the channel's allowed set.
    ///
    /// An empty request authorizes nothing and is not an error. A non-empty
    /// request with no overlap is `AccessDenied`.
    pub fn authorize(
        &self,
        channel_id: &str,
        requested: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, AccessError> {
        let allowed = self.allowed_projects(channel_id);
        let granted: BTreeSet<String> = requested.intersection(&allowed).cloned().collect();

        if granted.is_empty() && !requested.is_empty() {
            debug!(channel = channel_id, ?requested, "access denied");
            return Err(AccessError::AccessDenied {
                channel: channel_id.to_string(),
                requested: requested.iter().cloned().collect(),
                allowed: allowed.into_iter().collect(),
            });
        }
        Ok(granted)
    }

    /// Authorize a single project, as targeted by an edit directive.
    pub fn authorize_edit(&self, channel_id: &str, project: &str) -> Result<(), AccessError> {
        let requested = BTreeSet::from([project.to_string()]);
        self.authorize(channel_id, &requested).map(|_| ())
    }
}

/// Projects named in a message, by id or display name (case-insensitive,
/// whole words only).
pub fn mentioned_projects(text: &str, projects: &[Project]) -> BTreeSet<String> {
    let text = text.to_lowercase();
    projects
        .iter()
        .filter(|p| contains_word(&text, &p.id.to_lowercase()) || contains_word(&text, &p.name.to_lowercase()))
        .map(|p| p.id.clone())
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether `needle` occurs in `haystack` with no word character on either side.
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}
