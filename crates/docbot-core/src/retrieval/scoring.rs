//! Lexical relevance scoring.
//!
//! A document's score is the number of (non-overlapping, case-insensitive)
//! occurrences of every query term in its content, plus `PATH_BONUS` for
//! each term that appears in its path.

/// Added once per query term found in the document path.
pub const PATH_BONUS: u32 = 5;

const MIN_TERM_CHARS: usize = 3;

const STOPWORDS: &[&str] = &[
    "about", "also", "and", "any", "are", "been", "but", "can", "could", "did", "does", "for",
    "from", "give", "had", "has", "have", "how", "into", "its", "just", "let", "more", "not",
    "our", "please", "should", "show", "some", "tell", "than", "that", "the", "their", "them",
    "then", "there", "these", "they", "this", "was", "were", "what", "when", "where", "which",
    "who", "why", "will", "with", "would", "you", "your",
];

/// Extract lowercase search terms from a free-text query.
///
/// Splits on non-alphanumeric characters, drops short words and stopwords,
/// strips a plural `s` from longer words, and removes duplicates while
/// keeping first-seen order.
pub fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in query
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
    {
        if word.chars().count() < MIN_TERM_CHARS || STOPWORDS.contains(&word.as_str()) {
            continue;
        }
        let term = match word.strip_suffix('s') {
            Some(stem) if stem.chars().count() >= MIN_TERM_CHARS && !stem.ends_with('s') => {
                stem.to_string()
            }
            _ => word,
        };
        if !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}

/// Score one document against pre-extracted terms.
pub fn score(terms: &[String], path: &str, content: &str) -> u32 {
    if terms.is_empty() {
        return 0;
    }
    let content = content.to_lowercase();
    let path = path.to_lowercase();

    terms.iter().fold(0u32, |total, term| {
        let hits = u32::try_from(content.matches(term.as_str()).count()).unwrap_or(u32::MAX);
        let bonus = if path.contains(term.as_str()) { PATH_BONUS } else { 0 };
        total.saturating_add(hits).saturating_add(bonus)
    })
}

/// Whole paragraphs of `content` that mention any term, in document order,
/// packed greedily within `budget` characters.
///
/// Paragraphs are separated by blank lines and are never split, so a match
/// is never cut in half. Returns `None` when nothing fits.
pub fn paragraph_excerpt(content: &str, terms: &[String], budget: usize) -> Option<String> {
    const SEPARATOR: &str = "\n\n";

    if terms.is_empty() || budget == 0 {
        return None;
    }

    let mut excerpt = String::new();
    let mut used = 0;
    for paragraph in content.split(SEPARATOR) {
        let paragraph = paragraph.trim_matches('\n');
        if paragraph.trim().is_empty() {
            continue;
        }
        let lowered = paragraph.to_lowercase();
        if !terms.iter().any(|t| lowered.contains(t.as_str())) {
            continue;
        }

        let cost = paragraph.chars().count() + if excerpt.is_empty() { 0 } else { SEPARATOR.len() };
        if used + cost > budget {
            continue;
        }
        if !excerpt.is_empty() {
            excerpt.push_str(SEPARATOR);
        }
        excerpt.push_str(paragraph);
        used += cost;
    }

    (!excerpt.is_empty()).then_some(excerpt)
}
