use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A labeled text fragment embedded in its owner's user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: Uuid,
    pub category: String,
    pub order: i64,
    pub text: String,
}

impl Snippet {
    /// Two snippets with the same category and text are duplicates, whatever their order.
    pub fn same_content(&self, other: &Snippet) -> bool {
        self.category == other.category && self.text == other.text
    }
}

/// Copy of `snippets` sorted by `order`; equal orders keep insertion order.
pub fn sorted_by_order(snippets: &[Snippet]) -> Vec<Snippet> {
    let mut sorted = snippets.to_vec();
    sorted.sort_by_key(|s| s.order);
    sorted
}

pub fn max_order(snippets: &[Snippet]) -> Option<i64> {
    snippets.iter().map(|s| s.order).max()
}
