use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// A book author
///
/// Identity is the numeric id, assigned once at construction. The coauthor
/// set records every other author this one has shared a book with; the
/// relation is symmetric and is wired up by [`Book::add_author`] and merged
/// across books by the repositories.
///
/// [`Book::add_author`]: crate::models::Book::add_author
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    id: u32,
    full_name: String,
    coauthors: BTreeSet<u32>,
}

impl Author {
    /// Creates a new author
    ///
    /// Fails if `full_name` is empty or whitespace-only.
    pub fn new(id: u32, full_name: &str) -> AppResult<Self> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(AppError::invalid("author full name must not be empty"));
        }

        Ok(Self {
            id,
            full_name: full_name.to_string(),
            coauthors: BTreeSet::new(),
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Ids of every author this one has shared a book with
    pub fn coauthors(&self) -> &BTreeSet<u32> {
        &self.coauthors
    }

    /// Records a coauthor relationship
    ///
    /// An author is never their own coauthor; recording the same id twice is
    /// a no-op. Callers are responsible for recording the reverse direction
    /// (see [`Book::add_author`]).
    ///
    /// [`Book::add_author`]: crate::models::Book::add_author
    pub fn add_coauthor(&mut self, coauthor_id: u32) {
        if coauthor_id != self.id {
            self.coauthors.insert(coauthor_id);
        }
    }

    /// Merges another author record's coauthor links into this one
    pub(crate) fn merge_coauthors(&mut self, other: &Author) {
        for &id in &other.coauthors {
            self.add_coauthor(id);
        }
    }

    pub fn has_coauthored_with(&self, other: &Author) -> bool {
        self.coauthors.contains(&other.id)
    }
}

impl PartialEq for Author {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Author {}

impl Hash for Author {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Author {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Author {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_author() {
        let author = Author::new(7, "  Ursula K. Le Guin  ").unwrap();
        assert_eq!(author.id(), 7);
        assert_eq!(author.full_name(), "Ursula K. Le Guin");
        assert!(author.coauthors().is_empty());
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(Author::new(1, "").is_err());
        assert!(Author::new(1, "   ").is_err());
    }

    #[test]
    fn test_add_coauthor_ignores_self() {
        let mut author = Author::new(3, "Terry Pratchett").unwrap();
        author.add_coauthor(3);
        assert!(author.coauthors().is_empty());

        author.add_coauthor(4);
        author.add_coauthor(4);
        assert_eq!(author.coauthors().len(), 1);
    }

    #[test]
    fn test_has_coauthored_with() {
        let mut gaiman = Author::new(1, "Neil Gaiman").unwrap();
        let pratchett = Author::new(2, "Terry Pratchett").unwrap();

        assert!(!gaiman.has_coauthored_with(&pratchett));
        gaiman.add_coauthor(pratchett.id());
        assert!(gaiman.has_coauthored_with(&pratchett));
    }

    #[test]
    fn test_equality_and_ordering_by_id() {
        let a = Author::new(1, "Same Person").unwrap();
        let b = Author::new(1, "Different Spelling").unwrap();
        let c = Author::new(2, "Same Person").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a < c);
    }
}
