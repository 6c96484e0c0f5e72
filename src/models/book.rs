use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{Author, Review};

/// Sentinel name for a publisher that was never properly identified
pub const UNKNOWN_PUBLISHER: &str = "N.A.";

/// A book publisher, identified by name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publisher {
    name: String,
}

impl Publisher {
    /// Creates a publisher; blank input falls back to the unknown sentinel
    pub fn new(name: &str) -> Self {
        let name = name.trim();
        Self {
            name: if name.is_empty() {
                UNKNOWN_PUBLISHER.to_string()
            } else {
                name.to_string()
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Derived identifier: a hash of the publisher name
    pub fn id(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.name.hash(&mut hasher);
        hasher.finish()
    }
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new(UNKNOWN_PUBLISHER)
    }
}

impl PartialEq for Publisher {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Publisher {}

impl Hash for Publisher {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Publisher {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Publisher {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

/// A book in the catalog
///
/// Identity is the numeric id, assigned once at construction and never
/// mutated. Optional attributes (description, release year, page count,
/// ebook flag) are set after construction; setters for optional fields keep
/// the previous value when handed blank input instead of failing.
///
/// Reviews and reader names are back-references maintained by the owning
/// repository on its canonical copy of the book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    id: u32,
    title: String,
    description: Option<String>,
    publisher: Option<Publisher>,
    authors: Vec<Author>,
    release_year: Option<u16>,
    ebook: Option<bool>,
    num_pages: Option<u32>,
    reviews: Vec<Review>,
    readers: Vec<String>,
}

impl Book {
    /// Creates a new book
    ///
    /// Fails if `title` is empty or whitespace-only.
    pub fn new(id: u32, title: &str) -> AppResult<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::invalid("book title must not be empty"));
        }

        Ok(Self {
            id,
            title: title.to_string(),
            description: None,
            publisher: None,
            authors: Vec::new(),
            release_year: None,
            ebook: None,
            num_pages: None,
            reviews: Vec::new(),
            readers: Vec::new(),
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Replaces the title; the new title must be non-empty
    pub fn set_title(&mut self, title: &str) -> AppResult<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::invalid("book title must not be empty"));
        }
        self.title = title.to_string();
        Ok(())
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Sets the description; blank input keeps the previous value
    pub fn set_description(&mut self, description: &str) {
        let description = description.trim();
        if !description.is_empty() {
            self.description = Some(description.to_string());
        }
    }

    pub fn publisher(&self) -> Option<&Publisher> {
        self.publisher.as_ref()
    }

    pub fn set_publisher(&mut self, publisher: Publisher) {
        self.publisher = Some(publisher);
    }

    pub fn release_year(&self) -> Option<u16> {
        self.release_year
    }

    pub fn set_release_year(&mut self, year: u16) {
        self.release_year = Some(year);
    }

    pub fn ebook(&self) -> Option<bool> {
        self.ebook
    }

    pub fn set_ebook(&mut self, ebook: bool) {
        self.ebook = Some(ebook);
    }

    pub fn num_pages(&self) -> Option<u32> {
        self.num_pages
    }

    pub fn set_num_pages(&mut self, num_pages: u32) {
        self.num_pages = Some(num_pages);
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    /// Adds an author, wiring symmetric coauthor links with every author
    /// already on the book. Adding the same author twice is a no-op.
    pub fn add_author(&mut self, mut new_author: Author) {
        if self.authors.contains(&new_author) {
            return;
        }
        for existing in &mut self.authors {
            existing.add_coauthor(new_author.id());
            new_author.add_coauthor(existing.id());
        }
        self.authors.push(new_author);
    }

    pub fn remove_author(&mut self, author: &Author) {
        self.authors.retain(|a| a != author);
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    /// Attaches a review; an equal review already present is ignored
    pub fn add_review(&mut self, review: Review) {
        if !self.reviews.contains(&review) {
            self.reviews.push(review);
        }
    }

    /// User names that currently hold this book on a reading list
    pub fn readers(&self) -> &[String] {
        &self.readers
    }

    pub fn add_reader(&mut self, user_name: &str) {
        let user_name = user_name.to_lowercase();
        if !self.readers.contains(&user_name) {
            self.readers.push(user_name);
        }
    }

    pub fn remove_reader(&mut self, user_name: &str) {
        let user_name = user_name.to_lowercase();
        self.readers.retain(|name| name != &user_name);
    }
}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Book {}

impl Hash for Book {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Book {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Book {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}
