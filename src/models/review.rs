use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Sentinel body for a review submitted without text
pub const EMPTY_REVIEW_TEXT: &str = "N/A";

/// A user's review of a book
///
/// The rating must be between 1 and 5 inclusive; construction fails
/// otherwise. The associated user is attached after construction and is
/// required before a repository will accept the review.
///
/// Equality deliberately compares (timestamp, book, text, rating) and
/// excludes the user, so the type carries no `Hash` impl and repositories
/// keep reviews in plain sequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    id: u32,
    book_id: u32,
    user_name: Option<String>,
    text: String,
    rating: u8,
    timestamp: DateTime<Utc>,
}

impl Review {
    /// Creates a new review for a book
    ///
    /// Blank text falls back to the [`EMPTY_REVIEW_TEXT`] sentinel. The
    /// timestamp defaults to the creation time.
    pub fn new(book_id: u32, text: &str, rating: u8) -> AppResult<Self> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::invalid("rating must be between 1 and 5"));
        }

        let text = text.trim();
        Ok(Self {
            id: 0,
            book_id,
            user_name: None,
            text: if text.is_empty() {
                EMPTY_REVIEW_TEXT.to_string()
            } else {
                text.to_string()
            },
            rating,
            timestamp: Utc::now(),
        })
    }

    /// Attaches the authoring user
    pub fn with_user(mut self, user_name: &str) -> Self {
        self.user_name = Some(user_name.trim().to_lowercase());
        self
    }

    /// Overrides the creation timestamp (e.g. when loading stored reviews)
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Overrides the numeric identifier assigned by a backing store
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn book_id(&self) -> u32 {
        self.book_id
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl PartialEq for Review {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp
            && self.book_id == other.book_id
            && self.text == other.text
            && self.rating == other.rating
    }
}

impl Eq for Review {}
