use std::cmp::Ordering;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{Book, Review};

/// Maximum number of books a reading list holds before evicting the oldest
pub const READING_LIST_CAPACITY: usize = 10;

/// A user-owned, capacity-bounded, duplicate-free ordered sequence of books
/// representing intent-to-read
///
/// Adding an 11th distinct book evicts the oldest entry first. Books already
/// on the list are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadingList {
    books: VecDeque<Book>,
}

impl ReadingList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a book, evicting the oldest entry at capacity
    ///
    /// Returns `false` when the book is already on the list.
    pub fn add(&mut self, book: Book) -> bool {
        if self.books.contains(&book) {
            return false;
        }
        if self.books.len() == READING_LIST_CAPACITY {
            self.books.pop_front();
        }
        self.books.push_back(book);
        true
    }

    /// Removes a book; absent books are ignored
    pub fn remove(&mut self, book: &Book) {
        self.books.retain(|b| b != book);
    }

    pub fn contains(&self, book: &Book) -> bool {
        self.books.contains(book)
    }

    pub fn get(&self, index: usize) -> Option<&Book> {
        self.books.get(index)
    }

    pub fn first(&self) -> Option<&Book> {
        self.books.front()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Book> {
        self.books.iter()
    }
}

/// A registered user
///
/// User names are case-normalized to lowercase and are the identity of the
/// type. The password is stored as handed in (pre-hashed by the excluded
/// web layer); the minimum length of 7 is enforced on whatever the caller
/// provides before hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    id: u32,
    user_name: String,
    password: String,
    reading_list: ReadingList,
    reviews: Vec<Review>,
    read_books: Vec<Book>,
    pages_read: u32,
}

impl User {
    /// Creates a new user
    ///
    /// Fails when the user name is blank or the password is shorter than 7
    /// characters.
    pub fn new(user_name: &str, password: &str) -> AppResult<Self> {
        let user_name = user_name.trim();
        if user_name.is_empty() {
            return Err(AppError::invalid("user name must not be empty"));
        }
        if password.len() < 7 {
            return Err(AppError::invalid(
                "password must be at least 7 characters",
            ));
        }

        Ok(Self {
            id: 0,
            user_name: user_name.to_lowercase(),
            password: password.to_string(),
            reading_list: ReadingList::new(),
            reviews: Vec::new(),
            read_books: Vec::new(),
            pages_read: 0,
        })
    }

    /// Overrides the numeric identifier assigned by a backing store
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn reading_list(&self) -> &ReadingList {
        &self.reading_list
    }

    pub fn reading_list_mut(&mut self) -> &mut ReadingList {
        &mut self.reading_list
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    /// Attaches a review authored by this user; duplicates are ignored
    pub fn add_review(&mut self, review: Review) {
        if !self.reviews.contains(&review) {
            self.reviews.push(review);
        }
    }

    pub fn read_books(&self) -> &[Book] {
        &self.read_books
    }

    pub fn pages_read(&self) -> u32 {
        self.pages_read
    }

    /// Marks a book as read, accumulating its page count
    ///
    /// A book already marked read is ignored.
    pub fn mark_read(&mut self, book: Book) {
        if self.read_books.contains(&book) {
            return;
        }
        self.pages_read += book.num_pages().unwrap_or(0);
        self.read_books.push(book);
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.user_name == other.user_name
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.user_name.hash(state);
    }
}

impl PartialOrd for User {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for User {
    fn cmp(&self, other: &Self) -> Ordering {
        self.user_name.cmp(&other.user_name)
    }
}
