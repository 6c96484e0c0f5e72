use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{Author, Book, Publisher, Review, User};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryRepository;
pub use sqlite::SqliteRepository;

/// Storage-agnostic capability interface over the book catalog
///
/// Both backends ([`MemoryRepository`] and [`SqliteRepository`]) must yield
/// identical logical results for the same query, so consumers such as the
/// recommendation engine run unmodified against either.
///
/// Lookup operations report "not found" as `None` or an empty `Vec`, never
/// as an error; only mutations with a broken required relationship fail.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    // Users

    async fn add_user(&self, user: User) -> AppResult<()>;

    /// Looks up a user by name (case-insensitive)
    async fn get_user(&self, user_name: &str) -> AppResult<Option<User>>;

    // Books

    /// Adds a book, registering its authors and publisher
    ///
    /// A book whose identifier is already present is ignored.
    async fn add_book(&self, book: Book) -> AppResult<()>;

    async fn get_book(&self, id: u32) -> AppResult<Option<Book>>;

    async fn get_number_of_books(&self) -> AppResult<usize>;

    async fn get_first_book(&self) -> AppResult<Option<Book>>;

    async fn get_last_book(&self) -> AppResult<Option<Book>>;

    async fn get_books_by_author_id(&self, author_id: u32) -> AppResult<Vec<Book>>;

    /// Books by author full name (case-insensitive)
    async fn get_books_by_author_name(&self, author_name: &str) -> AppResult<Vec<Book>>;

    /// Books released in the given year; `None` means "no filter" and
    /// returns the whole catalog
    async fn get_books_by_release_year(&self, year: Option<u16>) -> AppResult<Vec<Book>>;

    /// Books whose title matches exactly (case-insensitive)
    async fn get_books_by_title(&self, title: &str) -> AppResult<Vec<Book>>;

    /// Books whose title contains the fragment (case-insensitive)
    async fn search_books_by_title(&self, fragment: &str) -> AppResult<Vec<Book>>;

    async fn get_books_by_publisher_name(&self, publisher_name: &str) -> AppResult<Vec<Book>>;

    /// The whole catalog in ascending identifier order
    async fn get_all_books(&self) -> AppResult<Vec<Book>>;

    // Reviews

    /// Registers a review, attaching it to its user and book
    ///
    /// Fails with a repository error when the review carries no user or the
    /// user is unknown.
    async fn add_review(&self, review: Review) -> AppResult<()>;

    async fn get_reviews(&self) -> AppResult<Vec<Review>>;

    // Authors and publishers

    async fn add_author(&self, author: Author) -> AppResult<()>;

    async fn get_author_names(&self) -> AppResult<Vec<String>>;

    async fn get_author_ids(&self) -> AppResult<Vec<u32>>;

    async fn add_publisher(&self, publisher: Publisher) -> AppResult<()>;

    async fn get_publisher_names(&self) -> AppResult<Vec<String>>;

    // Reading lists

    /// The user's reading list, oldest entry first; unknown users get an
    /// empty list
    async fn get_reading_list(&self, user_name: &str) -> AppResult<Vec<Book>>;

    /// Puts a book on the user's reading list
    ///
    /// Fails with a repository error when the user or the book is unknown.
    async fn add_to_reading_list(&self, user_name: &str, book_id: u32) -> AppResult<()>;
}
