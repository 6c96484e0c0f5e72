use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::inventory::BooksInventory;
use crate::models::{Author, Book, Publisher, Review, User};
use crate::repository::BookRepository;

/// Mutable store behind the repository lock
///
/// Insertion touches the inventory's internal structures plus the author and
/// publisher registries, so the whole store sits behind a single writer
/// lock; readers share the read side.
#[derive(Debug, Default)]
struct MemoryStore {
    inventory: BooksInventory,
    users: Vec<User>,
    reviews: Vec<Review>,
    authors: Vec<Author>,
    publishers: Vec<Publisher>,
}

impl MemoryStore {
    fn user(&self, user_name: &str) -> Option<&User> {
        let user_name = user_name.trim().to_lowercase();
        self.users.iter().find(|user| user.user_name() == user_name)
    }

    fn user_mut(&mut self, user_name: &str) -> Option<&mut User> {
        let user_name = user_name.trim().to_lowercase();
        self.users
            .iter_mut()
            .find(|user| user.user_name() == user_name)
    }

    /// Registers an author, merging coauthor links into an existing record
    fn register_author(&mut self, author: &Author) {
        match self.authors.iter_mut().find(|a| a.id() == author.id()) {
            Some(existing) => existing.merge_coauthors(author),
            None => self.authors.push(author.clone()),
        }
    }

    fn register_publisher(&mut self, publisher: &Publisher) {
        if !self.publishers.contains(publisher) {
            self.publishers.push(publisher.clone());
        }
    }
}

/// In-memory backend over [`BooksInventory`]
///
/// Holds the process-lifetime catalog for a deployment without a database.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    inner: RwLock<MemoryStore>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a book with shop metadata (price and stock)
    ///
    /// The trait-level [`BookRepository::add_book`] registers books without
    /// metadata; this is the inventory-aware variant.
    pub async fn add_book_with_stock(
        &self,
        book: Book,
        price: f64,
        stock: u32,
    ) -> AppResult<()> {
        let mut store = self.inner.write().await;
        register_book(&mut store, book, price, stock);
        Ok(())
    }

    pub async fn get_price(&self, book_id: u32) -> Option<f64> {
        self.inner.read().await.inventory.price(book_id)
    }

    pub async fn get_stock(&self, book_id: u32) -> Option<u32> {
        self.inner.read().await.inventory.stock(book_id)
    }

    /// Uniformly samples up to `n` distinct books from the catalog
    pub async fn sample_books(&self, n: usize) -> Vec<Book> {
        self.inner.read().await.inventory.sample(n)
    }
}

/// Inserts a book and registers its authors and publisher
///
/// A duplicate identifier is logged and ignored, leaving the existing book
/// in place.
fn register_book(store: &mut MemoryStore, book: Book, price: f64, stock: u32) {
    let book_id = book.id();
    let authors = book.authors().to_vec();
    let publisher = book.publisher().cloned();

    if let Err(e) = store.inventory.add(book, price, stock) {
        tracing::debug!(book_id, error = %e, "Book rejected by inventory");
        return;
    }

    for author in &authors {
        store.register_author(author);
    }
    if let Some(publisher) = &publisher {
        store.register_publisher(publisher);
    }
}

#[async_trait]
impl BookRepository for MemoryRepository {
    async fn add_user(&self, user: User) -> AppResult<()> {
        let mut store = self.inner.write().await;
        if store.user(user.user_name()).is_some() {
            tracing::debug!(user_name = user.user_name(), "User already registered");
            return Ok(());
        }
        store.users.push(user);
        Ok(())
    }

    async fn get_user(&self, user_name: &str) -> AppResult<Option<User>> {
        Ok(self.inner.read().await.user(user_name).cloned())
    }

    async fn add_book(&self, book: Book) -> AppResult<()> {
        let mut store = self.inner.write().await;
        register_book(&mut store, book, 0.0, 0);
        Ok(())
    }

    async fn get_book(&self, id: u32) -> AppResult<Option<Book>> {
        Ok(self.inner.read().await.inventory.find(id).cloned())
    }

    async fn get_number_of_books(&self) -> AppResult<usize> {
        Ok(self.inner.read().await.inventory.len())
    }

    async fn get_first_book(&self) -> AppResult<Option<Book>> {
        Ok(self.inner.read().await.inventory.all().next().cloned())
    }

    async fn get_last_book(&self) -> AppResult<Option<Book>> {
        Ok(self.inner.read().await.inventory.all().last().cloned())
    }

    async fn get_books_by_author_id(&self, author_id: u32) -> AppResult<Vec<Book>> {
        let store = self.inner.read().await;
        Ok(store
            .inventory
            .all()
            .filter(|book| book.authors().iter().any(|a| a.id() == author_id))
            .cloned()
            .collect())
    }

    async fn get_books_by_author_name(&self, author_name: &str) -> AppResult<Vec<Book>> {
        let author_name = author_name.trim().to_lowercase();
        let store = self.inner.read().await;
        Ok(store
            .inventory
            .all()
            .filter(|book| {
                book.authors()
                    .iter()
                    .any(|a| a.full_name().to_lowercase() == author_name)
            })
            .cloned()
            .collect())
    }

    async fn get_books_by_release_year(&self, year: Option<u16>) -> AppResult<Vec<Book>> {
        let store = self.inner.read().await;
        Ok(store
            .inventory
            .all()
            .filter(|book| year.is_none() || book.release_year() == year)
            .cloned()
            .collect())
    }

    async fn get_books_by_title(&self, title: &str) -> AppResult<Vec<Book>> {
        let title = title.trim().to_lowercase();
        let store = self.inner.read().await;
        Ok(store
            .inventory
            .all()
            .filter(|book| book.title().to_lowercase() == title)
            .cloned()
            .collect())
    }

    async fn search_books_by_title(&self, fragment: &str) -> AppResult<Vec<Book>> {
        let fragment = fragment.trim().to_lowercase();
        let store = self.inner.read().await;
        Ok(store
            .inventory
            .all()
            .filter(|book| book.title().to_lowercase().contains(&fragment))
            .cloned()
            .collect())
    }

    async fn get_books_by_publisher_name(&self, publisher_name: &str) -> AppResult<Vec<Book>> {
        let store = self.inner.read().await;
        Ok(store
            .inventory
            .all()
            .filter(|book| {
                book.publisher()
                    .map(|p| p.name() == publisher_name)
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn get_all_books(&self) -> AppResult<Vec<Book>> {
        Ok(self.inner.read().await.inventory.all().cloned().collect())
    }

    async fn add_review(&self, review: Review) -> AppResult<()> {
        let user_name = review
            .user_name()
            .ok_or_else(|| AppError::repository("review not attached to a user"))?
            .to_string();

        let mut store = self.inner.write().await;
        let user = store
            .user_mut(&user_name)
            .ok_or_else(|| AppError::repository(format!("unknown user '{user_name}'")))?;
        user.add_review(review.clone());

        if let Some(book) = store.inventory.find_mut(review.book_id()) {
            book.add_review(review.clone());
        }
        store.reviews.push(review);
        Ok(())
    }

    async fn get_reviews(&self) -> AppResult<Vec<Review>> {
        Ok(self.inner.read().await.reviews.clone())
    }

    async fn add_author(&self, author: Author) -> AppResult<()> {
        self.inner.write().await.register_author(&author);
        Ok(())
    }

    async fn get_author_names(&self) -> AppResult<Vec<String>> {
        let store = self.inner.read().await;
        Ok(store
            .authors
            .iter()
            .map(|a| a.full_name().to_string())
            .collect())
    }

    async fn get_author_ids(&self) -> AppResult<Vec<u32>> {
        let store = self.inner.read().await;
        Ok(store.authors.iter().map(Author::id).collect())
    }

    async fn add_publisher(&self, publisher: Publisher) -> AppResult<()> {
        self.inner.write().await.register_publisher(&publisher);
        Ok(())
    }

    async fn get_publisher_names(&self) -> AppResult<Vec<String>> {
        let store = self.inner.read().await;
        Ok(store
            .publishers
            .iter()
            .map(|p| p.name().to_string())
            .collect())
    }

    async fn get_reading_list(&self, user_name: &str) -> AppResult<Vec<Book>> {
        let store = self.inner.read().await;
        Ok(store
            .user(user_name)
            .map(|user| user.reading_list().iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn add_to_reading_list(&self, user_name: &str, book_id: u32) -> AppResult<()> {
        let mut store = self.inner.write().await;

        let book = store
            .inventory
            .find(book_id)
            .cloned()
            .ok_or_else(|| AppError::repository(format!("unknown book {book_id}")))?;
        let user = store
            .user_mut(user_name)
            .ok_or_else(|| AppError::repository(format!("unknown user '{user_name}'")))?;

        let at_capacity = user.reading_list().len() == crate::models::READING_LIST_CAPACITY;
        let oldest = user.reading_list().first().map(Book::id);
        if user.reading_list_mut().add(book) {
            let reader = user.user_name().to_string();
            if at_capacity {
                if let Some(evicted) = oldest.and_then(|id| store.inventory.find_mut(id)) {
                    evicted.remove_reader(&reader);
                }
            }
            if let Some(book) = store.inventory.find_mut(book_id) {
                book.add_reader(&reader);
            }
        }
        Ok(())
    }
}
