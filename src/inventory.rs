use std::collections::{BTreeMap, HashMap};

use rand::seq::SliceRandom;

use crate::error::{AppError, AppResult};
use crate::models::Book;

/// A catalog entry: the book plus optional shop metadata
#[derive(Debug, Clone)]
struct InventoryRecord {
    book: Book,
    price: f64,
    stock: u32,
}

/// The in-memory book catalog, ordered by book identifier
///
/// Holds the authoritative copy of every book for the in-memory backend.
/// Three views stay consistent under every mutation: the id-keyed record
/// map (which also provides the ordered traversal), and the exact-title
/// index. Duplicate identifiers are rejected; a later book with the same
/// title takes over the title index entry.
///
/// Not safe for concurrent mutation; callers serialize writes externally
/// (see [`MemoryRepository`]).
///
/// [`MemoryRepository`]: crate::repository::MemoryRepository
#[derive(Debug, Default)]
pub struct BooksInventory {
    records: BTreeMap<u32, InventoryRecord>,
    titles: HashMap<String, u32>,
}

impl BooksInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a book with optional price and stock metadata
    ///
    /// Fails when the price is negative or not a number, or when a book
    /// with the same identifier is already present.
    pub fn add(&mut self, book: Book, price: f64, stock: u32) -> AppResult<()> {
        if !price.is_finite() || price < 0.0 {
            return Err(AppError::invalid("price must be non-negative"));
        }
        if self.records.contains_key(&book.id()) {
            return Err(AppError::invalid(format!(
                "book {} is already in the inventory",
                book.id()
            )));
        }

        self.titles.insert(book.title().to_string(), book.id());
        self.records.insert(book.id(), InventoryRecord { book, price, stock });
        Ok(())
    }

    /// Looks up a book by identifier
    pub fn find(&self, id: u32) -> Option<&Book> {
        self.records.get(&id).map(|record| &record.book)
    }

    pub(crate) fn find_mut(&mut self, id: u32) -> Option<&mut Book> {
        self.records.get_mut(&id).map(|record| &mut record.book)
    }

    /// Looks up a book by exact title
    pub fn find_by_title(&self, title: &str) -> Option<&Book> {
        self.titles.get(title).and_then(|id| self.find(*id))
    }

    pub fn price(&self, id: u32) -> Option<f64> {
        self.records.get(&id).map(|record| record.price)
    }

    pub fn stock(&self, id: u32) -> Option<u32> {
        self.records.get(&id).map(|record| record.stock)
    }

    /// All books in ascending identifier order
    pub fn all(&self) -> impl Iterator<Item = &Book> {
        self.records.values().map(|record| &record.book)
    }

    /// Uniformly samples up to `n` distinct books
    ///
    /// A request larger than the catalog returns every book rather than
    /// retrying forever.
    pub fn sample(&self, n: usize) -> Vec<Book> {
        let books: Vec<&Book> = self.all().collect();
        let mut rng = rand::thread_rng();
        books
            .choose_multiple(&mut rng, n.min(books.len()))
            .map(|book| (*book).clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
