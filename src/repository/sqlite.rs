use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use crate::error::{AppError, AppResult};
use crate::models::{Author, Book, Publisher, Review, User};
use crate::repository::BookRepository;

/// Schema statements, applied idempotently at startup
///
/// Field-to-column mappings are declared here once; entity internals are
/// never reflected over.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS publishers (
        name TEXT PRIMARY KEY
    )",
    "CREATE TABLE IF NOT EXISTS authors (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS books (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        release_year INTEGER,
        num_pages INTEGER,
        ebook INTEGER,
        publisher_name TEXT REFERENCES publishers(name)
    )",
    "CREATE TABLE IF NOT EXISTS books_authors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        book_id INTEGER NOT NULL REFERENCES books(id),
        author_id INTEGER NOT NULL REFERENCES authors(id)
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER NOT NULL,
        user_name TEXT PRIMARY KEY,
        password TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS reviews (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        review_text TEXT NOT NULL DEFAULT '',
        rating INTEGER NOT NULL,
        timestamp TEXT NOT NULL,
        book_id INTEGER NOT NULL REFERENCES books(id),
        user_name TEXT REFERENCES users(user_name)
    )",
    "CREATE TABLE IF NOT EXISTS user_reading_list (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        book_id INTEGER NOT NULL REFERENCES books(id),
        user_id INTEGER NOT NULL
    )",
];

/// SQLite-backed repository
///
/// Every call checks a connection out of the pool; mutating operations run
/// inside a transaction created fresh for the call and committed exactly
/// once. Queries use explicit column lists; the relational layout is an
/// implementation detail, not part of the repository contract.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Connects to the database at `url` (e.g. `sqlite://library.db?mode=rwc`)
    pub async fn connect(url: &str) -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Opens a private in-memory database
    ///
    /// The pool is pinned to a single connection; an in-memory SQLite
    /// database lives and dies with its connection.
    pub async fn in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    /// Creates the schema if it does not exist yet
    pub async fn init_schema(&self) -> AppResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::debug!("Database schema ready");
        Ok(())
    }

    /// Rebuilds a domain book from its row plus its association tables
    async fn hydrate_book(&self, row: &SqliteRow) -> AppResult<Book> {
        let id = row.get::<i64, _>("id") as u32;
        let title: String = row.get("title");
        let mut book = Book::new(id, &title)?;

        if let Some(description) = row.get::<Option<String>, _>("description") {
            book.set_description(&description);
        }
        if let Some(year) = row.get::<Option<i64>, _>("release_year") {
            book.set_release_year(year as u16);
        }
        if let Some(pages) = row.get::<Option<i64>, _>("num_pages") {
            book.set_num_pages(pages as u32);
        }
        if let Some(ebook) = row.get::<Option<bool>, _>("ebook") {
            book.set_ebook(ebook);
        }
        if let Some(publisher_name) = row.get::<Option<String>, _>("publisher_name") {
            book.set_publisher(Publisher::new(&publisher_name));
        }

        let author_rows = sqlx::query(
            "SELECT a.id, a.name FROM authors a \
             JOIN books_authors ba ON ba.author_id = a.id \
             WHERE ba.book_id = ?1 ORDER BY ba.id",
        )
        .bind(id as i64)
        .fetch_all(&self.pool)
        .await?;
        for author_row in author_rows {
            let author_id = author_row.get::<i64, _>("id") as u32;
            let name: String = author_row.get("name");
            book.add_author(Author::new(author_id, &name)?);
        }

        let review_rows = sqlx::query(
            "SELECT id, review_text, rating, timestamp, user_name \
             FROM reviews WHERE book_id = ?1 ORDER BY id",
        )
        .bind(id as i64)
        .fetch_all(&self.pool)
        .await?;
        for review_row in review_rows {
            book.add_review(hydrate_review(id, &review_row)?);
        }

        let reader_rows = sqlx::query(
            "SELECT u.user_name FROM users u \
             JOIN user_reading_list url ON url.user_id = u.id \
             WHERE url.book_id = ?1 ORDER BY url.id",
        )
        .bind(id as i64)
        .fetch_all(&self.pool)
        .await?;
        for reader_row in reader_rows {
            let user_name: String = reader_row.get("user_name");
            book.add_reader(&user_name);
        }

        Ok(book)
    }

    async fn hydrate_books(&self, rows: Vec<SqliteRow>) -> AppResult<Vec<Book>> {
        let mut books = Vec::with_capacity(rows.len());
        for row in &rows {
            books.push(self.hydrate_book(row).await?);
        }
        Ok(books)
    }

    /// The books on a user's reading list, oldest first
    async fn reading_list_books(&self, user_id: u32) -> AppResult<Vec<Book>> {
        let rows = sqlx::query(
            "SELECT b.id, b.title, b.description, b.release_year, b.num_pages, \
                    b.ebook, b.publisher_name \
             FROM books b JOIN user_reading_list url ON url.book_id = b.id \
             WHERE url.user_id = ?1 ORDER BY url.id",
        )
        .bind(user_id as i64)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_books(rows).await
    }
}

/// Rebuilds a review from its row
fn hydrate_review(book_id: u32, row: &SqliteRow) -> AppResult<Review> {
    let text: String = row.get("review_text");
    let rating = row.get::<i64, _>("rating") as u8;
    let raw_timestamp: String = row.get("timestamp");
    let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&raw_timestamp)
        .map_err(|e| AppError::repository(format!("stored timestamp unreadable: {e}")))?
        .with_timezone(&Utc);

    let mut review = Review::new(book_id, &text, rating)?
        .with_timestamp(timestamp)
        .with_id(row.get::<i64, _>("id") as u32);
    if let Some(user_name) = row.get::<Option<String>, _>("user_name") {
        review = review.with_user(&user_name);
    }
    Ok(review)
}

const SELECT_BOOK_COLUMNS: &str =
    "SELECT id, title, description, release_year, num_pages, ebook, publisher_name FROM books";

#[async_trait]
impl BookRepository for SqliteRepository {
    async fn add_user(&self, user: User) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let name_taken = sqlx::query("SELECT 1 FROM users WHERE user_name = ?1")
            .bind(user.user_name())
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if name_taken {
            tracing::debug!(user_name = user.user_name(), "User already registered");
            return Ok(());
        }

        let id_taken = sqlx::query("SELECT 1 FROM users WHERE id = ?1")
            .bind(user.id() as i64)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        let id = if id_taken {
            let row = sqlx::query("SELECT MAX(id) AS max_id FROM users")
                .fetch_one(&mut *tx)
                .await?;
            row.get::<i64, _>("max_id") + 1
        } else {
            user.id() as i64
        };

        sqlx::query("INSERT INTO users (id, user_name, password) VALUES (?1, ?2, ?3)")
            .bind(id)
            .bind(user.user_name())
            .bind(user.password())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_user(&self, user_name: &str) -> AppResult<Option<User>> {
        let user_name = user_name.trim().to_lowercase();
        let row = sqlx::query("SELECT id, user_name, password FROM users WHERE user_name = ?1")
            .bind(&user_name)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let id = row.get::<i64, _>("id") as u32;
        let password: String = row.get("password");
        let mut user = User::new(&user_name, &password)?.with_id(id);

        for book in self.reading_list_books(id).await? {
            user.reading_list_mut().add(book);
        }

        let review_rows = sqlx::query(
            "SELECT id, review_text, rating, timestamp, user_name, book_id \
             FROM reviews WHERE user_name = ?1 ORDER BY id",
        )
        .bind(&user_name)
        .fetch_all(&self.pool)
        .await?;
        for review_row in review_rows {
            let book_id = review_row.get::<i64, _>("book_id") as u32;
            user.add_review(hydrate_review(book_id, &review_row)?);
        }

        Ok(Some(user))
    }

    async fn add_book(&self, book: Book) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM books WHERE id = ?1")
            .bind(book.id() as i64)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if exists {
            tracing::debug!(book_id = book.id(), "Book already stored, ignoring");
            return Ok(());
        }

        if let Some(publisher) = book.publisher() {
            sqlx::query("INSERT OR IGNORE INTO publishers (name) VALUES (?1)")
                .bind(publisher.name())
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "INSERT INTO books (id, title, description, release_year, num_pages, ebook, publisher_name) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(book.id() as i64)
        .bind(book.title())
        .bind(book.description())
        .bind(book.release_year().map(|y| y as i64))
        .bind(book.num_pages().map(|p| p as i64))
        .bind(book.ebook())
        .bind(book.publisher().map(|p| p.name()))
        .execute(&mut *tx)
        .await?;

        for author in book.authors() {
            sqlx::query("INSERT OR IGNORE INTO authors (id, name) VALUES (?1, ?2)")
                .bind(author.id() as i64)
                .bind(author.full_name())
                .execute(&mut *tx)
                .await?;
            sqlx::query("INSERT INTO books_authors (book_id, author_id) VALUES (?1, ?2)")
                .bind(book.id() as i64)
                .bind(author.id() as i64)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_book(&self, id: u32) -> AppResult<Option<Book>> {
        let row = sqlx::query(&format!("{SELECT_BOOK_COLUMNS} WHERE id = ?1"))
            .bind(id as i64)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(self.hydrate_book(&row).await?)),
            None => Ok(None),
        }
    }

    async fn get_number_of_books(&self) -> AppResult<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as usize)
    }

    async fn get_first_book(&self) -> AppResult<Option<Book>> {
        let row = sqlx::query(&format!("{SELECT_BOOK_COLUMNS} ORDER BY id LIMIT 1"))
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(self.hydrate_book(&row).await?)),
            None => Ok(None),
        }
    }

    async fn get_last_book(&self) -> AppResult<Option<Book>> {
        let row = sqlx::query(&format!("{SELECT_BOOK_COLUMNS} ORDER BY id DESC LIMIT 1"))
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(self.hydrate_book(&row).await?)),
            None => Ok(None),
        }
    }

    async fn get_books_by_author_id(&self, author_id: u32) -> AppResult<Vec<Book>> {
        let rows = sqlx::query(
            "SELECT b.id, b.title, b.description, b.release_year, b.num_pages, \
                    b.ebook, b.publisher_name \
             FROM books b JOIN books_authors ba ON ba.book_id = b.id \
             WHERE ba.author_id = ?1 ORDER BY b.id",
        )
        .bind(author_id as i64)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_books(rows).await
    }

    async fn get_books_by_author_name(&self, author_name: &str) -> AppResult<Vec<Book>> {
        let rows = sqlx::query(
            "SELECT DISTINCT b.id, b.title, b.description, b.release_year, b.num_pages, \
                    b.ebook, b.publisher_name \
             FROM books b \
             JOIN books_authors ba ON ba.book_id = b.id \
             JOIN authors a ON a.id = ba.author_id \
             WHERE LOWER(a.name) = LOWER(?1) ORDER BY b.id",
        )
        .bind(author_name.trim())
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_books(rows).await
    }

    async fn get_books_by_release_year(&self, year: Option<u16>) -> AppResult<Vec<Book>> {
        let rows = match year {
            None => {
                sqlx::query(&format!("{SELECT_BOOK_COLUMNS} ORDER BY id"))
                    .fetch_all(&self.pool)
                    .await?
            }
            Some(year) => {
                sqlx::query(&format!(
                    "{SELECT_BOOK_COLUMNS} WHERE release_year = ?1 ORDER BY id"
                ))
                .bind(year as i64)
                .fetch_all(&self.pool)
                .await?
            }
        };
        self.hydrate_books(rows).await
    }

    async fn get_books_by_title(&self, title: &str) -> AppResult<Vec<Book>> {
        let rows = sqlx::query(&format!(
            "{SELECT_BOOK_COLUMNS} WHERE LOWER(title) = LOWER(?1) ORDER BY id"
        ))
        .bind(title.trim())
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_books(rows).await
    }

    async fn search_books_by_title(&self, fragment: &str) -> AppResult<Vec<Book>> {
        let rows = sqlx::query(&format!(
            "{SELECT_BOOK_COLUMNS} WHERE title LIKE '%' || ?1 || '%' ORDER BY id"
        ))
        .bind(fragment.trim())
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_books(rows).await
    }

    async fn get_books_by_publisher_name(&self, publisher_name: &str) -> AppResult<Vec<Book>> {
        let rows = sqlx::query(&format!(
            "{SELECT_BOOK_COLUMNS} WHERE publisher_name = ?1 ORDER BY id"
        ))
        .bind(publisher_name)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_books(rows).await
    }

    async fn get_all_books(&self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query(&format!("{SELECT_BOOK_COLUMNS} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        self.hydrate_books(rows).await
    }

    async fn add_review(&self, review: Review) -> AppResult<()> {
        let user_name = review
            .user_name()
            .ok_or_else(|| AppError::repository("review not attached to a user"))?
            .to_string();

        let mut tx = self.pool.begin().await?;
        let user_known = sqlx::query("SELECT 1 FROM users WHERE user_name = ?1")
            .bind(&user_name)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !user_known {
            return Err(AppError::repository(format!("unknown user '{user_name}'")));
        }

        sqlx::query(
            "INSERT INTO reviews (review_text, rating, timestamp, book_id, user_name) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(review.text())
        .bind(review.rating() as i64)
        .bind(review.timestamp().to_rfc3339())
        .bind(review.book_id() as i64)
        .bind(&user_name)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_reviews(&self) -> AppResult<Vec<Review>> {
        let rows = sqlx::query(
            "SELECT id, review_text, rating, timestamp, user_name, book_id \
             FROM reviews ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| hydrate_review(row.get::<i64, _>("book_id") as u32, row))
            .collect()
    }

    async fn add_author(&self, author: Author) -> AppResult<()> {
        sqlx::query("INSERT OR IGNORE INTO authors (id, name) VALUES (?1, ?2)")
            .bind(author.id() as i64)
            .bind(author.full_name())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_author_names(&self) -> AppResult<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM authors ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("name")).collect())
    }

    async fn get_author_ids(&self) -> AppResult<Vec<u32>> {
        let rows = sqlx::query("SELECT id FROM authors ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| row.get::<i64, _>("id") as u32)
            .collect())
    }

    async fn add_publisher(&self, publisher: Publisher) -> AppResult<()> {
        sqlx::query("INSERT OR IGNORE INTO publishers (name) VALUES (?1)")
            .bind(publisher.name())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_publisher_names(&self) -> AppResult<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM publishers ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("name")).collect())
    }

    async fn get_reading_list(&self, user_name: &str) -> AppResult<Vec<Book>> {
        let user_name = user_name.trim().to_lowercase();
        let row = sqlx::query("SELECT id FROM users WHERE user_name = ?1")
            .bind(&user_name)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                self.reading_list_books(row.get::<i64, _>("id") as u32)
                    .await
            }
            None => Ok(Vec::new()),
        }
    }

    async fn add_to_reading_list(&self, user_name: &str, book_id: u32) -> AppResult<()> {
        let user_name = user_name.trim().to_lowercase();
        let mut tx = self.pool.begin().await?;

        let user_row = sqlx::query("SELECT id FROM users WHERE user_name = ?1")
            .bind(&user_name)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::repository(format!("unknown user '{user_name}'")))?;
        let user_id = user_row.get::<i64, _>("id");

        let book_known = sqlx::query("SELECT 1 FROM books WHERE id = ?1")
            .bind(book_id as i64)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !book_known {
            return Err(AppError::repository(format!("unknown book {book_id}")));
        }

        let already_listed =
            sqlx::query("SELECT 1 FROM user_reading_list WHERE user_id = ?1 AND book_id = ?2")
                .bind(user_id)
                .bind(book_id as i64)
                .fetch_optional(&mut *tx)
                .await?
                .is_some();
        if already_listed {
            return Ok(());
        }

        // Evict the oldest entry at capacity
        let count_row =
            sqlx::query("SELECT COUNT(*) AS n FROM user_reading_list WHERE user_id = ?1")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;
        if count_row.get::<i64, _>("n") >= crate::models::READING_LIST_CAPACITY as i64 {
            sqlx::query(
                "DELETE FROM user_reading_list WHERE id = \
                 (SELECT MIN(id) FROM user_reading_list WHERE user_id = ?1)",
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("INSERT INTO user_reading_list (book_id, user_id) VALUES (?1, ?2)")
            .bind(book_id as i64)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
