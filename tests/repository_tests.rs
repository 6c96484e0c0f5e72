//! Integration tests driving both repository backends through the same
//! scenarios. The two backends must be indistinguishable through the
//! `BookRepository` interface.

use std::collections::HashSet;
use std::sync::Arc;

use librarium::{
    Author, Book, BookRepository, MemoryRepository, Publisher, Ranking, Recommender, Review,
    SqliteRepository, User,
};

fn catalog() -> Vec<Book> {
    let mut telling = Book::new(1, "The Telling").unwrap();
    telling.add_author(Author::new(1, "Ursula K. Le Guin").unwrap());
    telling.set_release_year(2000);
    telling.set_publisher(Publisher::new("Tor"));
    telling.set_num_pages(264);

    let mut other_wind = Book::new(2, "The Other Wind").unwrap();
    other_wind.add_author(Author::new(1, "Ursula K. Le Guin").unwrap());
    other_wind.set_release_year(2001);
    other_wind.set_publisher(Publisher::new("Ace"));

    let mut leaves = Book::new(3, "House of Leaves").unwrap();
    leaves.add_author(Author::new(2, "Mark Z. Danielewski").unwrap());
    leaves.set_release_year(2000);
    leaves.set_publisher(Publisher::new("Tor"));

    let mut dune = Book::new(4, "Dune").unwrap();
    dune.add_author(Author::new(3, "Frank Herbert").unwrap());
    dune.set_release_year(1965);
    dune.set_publisher(Publisher::new("Ace"));

    let unmarked = Book::new(5, "Unmarked").unwrap();

    vec![telling, other_wind, leaves, dune, unmarked]
}

async fn populate(repo: &dyn BookRepository) {
    for book in catalog() {
        repo.add_book(book).await.unwrap();
    }
    repo.add_user(User::new("thorke", "cLQ^C#oFXloS").unwrap())
        .await
        .unwrap();
    repo.add_user(User::new("fmercury", "mvNNbc1eLA$i").unwrap().with_id(1))
        .await
        .unwrap();
}

async fn memory_repo() -> MemoryRepository {
    let repo = MemoryRepository::new();
    populate(&repo).await;
    repo
}

async fn sqlite_repo() -> SqliteRepository {
    let repo = SqliteRepository::in_memory().await.unwrap();
    repo.init_schema().await.unwrap();
    populate(&repo).await;
    repo
}

fn ids(books: &[Book]) -> Vec<u32> {
    books.iter().map(Book::id).collect()
}

async fn assert_catalog_queries(repo: &dyn BookRepository) {
    assert_eq!(repo.get_number_of_books().await.unwrap(), 5);
    assert_eq!(repo.get_first_book().await.unwrap().map(|b| b.id()), Some(1));
    assert_eq!(repo.get_last_book().await.unwrap().map(|b| b.id()), Some(5));
    assert_eq!(ids(&repo.get_all_books().await.unwrap()), vec![1, 2, 3, 4, 5]);

    // Author lookups, by id and by (case-insensitive) name
    assert_eq!(
        ids(&repo.get_books_by_author_id(1).await.unwrap()),
        vec![1, 2]
    );
    assert!(repo.get_books_by_author_id(99).await.unwrap().is_empty());
    assert_eq!(
        ids(&repo
            .get_books_by_author_name("ursula k. le guin")
            .await
            .unwrap()),
        vec![1, 2]
    );
    assert!(repo
        .get_books_by_author_name("Nobody Special")
        .await
        .unwrap()
        .is_empty());

    // Release year: exact match, no-filter sentinel, no matches
    assert_eq!(
        ids(&repo.get_books_by_release_year(Some(2000)).await.unwrap()),
        vec![1, 3]
    );
    assert_eq!(
        ids(&repo.get_books_by_release_year(None).await.unwrap()),
        vec![1, 2, 3, 4, 5]
    );
    assert!(repo
        .get_books_by_release_year(Some(1900))
        .await
        .unwrap()
        .is_empty());

    // Titles: exact (case-insensitive) and substring search
    assert_eq!(
        ids(&repo.get_books_by_title("the telling").await.unwrap()),
        vec![1]
    );
    assert!(repo.get_books_by_title("The Tell").await.unwrap().is_empty());
    assert_eq!(
        ids(&repo.search_books_by_title("the").await.unwrap()),
        vec![1, 2]
    );

    // Publishers
    assert_eq!(
        ids(&repo.get_books_by_publisher_name("Tor").await.unwrap()),
        vec![1, 3]
    );
    assert!(repo
        .get_books_by_publisher_name("Voyager")
        .await
        .unwrap()
        .is_empty());

    // Registries populated as a side effect of add_book
    let author_ids: HashSet<u32> = repo.get_author_ids().await.unwrap().into_iter().collect();
    assert_eq!(author_ids, HashSet::from([1, 2, 3]));
    let publishers: HashSet<String> = repo
        .get_publisher_names()
        .await
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(
        publishers,
        HashSet::from(["Tor".to_string(), "Ace".to_string()])
    );
}

#[tokio::test]
async fn test_catalog_queries_memory() {
    assert_catalog_queries(&memory_repo().await).await;
}

#[tokio::test]
async fn test_catalog_queries_sqlite() {
    assert_catalog_queries(&sqlite_repo().await).await;
}

async fn assert_missing_lookups_are_absent(repo: &dyn BookRepository) {
    assert!(repo.get_book(999).await.unwrap().is_none());
    assert!(repo.get_user("nobody").await.unwrap().is_none());
    assert!(repo.get_reading_list("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_lookups_memory() {
    assert_missing_lookups_are_absent(&memory_repo().await).await;
}

#[tokio::test]
async fn test_missing_lookups_sqlite() {
    assert_missing_lookups_are_absent(&sqlite_repo().await).await;
}

async fn assert_review_flow(repo: &dyn BookRepository) {
    // A review without a user, or with an unknown user, is rejected
    let orphan = Review::new(1, "marvelous", 5).unwrap();
    assert!(repo.add_review(orphan).await.is_err());
    let stranger = Review::new(1, "marvelous", 5).unwrap().with_user("nobody");
    assert!(repo.add_review(stranger).await.is_err());
    assert!(repo.get_reviews().await.unwrap().is_empty());

    let review = Review::new(1, "marvelous", 5).unwrap().with_user("thorke");
    repo.add_review(review).await.unwrap();

    let stored = repo.get_reviews().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].rating(), 5);
    assert_eq!(stored[0].text(), "marvelous");
    assert_eq!(stored[0].user_name(), Some("thorke"));

    // The review is visible from both ends of the relationship
    let book = repo.get_book(1).await.unwrap().unwrap();
    assert_eq!(book.reviews().len(), 1);
    let user = repo.get_user("thorke").await.unwrap().unwrap();
    assert_eq!(user.reviews().len(), 1);
}

#[tokio::test]
async fn test_review_flow_memory() {
    assert_review_flow(&memory_repo().await).await;
}

#[tokio::test]
async fn test_review_flow_sqlite() {
    assert_review_flow(&sqlite_repo().await).await;
}

async fn assert_reading_list_flow(repo: &dyn BookRepository) {
    repo.add_to_reading_list("thorke", 1).await.unwrap();
    repo.add_to_reading_list("thorke", 4).await.unwrap();
    repo.add_to_reading_list("thorke", 1).await.unwrap(); // duplicate, ignored

    assert_eq!(ids(&repo.get_reading_list("thorke").await.unwrap()), vec![1, 4]);

    // The book records who holds it
    let book = repo.get_book(1).await.unwrap().unwrap();
    assert_eq!(book.readers(), ["thorke".to_string()]);

    // Unknown user or book is a broken relationship
    assert!(repo.add_to_reading_list("nobody", 1).await.is_err());
    assert!(repo.add_to_reading_list("thorke", 999).await.is_err());
}

#[tokio::test]
async fn test_reading_list_flow_memory() {
    assert_reading_list_flow(&memory_repo().await).await;
}

#[tokio::test]
async fn test_reading_list_flow_sqlite() {
    assert_reading_list_flow(&sqlite_repo().await).await;
}

async fn assert_reading_list_eviction(repo: &dyn BookRepository) {
    for id in 10..21 {
        repo.add_book(Book::new(id, &format!("Filler {id}")).unwrap())
            .await
            .unwrap();
    }
    repo.add_user(User::new("hoarder", "pw123456").unwrap())
        .await
        .unwrap();

    for id in 10..21 {
        repo.add_to_reading_list("hoarder", id).await.unwrap();
    }

    let list = repo.get_reading_list("hoarder").await.unwrap();
    assert_eq!(list.len(), 10);
    // The 11th add evicted the oldest entry
    assert_eq!(list[0].id(), 11);
    assert_eq!(list[9].id(), 20);
}

#[tokio::test]
async fn test_reading_list_eviction_memory() {
    assert_reading_list_eviction(&MemoryRepository::new()).await;
}

#[tokio::test]
async fn test_reading_list_eviction_sqlite() {
    let repo = SqliteRepository::in_memory().await.unwrap();
    repo.init_schema().await.unwrap();
    assert_reading_list_eviction(&repo).await;
}

async fn assert_recommendations(repo: Arc<dyn BookRepository>) {
    repo.add_to_reading_list("thorke", 1).await.unwrap();

    // Relative to "The Telling" (Le Guin, 2000, Tor):
    //   book 2 scores 4 (author) + 1 (2001 bucket) = 5
    //   book 3 scores 1 (2000 bucket) + 2 (publisher) = 3
    // Ascending default ranks the weaker match first.
    let recommender = Recommender::new(Arc::clone(&repo));
    let picks = recommender.recommend(Some("thorke"), 2).await.unwrap();
    assert_eq!(ids(&picks), vec![3, 2]);

    let recommender = Recommender::new(Arc::clone(&repo)).with_ranking(Ranking::MostRelevantFirst);
    let picks = recommender.recommend(Some("thorke"), 2).await.unwrap();
    assert_eq!(ids(&picks), vec![2, 3]);

    // Asking for more than the scored candidates backfills with random
    // books, never the one already on the reading list.
    let recommender = Recommender::new(Arc::clone(&repo));
    let picks = recommender.recommend(Some("thorke"), 4).await.unwrap();
    assert_eq!(picks.len(), 4);
    assert!(picks.iter().all(|book| book.id() != 1));
    let distinct: HashSet<u32> = picks.iter().map(Book::id).collect();
    assert_eq!(distinct.len(), 4);

    // Unknown users sample from the whole catalog
    let picks = recommender.recommend(Some("ghost"), 3).await.unwrap();
    assert_eq!(picks.len(), 3);
}

#[tokio::test]
async fn test_recommendations_memory() {
    assert_recommendations(Arc::new(memory_repo().await)).await;
}

#[tokio::test]
async fn test_recommendations_sqlite() {
    assert_recommendations(Arc::new(sqlite_repo().await)).await;
}

/// Every read operation answers identically across the two backends.
#[tokio::test]
async fn test_backend_equivalence() {
    let memory = memory_repo().await;
    let sqlite = sqlite_repo().await;
    let backends: [&dyn BookRepository; 2] = [&memory, &sqlite];

    for repo in backends {
        repo.add_to_reading_list("fmercury", 2).await.unwrap();
        repo.add_review(Review::new(2, "windy", 4).unwrap().with_user("fmercury"))
            .await
            .unwrap();
    }

    let (a, b) = (backends[0], backends[1]);
    assert_eq!(
        ids(&a.get_all_books().await.unwrap()),
        ids(&b.get_all_books().await.unwrap())
    );
    assert_eq!(
        ids(&a.get_books_by_author_id(1).await.unwrap()),
        ids(&b.get_books_by_author_id(1).await.unwrap())
    );
    assert_eq!(
        ids(&a.get_books_by_release_year(Some(2000)).await.unwrap()),
        ids(&b.get_books_by_release_year(Some(2000)).await.unwrap())
    );
    assert_eq!(
        ids(&a.get_books_by_publisher_name("Ace").await.unwrap()),
        ids(&b.get_books_by_publisher_name("Ace").await.unwrap())
    );
    assert_eq!(
        ids(&a.get_reading_list("fmercury").await.unwrap()),
        ids(&b.get_reading_list("fmercury").await.unwrap())
    );
    assert_eq!(
        a.get_number_of_books().await.unwrap(),
        b.get_number_of_books().await.unwrap()
    );

    let (lhs, rhs) = (
        a.get_user("fmercury").await.unwrap().unwrap(),
        b.get_user("fmercury").await.unwrap().unwrap(),
    );
    assert_eq!(lhs.reviews().len(), rhs.reviews().len());
    assert_eq!(lhs.reviews()[0].text(), rhs.reviews()[0].text());
}
