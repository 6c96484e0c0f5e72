use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::error::AppResult;
use crate::models::Book;
use crate::repository::BookRepository;

/// Score added for each book sharing an author with a reading-list book
pub const SHARED_AUTHOR_WEIGHT: u32 = 4;
/// Score added for each matching release-year bucket (year, year-1, year+1)
pub const RELEASE_YEAR_WEIGHT: u32 = 1;
/// Score added for each book sharing a publisher with a reading-list book
pub const SHARED_PUBLISHER_WEIGHT: u32 = 2;

pub const DEFAULT_RECOMMENDATION_COUNT: usize = 10;

/// Direction candidates are ranked in before truncation
///
/// `LeastRelevantFirst` reproduces the system's historical behavior: the
/// candidate list is sorted by ascending score, so the weakest matches are
/// returned first. Switch to `MostRelevantFirst` to rank strongest matches
/// first. Ties keep first-encountered order either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ranking {
    #[default]
    LeastRelevantFirst,
    MostRelevantFirst,
}

/// A candidate book with its accumulated relevance score
#[derive(Debug)]
struct Candidate {
    book: Book,
    score: u32,
}

/// Generates personalized book recommendations
///
/// Scores every catalog book against the user's reading list (shared
/// authors, release-year proximity, shared publisher) and backfills with
/// uniform random sampling when too few candidates score at all. Runs
/// entirely against the [`BookRepository`] interface, so the in-memory and
/// database backends produce the same recommendations for the same data.
pub struct Recommender {
    repo: Arc<dyn BookRepository>,
    ranking: Ranking,
}

impl Recommender {
    pub fn new(repo: Arc<dyn BookRepository>) -> Self {
        Self {
            repo,
            ranking: Ranking::default(),
        }
    }

    /// Overrides the ranking direction
    pub fn with_ranking(mut self, ranking: Ranking) -> Self {
        self.ranking = ranking;
        self
    }

    /// Recommends up to `count` books for the named user
    ///
    /// An anonymous caller (`None`), an unknown user name, or a user with an
    /// empty reading list all get a uniform random sample of the catalog.
    /// "No data" conditions never fail; the result is simply smaller, down
    /// to empty on an empty catalog.
    pub async fn recommend(
        &self,
        user_name: Option<&str>,
        count: usize,
    ) -> AppResult<Vec<Book>> {
        let reading_list = match user_name {
            Some(name) => match self.repo.get_user(name).await? {
                Some(user) => user.reading_list().iter().cloned().collect::<Vec<_>>(),
                None => Vec::new(),
            },
            None => Vec::new(),
        };

        if reading_list.is_empty() {
            tracing::debug!(user = ?user_name, count, "No reading list, sampling catalog");
            return self.random_books(count, &HashSet::new()).await;
        }

        let mut candidates = self.score_candidates(&reading_list).await?;
        match self.ranking {
            Ranking::LeastRelevantFirst => candidates.sort_by_key(|c| c.score),
            Ranking::MostRelevantFirst => candidates.sort_by_key(|c| Reverse(c.score)),
        }

        let scored = candidates.len();
        let mut picks: Vec<Book> = candidates
            .into_iter()
            .take(count)
            .map(|c| c.book)
            .collect();

        if picks.len() < count {
            let mut exclude: HashSet<u32> = picks.iter().map(Book::id).collect();
            exclude.extend(reading_list.iter().map(Book::id));
            let backfill = self
                .random_books(count - picks.len(), &exclude)
                .await?;
            picks.extend(backfill);
        }

        tracing::debug!(
            user = ?user_name,
            scored,
            returned = picks.len(),
            "Recommendations computed"
        );
        Ok(picks)
    }

    /// Accumulates relevance scores for every candidate outside the list
    ///
    /// A candidate may be found through several reading-list books and
    /// several signals; every co-occurrence adds its weight. Candidates are
    /// kept in first-encountered order so the rank sort breaks ties stably.
    async fn score_candidates(&self, reading_list: &[Book]) -> AppResult<Vec<Candidate>> {
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut positions: HashMap<u32, usize> = HashMap::new();

        let mut bump = |book: Book, weight: u32| match positions.get(&book.id()) {
            Some(&at) => candidates[at].score += weight,
            None => {
                positions.insert(book.id(), candidates.len());
                candidates.push(Candidate { book, score: weight });
            }
        };
        let on_list = |book: &Book| reading_list.iter().any(|listed| listed == book);

        for listed in reading_list {
            for author in listed.authors() {
                for book in self.repo.get_books_by_author_id(author.id()).await? {
                    if !on_list(&book) {
                        bump(book, SHARED_AUTHOR_WEIGHT);
                    }
                }
            }

            if let Some(year) = listed.release_year() {
                let buckets = [Some(year), year.checked_sub(1), year.checked_add(1)];
                for bucket in buckets.into_iter().flatten() {
                    for book in self.repo.get_books_by_release_year(Some(bucket)).await? {
                        if !on_list(&book) {
                            bump(book, RELEASE_YEAR_WEIGHT);
                        }
                    }
                }
            }

            if let Some(publisher) = listed.publisher() {
                for book in self
                    .repo
                    .get_books_by_publisher_name(publisher.name())
                    .await?
                {
                    if !on_list(&book) {
                        bump(book, SHARED_PUBLISHER_WEIGHT);
                    }
                }
            }
        }

        Ok(candidates)
    }

    /// Uniformly samples up to `count` distinct books, skipping `exclude`
    ///
    /// Capped at the number of eligible books; never retries indefinitely.
    async fn random_books(
        &self,
        count: usize,
        exclude: &HashSet<u32>,
    ) -> AppResult<Vec<Book>> {
        let eligible: Vec<Book> = self
            .repo
            .get_all_books()
            .await?
            .into_iter()
            .filter(|book| !exclude.contains(&book.id()))
            .collect();

        let mut rng = rand::thread_rng();
        Ok(eligible
            .choose_multiple(&mut rng, count.min(eligible.len()))
            .cloned()
            .collect())
    }
}
