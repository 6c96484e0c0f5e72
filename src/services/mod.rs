pub mod recommendations;

pub use recommendations::{
    Ranking, Recommender, DEFAULT_RECOMMENDATION_COUNT, RELEASE_YEAR_WEIGHT,
    SHARED_AUTHOR_WEIGHT, SHARED_PUBLISHER_WEIGHT,
};
