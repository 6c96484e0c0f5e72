use serde::Deserialize;

/// Which repository backend to stand up
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryKind {
    Memory,
    Database,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Repository backend selector
    #[serde(default = "default_repository")]
    pub repository: RepositoryKind,

    /// SQLite database connection URL (database backend only)
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// How many books a recommendation request returns by default
    #[serde(default = "default_recommendation_count")]
    pub recommendation_count: usize,
}

fn default_repository() -> RepositoryKind {
    RepositoryKind::Memory
}

fn default_database_url() -> String {
    "sqlite://library.db?mode=rwc".to_string()
}

fn default_recommendation_count() -> usize {
    crate::services::DEFAULT_RECOMMENDATION_COUNT
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository: default_repository(),
            database_url: default_database_url(),
            recommendation_count: default_recommendation_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.repository, RepositoryKind::Memory);
        assert_eq!(config.database_url, "sqlite://library.db?mode=rwc");
        assert_eq!(config.recommendation_count, 10);
    }

    #[test]
    fn test_repository_kind_deserializes_lowercase() {
        let kind: RepositoryKind = serde_json::from_str("\"database\"").unwrap();
        assert_eq!(kind, RepositoryKind::Database);
    }
}
