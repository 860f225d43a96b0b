use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// OMDb API key; calls fail with a configuration error when absent
    #[serde(default)]
    pub omdb_api_key: Option<String>,

    /// OMDb API base URL
    #[serde(default = "default_omdb_api_url")]
    pub omdb_api_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Staleness window for cached API responses
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// How often the background sweeper drops expired cache entries
    #[serde(default = "default_cache_sweep_interval_secs")]
    pub cache_sweep_interval_secs: u64,

    /// Extra attempts for a failed upstream request
    #[serde(default = "default_fetch_retries")]
    pub fetch_retries: u32,

    /// First backoff delay, doubled on every further attempt
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Detail fetches issued together while filtering by genre
    #[serde(default = "default_genre_batch_size")]
    pub genre_batch_size: usize,

    /// Browsing sessions untouched this long are evicted
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,

    /// JSON file holding the persisted watchlist, favorites and watched lists
    #[serde(default = "default_library_path")]
    pub library_path: String,

    /// Optional JSON file replacing the built-in actor dataset
    #[serde(default)]
    pub actor_data_path: Option<String>,
}

fn default_omdb_api_url() -> String {
    "https://www.omdbapi.com".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cache_ttl_secs() -> u64 {
    600
}

fn default_cache_sweep_interval_secs() -> u64 {
    60
}

fn default_fetch_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_genre_batch_size() -> usize {
    10
}

fn default_session_idle_secs() -> u64 {
    1800
}

fn default_library_path() -> String {
    "library.json".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            omdb_api_key: None,
            omdb_api_url: default_omdb_api_url(),
            host: default_host(),
            port: default_port(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_sweep_interval_secs: default_cache_sweep_interval_secs(),
            fetch_retries: default_fetch_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            genre_batch_size: default_genre_batch_size(),
            session_idle_secs: default_session_idle_secs(),
            library_path: default_library_path(),
            actor_data_path: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if config.genre_batch_size == 0 {
            anyhow::bail!("GENRE_BATCH_SIZE must be at least 1");
        }
        if config.cache_sweep_interval_secs == 0 {
            anyhow::bail!("CACHE_SWEEP_INTERVAL_SECS must be at least 1");
        }
        if config.session_idle_secs == 0 {
            anyhow::bail!("SESSION_IDLE_SECS must be at least 1");
        }

        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval_secs)
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}
