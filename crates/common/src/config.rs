//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Session configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Points economy configuration.
    #[serde(default)]
    pub economy: EconomyConfig,
    /// News ingestion configuration.
    #[serde(default)]
    pub news: NewsConfig,
    /// Language model configuration.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Cron endpoint configuration.
    #[serde(default)]
    pub cron: CronConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of the site.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Whether the cookie carries the `Secure` attribute.
    #[serde(default = "default_true")]
    pub secure_cookies: bool,
    /// Session lifetime in days.
    #[serde(default = "default_session_days")]
    pub session_max_age_days: i64,
}

/// Points economy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EconomyConfig {
    /// Points granted for creating a post.
    #[serde(default = "default_post_reward")]
    pub post_reward: i64,
    /// Points granted for creating a comment.
    #[serde(default = "default_comment_reward")]
    pub comment_reward: i64,
    /// Points granted on the first sign-in of a UTC day.
    #[serde(default = "default_daily_login_bonus")]
    pub daily_login_bonus: i64,
    /// Points charged for sending a direct message.
    #[serde(default = "default_message_cost")]
    pub message_cost: i64,
}

/// News ingestion configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
    /// Listing page to scrape. Ingestion is disabled when unset.
    #[serde(default)]
    pub source_url: Option<String>,
    /// Regex tested against each `a[href]` on the listing page; capture group 1,
    /// or the whole match, is the article link.
    #[serde(default = "default_article_link_pattern")]
    pub article_link_pattern: String,
    /// Username of the profile that authors news posts.
    #[serde(default = "default_news_author")]
    pub author_username: String,
    /// Maximum number of article characters sent to the language model.
    #[serde(default = "default_max_article_chars")]
    pub max_article_chars: usize,
    /// User agent used when fetching pages.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Fetch timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
}

/// Language model configuration (`OpenAI`-compatible chat completions).
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// API key. The news job is disabled when unset.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model name.
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// API base URL.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
}

/// Cron endpoint configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CronConfig {
    /// Shared secret expected in the `secret` query parameter.
    #[serde(default)]
    pub secret: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_true() -> bool {
    true
}

fn default_cookie_name() -> String {
    "fandom_session".to_string()
}

const fn default_session_days() -> i64 {
    30
}

const fn default_post_reward() -> i64 {
    10
}

const fn default_comment_reward() -> i64 {
    2
}

const fn default_daily_login_bonus() -> i64 {
    20
}

const fn default_message_cost() -> i64 {
    10
}

fn default_article_link_pattern() -> String {
    r"^[^#?]*/article/[^#?]+".to_string()
}

fn default_news_author() -> String {
    "kpopnews".to_string()
}

const fn default_max_article_chars() -> usize {
    6000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; FandomNewsBot/1.0)".to_string()
}

const fn default_fetch_timeout() -> u64 {
    15
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            secure_cookies: default_true(),
            session_max_age_days: default_session_days(),
        }
    }
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            post_reward: default_post_reward(),
            comment_reward: default_comment_reward(),
            daily_login_bonus: default_daily_login_bonus(),
            message_cost: default_message_cost(),
        }
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            source_url: None,
            article_link_pattern: default_article_link_pattern(),
            author_username: default_news_author(),
            max_article_chars: default_max_article_chars(),
            user_agent: default_user_agent(),
            timeout_secs: default_fetch_timeout(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_llm_model(),
            base_url: default_llm_base_url(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present, exported into the process environment)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `FANDOM_ENV`)
    /// 4. Environment variables with `FANDOM__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(error = %e, "No .env file loaded");
        }

        let env = std::env::var("FANDOM_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("FANDOM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("FANDOM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_defaults() {
        let economy = EconomyConfig::default();
        assert_eq!(economy.post_reward, 10);
        assert_eq!(economy.comment_reward, 2);
        assert_eq!(economy.daily_login_bonus, 20);
        assert_eq!(economy.message_cost, 10);

        let news = NewsConfig::default();
        assert!(news.source_url.is_none());
        assert_eq!(news.author_username, "kpopnews");

        assert_eq!(AuthConfig::default().cookie_name, "fandom_session");
        assert!(CronConfig::default().secret.is_none());
    }

    #[test]
    fn test_default_article_pattern_compiles() {
        let re = regex::Regex::new(&default_article_link_pattern()).unwrap();
        let hit = re.find("/article/ive-comeback?ref=home").map(|m| m.as_str());
        assert_eq!(hit, Some("/article/ive-comeback"));
        assert!(!re.is_match("/about"));
    }
}
