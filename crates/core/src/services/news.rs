//! Scheduled news ingestion.
//!
//! One run picks the newest article on the configured listing page that is
//! not yet a post, has the language model translate and summarize it into
//! Brazilian Portuguese, and publishes the result as a news post.

use std::sync::Arc;

use chrono::Utc;
use fandom_common::{
    AppError, AppResult, IdGenerator, PageSource,
    config::{CronConfig, NewsConfig},
    scrape::{self, ScrapedArticle},
};
use fandom_db::{
    entities::post,
    repositories::{PostRepository, ProfileRepository},
};
use regex::Regex;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use url::Url;

use crate::services::llm::LlmClient;

const MAX_TITLE_CHARS: usize = 150;
const MAX_CONTENT_CHARS: usize = 10_000;

const SYSTEM_PROMPT: &str = "Você é editor de um portal brasileiro de K-pop e K-drama. \
Traduza e resuma notícias para o português do Brasil em tom jornalístico e acessível. \
Responda somente com JSON no formato {\"title\": \"...\", \"content\": \"...\"}.";

/// Result of one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NewsOutcome {
    /// A news post was published.
    Created { post_id: String, source_url: String },
    /// Every article on the listing page is already a post.
    NothingNew,
}

/// Title and body the model produced.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewsDraft {
    pub title: String,
    pub content: String,
}

/// News ingestion service.
#[derive(Clone)]
pub struct NewsService {
    post_repo: PostRepository,
    profile_repo: ProfileRepository,
    pages: Arc<dyn PageSource>,
    llm: Option<Arc<dyn LlmClient>>,
    config: NewsConfig,
    secret_digest: Option<[u8; 32]>,
    id_gen: IdGenerator,
}

impl NewsService {
    /// Create a new news service. `llm` is `None` when no model is configured.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        profile_repo: ProfileRepository,
        pages: Arc<dyn PageSource>,
        llm: Option<Arc<dyn LlmClient>>,
        config: NewsConfig,
        cron: &CronConfig,
    ) -> Self {
        Self {
            post_repo,
            profile_repo,
            pages,
            llm,
            config,
            secret_digest: cron
                .secret
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(digest),
            id_gen: IdGenerator::new(),
        }
    }

    /// Check the caller's cron secret. Without a configured secret every call is refused.
    pub fn verify_secret(&self, provided: Option<&str>) -> AppResult<()> {
        let Some(expected) = self.secret_digest else {
            warn!("Cron call refused: cron.secret is not configured");
            return Err(AppError::Unauthorized);
        };
        match provided {
            Some(secret) if digest(secret) == expected => Ok(()),
            _ => Err(AppError::Unauthorized),
        }
    }

    /// Run one ingestion pass.
    pub async fn run(&self) -> AppResult<NewsOutcome> {
        let source_url = self
            .config
            .source_url
            .as_deref()
            .ok_or_else(|| AppError::Config("news.source_url is not set".to_string()))?;
        let llm = self
            .llm
            .as_ref()
            .ok_or_else(|| AppError::Config("llm.api_key is not set".to_string()))?;
        let pattern = Regex::new(&self.config.article_link_pattern)
            .map_err(|e| AppError::Config(format!("news.article_link_pattern: {e}")))?;
        let base = Url::parse(source_url)
            .map_err(|e| AppError::Config(format!("news.source_url: {e}")))?;

        let listing = self.pages.fetch(source_url).await?;
        let links = scrape::extract_links(&listing, &pattern, &base);
        if links.is_empty() {
            warn!(source_url = %source_url, "No article links found on listing page");
            return Ok(NewsOutcome::NothingNew);
        }

        let existing = self.post_repo.find_existing_source_urls(&links).await?;
        let Some(article_url) = links.into_iter().find(|l| !existing.contains(l)) else {
            info!(source_url = %source_url, "No new articles");
            return Ok(NewsOutcome::NothingNew);
        };

        let html = self.pages.fetch(&article_url).await?;
        let article = scrape::parse_article(&article_url, &html, self.config.max_article_chars);
        if article.body.is_empty() {
            return Err(AppError::ExternalService(format!(
                "article {article_url} has no text"
            )));
        }

        let answer = llm.complete(SYSTEM_PROMPT, &build_prompt(&article)).await?;
        let draft = parse_draft(&answer, article.title.as_deref());

        let author = self
            .profile_repo
            .find_by_username(&self.config.author_username)
            .await?
            .ok_or_else(|| {
                AppError::Config(format!(
                    "news author @{} does not exist",
                    self.config.author_username
                ))
            })?;

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author.id),
            group_id: Set(None),
            title: Set(scrape::truncate_chars(&draft.title, MAX_TITLE_CHARS)),
            content: Set(scrape::truncate_chars(&draft.content, MAX_CONTENT_CHARS)),
            image_url: Set(None),
            source_url: Set(Some(article_url.clone())),
            is_news: Set(true),
            is_pinned: Set(false),
            is_hidden: Set(false),
            views_count: Set(0),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };
        let post = self.post_repo.create(model).await?;
        info!(post_id = %post.id, source_url = %article_url, "News post created");

        Ok(NewsOutcome::Created {
            post_id: post.id,
            source_url: article_url,
        })
    }
}

fn digest(secret: &str) -> [u8; 32] {
    Sha256::digest(secret.as_bytes()).into()
}

fn build_prompt(article: &ScrapedArticle) -> String {
    format!(
        "Título original: {}\nFonte: {}\n\nTexto:\n{}",
        article.title.as_deref().unwrap_or("(sem título)"),
        article.url,
        article.body
    )
}

/// Read the model's JSON answer, tolerating a Markdown code fence.
///
/// Anything unparseable becomes the post body under the original title.
#[must_use]
pub fn parse_draft(answer: &str, original_title: Option<&str>) -> NewsDraft {
    let trimmed = answer.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .map_or(trimmed, str::trim);

    match serde_json::from_str::<NewsDraft>(unfenced) {
        Ok(draft) if !draft.title.trim().is_empty() && !draft.content.trim().is_empty() => {
            NewsDraft {
                title: draft.title.trim().to_string(),
                content: draft.content.trim().to_string(),
            }
        }
        _ => {
            warn!("LLM answer is not the expected JSON, using it verbatim");
            NewsDraft {
                title: original_title
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or("Notícia")
                    .to_string(),
                content: trimmed.to_string(),
            }
        }
    }
}
