use std::time::Duration;

use tracing::info;

use crate::config::Config;
use crate::dataset;
use crate::db::{QuoteWatch, Repository};
use crate::error::{AppError, Result};
use crate::models::{CountView, NewQuote, Preferences, Quote, QueryFilter};
use crate::scheduler::{NotificationSink, Scheduler};

/// Entry point for a UI: every screen talks to the core through this.
pub struct App<S: NotificationSink> {
    pub repository: Repository,
    pub scheduler: Scheduler<S>,
    username: String,
    defaults: Preferences,
    watch_interval: Duration,
}

impl<S: NotificationSink> App<S> {
    /// Open the database named in `config` and seed it on first run.
    pub async fn new(config: &Config, sink: S) -> Result<Self> {
        let repository = Repository::new(&config.db_path).await?;
        Self::with_repository(config, repository, sink).await
    }

    pub async fn with_repository(config: &Config, repository: Repository, sink: S) -> Result<Self> {
        repository.seed_if_empty(dataset::bundled()?).await?;

        let defaults = config.default_preferences();
        let scheduler = Scheduler::new(repository.clone(), defaults.clone(), sink);

        Ok(Self {
            repository,
            scheduler,
            username: config.username.clone(),
            defaults,
            watch_interval: Duration::from_millis(config.watch_interval_ms),
        })
    }

    pub async fn preferences(&self) -> Result<Preferences> {
        self.repository.load_preferences(&self.defaults).await
    }

    pub async fn title(&self) -> Result<String> {
        self.repository.title(&self.defaults).await
    }

    /// Shuffled quotes for the saved search.
    pub async fn current_quotes(&self) -> Result<Vec<Quote>> {
        let prefs = self.preferences().await?;
        self.repository
            .query_by_filter(&prefs.query, &prefs.filter)
            .await
    }

    /// Run a search and remember it, with its title, for the next launch.
    /// Nothing is saved if the filter is not recognized.
    pub async fn apply_search(&self, query: &str, filter: &str) -> Result<(String, Vec<Quote>)> {
        let kind: QueryFilter = filter.parse()?;
        let quotes = self.repository.query(query, kind).await?;
        let title = self.repository.save_search(query, kind.label()).await?;
        info!(%title, results = quotes.len(), "Applied search");
        Ok((title, quotes))
    }

    /// Add a quote attributed to the local user.
    pub async fn add_quote(&self, mut quote: NewQuote) -> Result<Quote> {
        if quote.quote_text.trim().is_empty() || quote.author.trim().is_empty() {
            return Err(anyhow::anyhow!("Quote text and author are required").into());
        }
        quote.contributed_by = Some(self.username.clone());
        self.repository.insert(quote).await
    }

    pub async fn my_quotes(&self) -> Result<Vec<Quote>> {
        self.repository.quotes_contributed_by(&self.username).await
    }

    pub async fn count_mine(&self) -> Result<i64> {
        self.repository
            .count_view(&self.username, CountView::Contributed)
            .await
    }

    pub async fn toggle_favorite(&self, id: i64) -> Result<bool> {
        let quote = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(AppError::NotFound(id))?;
        let favorite = !quote.favorite;
        self.repository.set_favorite(id, favorite).await?;
        Ok(favorite)
    }

    pub async fn delete_quote(&self, id: i64) -> Result<()> {
        self.repository.set_deleted(id, true).await
    }

    pub async fn restore_quote(&self, id: i64) -> Result<()> {
        self.repository.set_deleted(id, false).await
    }

    /// Keep a displayed quote fresh until the returned watch is dropped.
    pub fn watch_quote(&self, id: i64) -> QuoteWatch {
        QuoteWatch::spawn(self.repository.clone(), id, self.watch_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::LogNotifier;

    async fn app() -> App<LogNotifier> {
        let config = Config {
            db_path: ":memory:".to_string(),
            username: "sam".to_string(),
            watch_interval_ms: 50,
            defaults: Default::default(),
        };
        let repo = Repository::in_memory().await.unwrap();
        App::with_repository(&config, repo, LogNotifier).await.unwrap()
    }

    #[tokio::test]
    async fn test_startup_seeds_and_uses_default_search() {
        let app = app().await;
        assert_eq!(app.title().await.unwrap(), "Subject: Top 100");

        let quotes = app.current_quotes().await.unwrap();
        assert!(!quotes.is_empty());
        assert!(quotes.iter().all(|q| q.subjects.contains("Top 100")));
    }

    #[tokio::test]
    async fn test_apply_search_persists_title() {
        let app = app().await;
        let (title, quotes) = app.apply_search("Confucius", "author").await.unwrap();

        assert_eq!(title, "Author: Confucius");
        assert_eq!(quotes.len(), 1);
        assert_eq!(app.title().await.unwrap(), title);

        let prefs = app.preferences().await.unwrap();
        assert_eq!((prefs.query.as_str(), prefs.filter.as_str()), ("Confucius", "Author"));
    }

    #[tokio::test]
    async fn test_bad_search_keeps_previous_one() {
        let app = app().await;
        app.apply_search("Confucius", "Author").await.unwrap();

        let err = app.apply_search("blue", "Color").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidFilter(_)));
        assert_eq!(app.title().await.unwrap(), "Author: Confucius");
    }

    #[tokio::test]
    async fn test_added_quotes_belong_to_user() {
        let app = app().await;
        let quote = app
            .add_quote(NewQuote {
                quote_text: "Ship it.".into(),
                author: "Sam".into(),
                contributed_by: Some("someone else".into()),
                ..NewQuote::default()
            })
            .await
            .unwrap();

        assert_eq!(quote.contributed_by.as_deref(), Some("sam"));
        assert_eq!(app.count_mine().await.unwrap(), 1);
        assert_eq!(app.my_quotes().await.unwrap(), vec![quote]);
    }

    #[tokio::test]
    async fn test_add_quote_requires_text_and_author() {
        let app = app().await;
        let err = app
            .add_quote(NewQuote {
                quote_text: "   ".into(),
                author: "Sam".into(),
                ..NewQuote::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Other(_)));
    }

    #[tokio::test]
    async fn test_toggle_favorite_and_soft_delete() {
        let app = app().await;
        assert!(app.toggle_favorite(1).await.unwrap());
        assert!(!app.toggle_favorite(1).await.unwrap());
        assert!(matches!(app.toggle_favorite(999).await, Err(AppError::NotFound(999))));

        app.delete_quote(1).await.unwrap();
        assert_eq!(app.repository.count("", "deleted").await.unwrap(), 1);
        app.restore_quote(1).await.unwrap();
        assert_eq!(app.repository.count("", "deleted").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_watch_quote_tracks_edits() {
        let app = app().await;
        let mut watch = app.watch_quote(2);
        let before = watch.changed().await.unwrap();

        let mut edited = before.clone();
        edited.quote_text = "Edited".into();
        app.repository.upsert(edited.clone(), true).await.unwrap();

        let after = tokio::time::timeout(Duration::from_secs(5), watch.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after, edited);
    }
}
