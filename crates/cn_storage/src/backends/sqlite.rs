use async_trait::async_trait;
use cn_core::{Article, ArticleStore, Error, Result, StoredArticle};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;
use std::env;
use std::str::FromStr;
use crate::StorageBackend;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS news_articles (
        id INTEGER PRIMARY KEY,
        headlines TEXT NOT NULL,
        author TEXT NOT NULL DEFAULT '',
        full_news TEXT NOT NULL DEFAULT '',
        news_url TEXT UNIQUE,
        news_img_url TEXT NOT NULL DEFAULT '',
        news_date TEXT NOT NULL DEFAULT ''
    )
    "#,
];

pub struct SQLiteStore {
    pool: SqlitePool,
}

impl SQLiteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| Error::Database(format!("Invalid database URL {}: {}", database_url, e)))?
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self { pool })
    }

    /// Record an ingested article; an existing row with the same URL is replaced.
    pub async fn insert_article(&self, article: &Article) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO news_articles
            (id, headlines, author, full_news, news_url, news_img_url, news_date)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(article.id as i64)
        .bind(&article.headline)
        .bind(&article.author)
        .bind(&article.full_text)
        .bind(&article.url)
        .bind(&article.image_url)
        .bind(&article.date)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to store article: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for SQLiteStore {
    fn get_error_message() -> &'static str {
        "SQLite database should be reachable at DATABASE_URL (default sqlite://cybernews.db)"
    }

    async fn from_env() -> Result<Self> {
        let url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://cybernews.db".to_string());
        Self::connect(&url).await
    }
}

#[async_trait]
impl ArticleStore for SQLiteStore {
    async fn list_articles(&self) -> Result<Vec<StoredArticle>> {
        let rows = sqlx::query("SELECT id, headlines, news_url FROM news_articles")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to list articles: {}", e)))?;

        rows.into_iter()
            .map(|row| {
                Ok(StoredArticle {
                    id: row
                        .try_get::<Option<i64>, _>("id")
                        .map_err(|e| Error::Database(e.to_string()))?
                        .map(|id| id as u64),
                    headline: row
                        .try_get::<Option<String>, _>("headlines")
                        .map_err(|e| Error::Database(e.to_string()))?,
                    url: row
                        .try_get::<Option<String>, _>("news_url")
                        .map_err(|e| Error::Database(e.to_string()))?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn article(id: u64, url: &str) -> Article {
        Article {
            id,
            headline: format!("Headline {}", id),
            author: "Test Author".to_string(),
            full_text: "Body".to_string(),
            url: url.to_string(),
            image_url: String::new(),
            date: "Jan 01, 2025".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sqlite_existing_urls() {
        let dir = tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("articles.db").display());
        let store = SQLiteStore::connect(&url).await.unwrap();

        store.insert_article(&article(1, "https://a.com/1")).await.unwrap();
        store.insert_article(&article(2, "https://b.com/2")).await.unwrap();
        store.insert_article(&article(3, "https://a.com/1")).await.unwrap();

        let rows = store.list_articles().await.unwrap();
        assert_eq!(rows.len(), 2);

        let urls = store.existing_urls().await.unwrap();
        assert!(urls.contains("https://a.com/1"));
        assert!(urls.contains("https://b.com/2"));
    }

    #[tokio::test]
    async fn test_rows_without_url_are_ignored() {
        let dir = tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("articles.db").display());
        let store = SQLiteStore::connect(&url).await.unwrap();

        sqlx::query("INSERT INTO news_articles (id, headlines) VALUES (9, 'legacy row')")
            .execute(&store.pool)
            .await
            .unwrap();

        assert_eq!(store.list_articles().await.unwrap().len(), 1);
        assert!(store.existing_urls().await.unwrap().is_empty());
    }
}
