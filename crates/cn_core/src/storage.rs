use async_trait::async_trait;
use std::collections::HashSet;
use crate::types::{IndexRecord, StoredArticle};
use crate::Result;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// All previously ingested articles
    async fn list_articles(&self) -> Result<Vec<StoredArticle>>;

    /// URLs of previously ingested articles; rows without a URL are ignored
    async fn existing_urls(&self) -> Result<HashSet<String>> {
        Ok(self
            .list_articles()
            .await?
            .into_iter()
            .filter_map(|article| article.url)
            .collect())
    }
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    fn name(&self) -> &str;

    /// Insert or replace records by id within a namespace
    async fn upsert(&self, namespace: &str, records: Vec<IndexRecord>) -> Result<()>;
}
