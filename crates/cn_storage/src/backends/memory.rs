use async_trait::async_trait;
use cn_core::{Article, ArticleStore, IndexRecord, Result, StoredArticle, VectorIndex};
use std::collections::HashMap;
use tokio::sync::RwLock;
use crate::StorageBackend;

#[derive(Default)]
pub struct MemoryArticleStore {
    articles: RwLock<Vec<StoredArticle>>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_articles(articles: Vec<StoredArticle>) -> Self {
        Self {
            articles: RwLock::new(articles),
        }
    }

    pub async fn insert(&self, article: &Article) {
        let mut articles = self.articles.write().await;
        let row = StoredArticle::from(article);
        if let Some(existing) = articles.iter_mut().find(|a| a.url == row.url) {
            *existing = row;
        } else {
            articles.push(row);
        }
    }
}

#[async_trait]
impl StorageBackend for MemoryArticleStore {
    fn get_error_message() -> &'static str {
        "Memory article store should always be available"
    }

    async fn from_env() -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn list_articles(&self) -> Result<Vec<StoredArticle>> {
        Ok(self.articles.read().await.clone())
    }
}

/// Vector index kept in process, keyed by namespace then document id.
#[derive(Default)]
pub struct MemoryIndex {
    namespaces: RwLock<HashMap<String, HashMap<String, IndexRecord>>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, namespace: &str, id: &str) -> Option<IndexRecord> {
        self.namespaces
            .read()
            .await
            .get(namespace)
            .and_then(|records| records.get(id))
            .cloned()
    }

    pub async fn len(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .await
            .get(namespace)
            .map_or(0, HashMap::len)
    }
}

#[async_trait]
impl StorageBackend for MemoryIndex {
    fn get_error_message() -> &'static str {
        "Memory index should always be available"
    }

    async fn from_env() -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upsert(&self, namespace: &str, records: Vec<IndexRecord>) -> Result<()> {
        let mut namespaces = self.namespaces.write().await;
        let entries = namespaces.entry(namespace.to_string()).or_default();
        for record in records {
            entries.insert(record.id.clone(), record);
        }
        Ok(())
    }
}
