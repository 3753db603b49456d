use async_trait::async_trait;
use crate::types::{Article, NewsCategory};
use crate::Result;

#[async_trait]
pub trait NewsSource: Send + Sync {
    fn name(&self) -> &str;

    /// Candidate articles currently published for a category
    async fn get_news(&self, category: NewsCategory) -> Result<Vec<Article>>;
}
