use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A news article as produced by a news source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: u64,
    #[serde(rename = "headlines")]
    pub headline: String,
    pub author: String,
    #[serde(rename = "fullNews")]
    pub full_text: String,
    #[serde(rename = "newsURL")]
    pub url: String,
    #[serde(rename = "newsImgURL")]
    pub image_url: String,
    #[serde(rename = "newsDate")]
    pub date: String,
}

impl Article {
    /// Text the embedding is computed over.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.headline, self.full_text)
    }

    pub fn document_id(&self) -> String {
        self.id.to_string()
    }
}

/// A row of the article store. Rows written by older ingesters may lack a URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredArticle {
    pub id: Option<u64>,
    #[serde(rename = "headlines", default)]
    pub headline: Option<String>,
    #[serde(rename = "newsURL", default)]
    pub url: Option<String>,
}

impl From<&Article> for StoredArticle {
    fn from(article: &Article) -> Self {
        Self {
            id: Some(article.id),
            headline: Some(article.headline.clone()),
            url: Some(article.url.clone()),
        }
    }
}

/// Metadata attached to every vector in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub headlines: String,
    pub author: String,
    #[serde(rename = "fullNews")]
    pub full_news: String,
    #[serde(rename = "newsURL")]
    pub news_url: String,
    #[serde(rename = "newsImgURL")]
    pub news_img_url: String,
    #[serde(rename = "newsDate")]
    pub news_date: String,
}

impl From<&Article> for ArticleMetadata {
    fn from(article: &Article) -> Self {
        Self {
            headlines: article.headline.clone(),
            author: article.author.clone(),
            full_news: article.full_text.clone(),
            news_url: article.url.clone(),
            news_img_url: article.image_url.clone(),
            news_date: article.date.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ArticleMetadata,
}

impl IndexRecord {
    pub fn new(article: &Article, values: Vec<f32>) -> Self {
        Self {
            id: article.document_id(),
            values,
            metadata: ArticleMetadata::from(article),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NewsCategory {
    General,
    CyberAttack,
    Vulnerability,
    Malware,
    Security,
    DataBreach,
}

impl NewsCategory {
    /// Every category, in the order a pass visits them.
    pub const ALL: [NewsCategory; 6] = [
        NewsCategory::General,
        NewsCategory::CyberAttack,
        NewsCategory::Vulnerability,
        NewsCategory::Malware,
        NewsCategory::Security,
        NewsCategory::DataBreach,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NewsCategory::General => "general",
            NewsCategory::CyberAttack => "cyberAttack",
            NewsCategory::Vulnerability => "vulnerability",
            NewsCategory::Malware => "malware",
            NewsCategory::Security => "security",
            NewsCategory::DataBreach => "dataBreach",
        }
    }

    /// Suffix used for per-category environment variables, e.g. `CYBER_ATTACK`.
    pub fn env_suffix(&self) -> &'static str {
        match self {
            NewsCategory::General => "GENERAL",
            NewsCategory::CyberAttack => "CYBER_ATTACK",
            NewsCategory::Vulnerability => "VULNERABILITY",
            NewsCategory::Malware => "MALWARE",
            NewsCategory::Security => "SECURITY",
            NewsCategory::DataBreach => "DATA_BREACH",
        }
    }
}

impl fmt::Display for NewsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NewsCategory {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        NewsCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Config(format!("Unknown news category: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> Article {
        Article {
            id: 2,
            headline: "H".to_string(),
            author: "Jane".to_string(),
            full_text: "B".to_string(),
            url: "https://b.com/2".to_string(),
            image_url: "https://b.com/2.png".to_string(),
            date: "Jan 01, 2025".to_string(),
        }
    }

    #[test]
    fn test_embedding_text_joins_headline_and_body() {
        assert_eq!(article().embedding_text(), "H B");
    }

    #[test]
    fn test_index_record_uses_article_id() {
        let record = IndexRecord::new(&article(), vec![0.5; 3]);
        assert_eq!(record.id, "2");
        assert_eq!(record.metadata.headlines, "H");
        assert_eq!(record.metadata.news_url, "https://b.com/2");
    }

    #[test]
    fn test_metadata_uses_feed_field_names() {
        let value = serde_json::to_value(ArticleMetadata::from(&article())).unwrap();
        for key in ["headlines", "author", "fullNews", "newsURL", "newsImgURL", "newsDate"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_stored_article_without_url() {
        let row: StoredArticle = serde_json::from_str(r#"{"id": 7, "headlines": "x"}"#).unwrap();
        assert_eq!(row.url, None);
    }

    #[test]
    fn test_category_names() {
        let names: Vec<_> = NewsCategory::ALL.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            names,
            ["general", "cyberAttack", "vulnerability", "malware", "security", "dataBreach"]
        );
        assert_eq!("databreach".parse::<NewsCategory>().unwrap(), NewsCategory::DataBreach);
        assert!("sports".parse::<NewsCategory>().is_err());
    }
}
