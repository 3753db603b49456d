use async_trait::async_trait;
use cn_core::{Article, Error, NewsCategory, NewsSource, Result};
use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::Client;
use std::collections::{HashMap, HashSet};
use std::env;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;
use super::utils::{article_id, first_image, flatten_html};

const USER_AGENT: &str = concat!("cybernews-ingest/", env!("CARGO_PKG_VERSION"));

fn default_feed_urls(category: NewsCategory) -> &'static [&'static str] {
    match category {
        NewsCategory::General => &["https://feeds.feedburner.com/TheHackersNews"],
        NewsCategory::CyberAttack => &["https://www.securityweek.com/category/cyberwarfare/feed/"],
        NewsCategory::Vulnerability => &["https://www.securityweek.com/category/vulnerabilities/feed/"],
        NewsCategory::Malware => &["https://www.securityweek.com/category/malware-cyber-threats/feed/"],
        NewsCategory::Security => &["https://krebsonsecurity.com/feed/"],
        NewsCategory::DataBreach => &["https://www.securityweek.com/category/data-breaches/feed/"],
    }
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub feeds: HashMap<NewsCategory, Vec<Url>>,
    pub timeout: Duration,
    /// Upper bound on candidates returned per category
    pub max_articles: Option<usize>,
}

impl FeedConfig {
    pub fn new() -> Result<Self> {
        let mut feeds = HashMap::new();
        for category in NewsCategory::ALL {
            let urls = default_feed_urls(category)
                .iter()
                .map(|u| Url::parse(u))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            feeds.insert(category, urls);
        }
        Ok(Self {
            feeds,
            timeout: Duration::from_secs(30),
            max_articles: None,
        })
    }

    /// Defaults overridden by `NEWS_FEEDS_<CATEGORY>` (comma separated URLs)
    /// and `NEWS_MAX_ARTICLES`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new()?;
        for category in NewsCategory::ALL {
            let name = format!("NEWS_FEEDS_{}", category.env_suffix());
            if let Ok(raw) = env::var(&name) {
                config.feeds.insert(category, parse_url_list(&raw)?);
            }
        }
        if let Ok(raw) = env::var("NEWS_MAX_ARTICLES") {
            let max = raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("NEWS_MAX_ARTICLES is not a number: {}", raw)))?;
            config.max_articles = Some(max);
        }
        Ok(config)
    }

    pub fn with_feed(mut self, category: NewsCategory, url: Url) -> Self {
        self.feeds.insert(category, vec![url]);
        self
    }
}

fn parse_url_list(raw: &str) -> Result<Vec<Url>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Url::parse(s).map_err(Error::from))
        .collect()
}

/// News source backed by RSS/Atom feeds, one or more per category.
pub struct RssSource {
    client: Client,
    config: FeedConfig,
}

impl RssSource {
    pub fn new(config: FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    async fn fetch_feed(&self, url: &Url) -> Result<Vec<Article>> {
        let response = self.client.get(url.clone()).send().await?.error_for_status()?;
        let content = response.bytes().await?;
        parse_feed(content.as_ref(), url.as_str())
    }
}

/// Parse an RSS or Atom document into articles. Entries without a link are dropped.
pub fn parse_feed(content: &[u8], source: &str) -> Result<Vec<Article>> {
    let feed = parser::parse(content)
        .map_err(|e| Error::Feed(format!("Failed to parse feed {}: {}", source, e)))?;
    let fallback_author = feed
        .title
        .as_ref()
        .map(|t| flatten_html(&t.content))
        .unwrap_or_default();

    Ok(feed
        .entries
        .into_iter()
        .filter_map(|entry| entry_to_article(entry, &fallback_author))
        .collect())
}

fn entry_to_article(entry: Entry, fallback_author: &str) -> Option<Article> {
    let url = entry.links.first()?.href.trim().to_string();
    if url.is_empty() {
        return None;
    }

    let html = entry
        .content
        .as_ref()
        .and_then(|c| c.body.clone())
        .or_else(|| entry.summary.as_ref().map(|s| s.content.clone()))
        .unwrap_or_default();

    let image_url = entry
        .media
        .iter()
        .flat_map(|m| {
            m.content
                .iter()
                .filter_map(|c| c.url.as_ref().map(|u| u.to_string()))
                .chain(m.thumbnails.iter().map(|t| t.image.uri.clone()))
        })
        .next()
        .or_else(|| first_image(&html))
        .unwrap_or_default();

    let author = entry
        .authors
        .first()
        .map(|p| p.name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| fallback_author.to_string());

    let date = entry
        .published
        .or(entry.updated)
        .map(|d| d.format("%b %d, %Y").to_string())
        .unwrap_or_default();

    Some(Article {
        id: article_id(&url),
        headline: entry.title.map(|t| flatten_html(&t.content)).unwrap_or_default(),
        author,
        full_text: flatten_html(&html),
        url,
        image_url,
        date,
    })
}

#[async_trait]
impl NewsSource for RssSource {
    fn name(&self) -> &str {
        "rss"
    }

    async fn get_news(&self, category: NewsCategory) -> Result<Vec<Article>> {
        let urls = match self.config.feeds.get(&category) {
            Some(urls) if !urls.is_empty() => urls,
            _ => {
                warn!("No feeds configured for {} news", category);
                return Ok(Vec::new());
            }
        };

        let mut articles = Vec::new();
        let mut seen = HashSet::new();
        let mut last_error = None;
        let mut fetched_any = false;

        for url in urls {
            match self.fetch_feed(url).await {
                Ok(entries) => {
                    fetched_any = true;
                    debug!("{} entries from {}", entries.len(), url);
                    articles.extend(entries.into_iter().filter(|a| seen.insert(a.url.clone())));
                }
                Err(e) => {
                    warn!("Failed to fetch {} feed {}: {}", category, url, e);
                    last_error = Some(e);
                }
            }
        }

        // A category fails only when none of its feeds could be read
        if !fetched_any {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        if let Some(max) = self.config.max_articles {
            articles.truncate(max);
        }
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>The Hacker News</title>
    <link>https://thehackernews.com</link>
    <description>Security news</description>
    <item>
      <title>New Botnet Targets Routers</title>
      <link>https://thehackernews.com/2025/01/botnet.html</link>
      <description><![CDATA[<p>A new <b>botnet</b> is spreading.</p><img src="https://img.example/botnet.jpg">]]></description>
      <pubDate>Wed, 01 Jan 2025 10:00:00 +0000</pubDate>
      <author>editor@example.com (Ravie Lakshmanan)</author>
    </item>
    <item>
      <title>Patch Tuesday</title>
      <link>https://thehackernews.com/2025/01/patch.html</link>
      <description>Microsoft fixes 60 flaws.</description>
      <enclosure url="https://img.example/patch.png" type="image/png" length="1024"/>
    </item>
    <item>
      <title>No link here</title>
      <description>dropped</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_feed() {
        let articles = parse_feed(RSS.as_bytes(), "test").unwrap();
        assert_eq!(articles.len(), 2);

        let botnet = &articles[0];
        assert_eq!(botnet.headline, "New Botnet Targets Routers");
        assert_eq!(botnet.url, "https://thehackernews.com/2025/01/botnet.html");
        assert_eq!(botnet.full_text, "A new botnet is spreading.");
        assert_eq!(botnet.image_url, "https://img.example/botnet.jpg");
        assert_eq!(botnet.date, "Jan 01, 2025");
        assert_eq!(botnet.id, article_id(&botnet.url));

        let patch = &articles[1];
        assert_eq!(patch.author, "The Hacker News");
        assert_eq!(patch.image_url, "https://img.example/patch.png");
        assert_eq!(patch.date, "");
    }

    #[test]
    fn test_parse_garbage_is_feed_error() {
        assert!(matches!(parse_feed(b"not a feed", "test"), Err(Error::Feed(_))));
    }

    #[test]
    fn test_url_list() {
        let urls = parse_url_list(" https://a.com/feed , ,https://b.com/rss").unwrap();
        assert_eq!(urls.len(), 2);
        assert!(parse_url_list("not a url").is_err());
    }

    #[tokio::test]
    async fn test_get_news_merges_feeds_and_tolerates_one_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/one.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/down.xml"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut config = FeedConfig::new().unwrap();
        config.feeds.insert(
            NewsCategory::Malware,
            vec![
                Url::parse(&format!("{}/one.xml", server.uri())).unwrap(),
                Url::parse(&format!("{}/down.xml", server.uri())).unwrap(),
                Url::parse(&format!("{}/one.xml", server.uri())).unwrap(),
            ],
        );
        let source = RssSource::new(config).unwrap();

        let articles = source.get_news(NewsCategory::Malware).await.unwrap();
        assert_eq!(articles.len(), 2);
    }

    #[tokio::test]
    async fn test_get_news_fails_when_every_feed_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let config = FeedConfig::new()
            .unwrap()
            .with_feed(NewsCategory::General, Url::parse(&format!("{}/gone.xml", server.uri())).unwrap());
        let source = RssSource::new(config).unwrap();
        assert!(source.get_news(NewsCategory::General).await.is_err());
    }

    #[tokio::test]
    async fn test_max_articles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .mount(&server)
            .await;

        let mut config = FeedConfig::new()
            .unwrap()
            .with_feed(NewsCategory::Security, Url::parse(&format!("{}/feed", server.uri())).unwrap());
        config.max_articles = Some(1);
        let source = RssSource::new(config).unwrap();
        assert_eq!(source.get_news(NewsCategory::Security).await.unwrap().len(), 1);
    }
}
