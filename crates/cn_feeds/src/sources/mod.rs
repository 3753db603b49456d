pub mod rss;

pub use self::rss::{FeedConfig, RssSource};

/// Common utilities for turning feed markup into plain values
pub(crate) mod utils {
    use scraper::{Html, Selector};
    use sha2::{Digest, Sha256};

    /// Visible text of an HTML fragment with whitespace collapsed
    pub fn flatten_html(html: &str) -> String {
        let fragment = Html::parse_fragment(html);
        let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn first_image(html: &str) -> Option<String> {
        let selector = Selector::parse("img[src]").ok()?;
        Html::parse_fragment(html)
            .select(&selector)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(|src| src.to_string())
    }

    /// Stable id derived from the article URL; fits in an `i64`
    pub fn article_id(url: &str) -> u64 {
        let digest = Sha256::digest(url.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(bytes) & (i64::MAX as u64)
    }

}
