pub mod checker;
pub mod logging;
pub mod runner;
pub mod sources;

pub use checker::{CategoryReport, CheckerConfig, PassReport, RssChecker};
pub use runner::{run_periodic_check, Schedule};
pub use sources::{FeedConfig, RssSource};

pub mod prelude {
    pub use super::checker::RssChecker;
    pub use super::runner::{run_periodic_check, Schedule};
    pub use cn_core::{Article, Error, NewsCategory, NewsSource, Result};
}
