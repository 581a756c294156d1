pub mod config;
pub mod error;
pub mod facts;
pub mod filings;
pub mod fs;
pub mod pipeline;
pub mod summary;
pub(crate) mod tui;

pub use config::{Config, EntityPaths};
pub use error::SpiderError;
pub use facts::ExtractionProfile;
pub use pipeline::Stage;
pub use summary::Summary;

/// Shortcut for required API elements.
pub mod http {
    pub use reqwest::Client as HttpClient;
}

/// Client shared by every request of a stage; browser user agent, cookie jar kept between the
/// converter's page load and its form post.
pub(crate) fn std_client_build(
    config: &Config,
    timeout: std::time::Duration,
) -> anyhow::Result<http::HttpClient> {
    let client = reqwest::ClientBuilder::new()
        .user_agent(&config.user_agent)
        .cookie_store(true)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

pub(crate) fn time_elapsed(time: std::time::Instant) -> String {
    format!("time elapsed: {:?}", time.elapsed())
}
