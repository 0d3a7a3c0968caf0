use crate::results::PageContent;
use async_trait::async_trait;

/// Base trait for the collaborators that load the search page
///
/// Fetchers never return errors: a page that cannot be loaded comes back
/// with `success == false` and the failure is logged.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Load the page at `url`
    async fn fetch(&self, url: &str) -> PageContent;

    /// Short name used in log lines
    fn name(&self) -> &str;
}
