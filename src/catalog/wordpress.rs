//! WordPress plugin directory client.

use super::CatalogError;
use crate::store::{TransportKind, WorkItem};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.wordpress.org/plugins/info/1.2/";
pub const SVN_ROOT: &str = "https://plugins.svn.wordpress.org";

const USER_AGENT: &str = concat!("plugin-audit/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct QueryPluginsResponse {
    #[serde(default)]
    plugins: Vec<PluginInfo>,
}

#[derive(Debug, Deserialize)]
struct PluginInfo {
    slug: String,
    #[serde(default)]
    name: Option<String>,
}

/// Lists popular plugins from the directory's `query_plugins` API.
pub struct WordPressCatalog {
    api_url: String,
    agent: ureq::Agent,
}

impl WordPressCatalog {
    pub fn new() -> Self {
        Self::with_api_url(DEFAULT_API_URL)
    }

    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
        }
    }

    /// Fetch one page of popular plugins as SVN work items.
    pub fn fetch_page(&self, page: u32, per_page: u32) -> Result<Vec<WorkItem>, CatalogError> {
        debug!(url = %self.api_url, page, per_page, "Querying plugin directory");

        let response = self
            .agent
            .get(&self.api_url)
            .set("User-Agent", USER_AGENT)
            .query("action", "query_plugins")
            .query("request[browse]", "popular")
            .query("request[page]", &page.to_string())
            .query("request[per_page]", &per_page.to_string())
            .query("request[fields][name]", "1")
            .query("request[fields][slug]", "1")
            .call()
            .map_err(|e| CatalogError::Request {
                url: self.api_url.clone(),
                message: match e {
                    ureq::Error::Status(code, _) => format!("HTTP {code}"),
                    ureq::Error::Transport(t) => t.to_string(),
                },
            })?;

        let body = response
            .into_string()
            .map_err(|e| CatalogError::Request {
                url: self.api_url.clone(),
                message: e.to_string(),
            })?;

        parse_query_plugins(&body).map_err(|message| CatalogError::Response {
            url: self.api_url.clone(),
            message,
        })
    }
}

impl Default for WordPressCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a `query_plugins` response body to work items. Entries without a
/// slug are dropped; a missing name falls back to the slug.
pub fn parse_query_plugins(body: &str) -> Result<Vec<WorkItem>, String> {
    let response: QueryPluginsResponse =
        serde_json::from_str(body).map_err(|e| e.to_string())?;

    Ok(response
        .plugins
        .into_iter()
        .filter(|p| !p.slug.trim().is_empty())
        .map(|p| {
            let slug = p.slug.trim().to_string();
            let name = p
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| slug.clone());
            let locator = format!("{SVN_ROOT}/{slug}");
            WorkItem::new(slug, name, locator, TransportKind::Svn)
        })
        .collect())
}
