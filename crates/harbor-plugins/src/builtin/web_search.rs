//! Built-in simulated web search plugin.
//!
//! Produces fabricated result entries without any network I/O, mirroring the
//! platform's stock search behaviour. It exists to exercise capability
//! lookup, parameter validation, and multi-plugin bootstrap alongside the
//! code executor.

use serde_json::{Value, json};

use crate::builtin::failure;
use crate::contract::{Parameters, Plugin};
use crate::descriptor::PluginDescriptor;
use crate::error::PluginError;

/// Registry identifier of the web search plugin.
pub const WEB_SEARCH_ID: &str = "web_search";

/// Default and maximum-by-default number of simulated results.
const DEFAULT_MAX_RESULTS: usize = 5;

/// Returns simulated search results for a query.
#[derive(Debug)]
pub struct WebSearchPlugin {
    descriptor: PluginDescriptor,
    max_results: usize,
}

impl WebSearchPlugin {
    /// Builds the plugin with the default result ceiling.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_results(DEFAULT_MAX_RESULTS)
    }

    /// Builds the plugin from its opaque configuration blob.
    ///
    /// The only recognised key is `max_results`, a positive integer ceiling
    /// on how many results a request may ask for.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Config`] when `max_results` is present but is
    /// not a positive integer.
    pub fn from_config(config: &Value) -> Result<Self, PluginError> {
        let max_results = match config.get("max_results") {
            None => DEFAULT_MAX_RESULTS,
            Some(value) => value
                .as_u64()
                .and_then(|ceiling| usize::try_from(ceiling).ok())
                .filter(|ceiling| *ceiling > 0)
                .ok_or_else(|| PluginError::Config {
                    id: WEB_SEARCH_ID.to_owned(),
                    message: String::from("'max_results' must be a positive integer"),
                })?,
        };
        Ok(Self::with_max_results(max_results))
    }

    /// Builds the plugin with an explicit result ceiling.
    #[must_use]
    pub fn with_max_results(max_results: usize) -> Self {
        let descriptor = PluginDescriptor::new(WEB_SEARCH_ID, "Web Search", "1.0.0")
            .with_description("returns simulated search results without network access")
            .with_capabilities(["web_search", "information_retrieval", "research"]);
        Self {
            descriptor,
            max_results,
        }
    }
}

impl Default for WebSearchPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for WebSearchPlugin {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn execute(&self, parameters: &Parameters) -> Result<Value, PluginError> {
        parameters.require(WEB_SEARCH_ID, &["query"])?;
        let Some(query) = parameters.string("query") else {
            return Ok(failure("parameter 'query' must be a string"));
        };

        let requested = parameters
            .integer("max_results")
            .and_then(|count| usize::try_from(count).ok())
            .unwrap_or(self.max_results);
        let count = requested.min(self.max_results);

        let results: Vec<Value> = (1..=count)
            .map(|index| {
                json!({
                    "title": format!("Result {index} for '{query}'"),
                    "url": format!("https://example.com/result/{index}"),
                    "snippet": format!("Simulated search result {index} for query '{query}'."),
                })
            })
            .collect();

        Ok(json!({ "success": true, "query": query, "results": results }))
    }
}
