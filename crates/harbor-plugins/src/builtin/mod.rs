//! Built-in plugins shipped with the host.
//!
//! Two core plugins cover the platform's stock functionality: code execution
//! behind the sandbox ([`CodeExecutorPlugin`]) and simulated web search
//! ([`WebSearchPlugin`]). [`ScriptPlugin`] adapts discovered Rhai sources
//! into the same contract.

use serde_json::{Value, json};

mod code_executor;
mod script;
mod web_search;

pub use code_executor::{CODE_EXECUTOR_ID, CodeExecutorPlugin};
pub use script::ScriptPlugin;
pub use web_search::{WEB_SEARCH_ID, WebSearchPlugin};

/// Builds the in-band failure map plugins return for invalid requests.
pub(crate) fn failure(message: &str) -> Value {
    json!({ "success": false, "error": message })
}
