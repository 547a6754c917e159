//! The `ckg` query tool.
//!
//! Validates tool-call arguments, opens the codebase's store through the
//! cache (building it on first use) and renders a search report.

use crate::{render, CkgConfig, Command};
use ckg_indexer::{CkgCache, CkgStore, OpenOutcome};
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const NAME: &str = "ckg";

const DESCRIPTION: &str = "Query the code knowledge graph of a codebase.
* State is persistent across command calls and discussions with the user
* The `search_function` command searches for functions in the codebase
* The `search_class` command searches for classes in the codebase
* The `search_class_method` command searches for class methods in the codebase
* The `search_struct` command searches for structs in the codebase
* The `search_enum` command searches for enums in the codebase
* The `search_interface` command searches for interfaces in the codebase
* The `search_trait` command searches for traits in the codebase
* The `search_module` command searches for modules in the codebase
* The `search_namespace` command searches for namespaces in the codebase
* The `search_type_alias` command searches for type aliases in the codebase
* The `search_component` command searches for components in the codebase
* The `search_contract` command searches for smart contracts in the codebase
* The `search_extension` command searches for extensions in the codebase
* The `search_union` command searches for unions in the codebase
* The `search_generic_type` command searches for generic types in the codebase
* If a `command` generates a long output, it will be truncated and marked with `<response clipped>`
* If multiple entries are found, the tool will return all of them until the truncation is reached.
* By default, the tool will print function or class bodies as well as the file path and line number of the function or class. You can disable this by setting the `print_body` parameter to `false`.
* The CKG is not completely accurate, and may not be able to find all functions or classes in the codebase.
";

/// Outcome of one tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResult {
    pub output: Option<String>,
    pub error: Option<String>,
    /// `0` on success, `-1` on error
    pub error_code: i32,
}

impl ToolResult {
    pub fn success(output: String) -> Self {
        Self {
            output: Some(output),
            error: None,
            error_code: 0,
        }
    }

    pub fn failure(error: String) -> Self {
        Self {
            output: None,
            error: Some(error),
            error_code: -1,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Code knowledge graph query tool.
///
/// Stores are memoized per canonical codebase path for the lifetime of the
/// tool; a memoized store is not rebuilt when the codebase changes.
pub struct CkgTool {
    cache: CkgCache,
    stores: Mutex<LruCache<PathBuf, CkgStore>>,
    max_response_len: usize,
}

impl CkgTool {
    /// Create the tool from configuration, expiring old databases if enabled.
    pub fn new(config: &CkgConfig) -> Self {
        let tool = Self::with_cache(
            CkgCache::new(config.cache_options()),
            config.max_open_stores,
            config.max_response_len,
        );
        if config.expire_on_start {
            if let Err(e) = tool.cache.expire() {
                warn!(error = %e, "Failed to expire old databases");
            }
        }
        tool
    }

    pub fn with_cache(cache: CkgCache, max_open_stores: usize, max_response_len: usize) -> Self {
        let capacity = NonZeroUsize::new(max_open_stores).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache,
            stores: Mutex::new(LruCache::new(capacity)),
            max_response_len,
        }
    }

    pub fn name(&self) -> &'static str {
        NAME
    }

    pub fn description(&self) -> &'static str {
        DESCRIPTION
    }

    /// JSON schema of the tool arguments.
    pub fn parameters(&self) -> Value {
        let commands: Vec<&str> = Command::all().iter().map(|c| c.name()).collect();
        let command_help = format!(
            "The command to run. Allowed options are {}.",
            commands.join(", ")
        );
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": command_help,
                    "enum": commands,
                },
                "path": {
                    "type": "string",
                    "description": "The path to the codebase.",
                },
                "identifier": {
                    "type": "string",
                    "description": "The identifier of the code construct to search for in the code knowledge graph.",
                },
                "print_body": {
                    "type": "boolean",
                    "description": "Whether to print the body of the function or class. This is enabled by default.",
                },
            },
            "required": ["command", "path", "identifier"],
        })
    }

    pub fn cache(&self) -> &CkgCache {
        &self.cache
    }

    /// Number of stores currently memoized.
    pub fn open_stores(&self) -> usize {
        self.stores.lock().len()
    }

    /// Run one tool call.
    pub fn execute(&self, arguments: &Value) -> ToolResult {
        let Some(command) = string_arg(arguments, "command") else {
            return ToolResult::failure(format!("No command provided for the {} tool", NAME));
        };
        let Some(path) = string_arg(arguments, "path") else {
            return ToolResult::failure(format!("No path provided for the {} tool", NAME));
        };
        let Some(identifier) = string_arg(arguments, "identifier") else {
            return ToolResult::failure(format!("No identifier provided for the {} tool", NAME));
        };
        let print_body = arguments.get("print_body").map(truthy).unwrap_or(true);

        let codebase = Path::new(&path);
        if !codebase.exists() {
            return ToolResult::failure(format!("Codebase path {} does not exist", path));
        }
        if !codebase.is_dir() {
            return ToolResult::failure(format!("Codebase path {} is not a directory", path));
        }
        let Some(command) = Command::parse(&command) else {
            return ToolResult::failure(format!("Invalid command: {}", command));
        };

        match self.search(codebase, command, &identifier, print_body) {
            Ok(report) => ToolResult::success(report),
            Err(error) => ToolResult::failure(error),
        }
    }

    fn search(
        &self,
        codebase: &Path,
        command: Command,
        identifier: &str,
        print_body: bool,
    ) -> Result<String, String> {
        let open_error = |e: &dyn std::fmt::Display| {
            format!(
                "Failed to open code knowledge graph for {}: {}",
                codebase.display(),
                e
            )
        };
        let key = codebase.canonicalize().map_err(|e| open_error(&e))?;

        let mut stores = self.stores.lock();
        if !stores.contains(&key) {
            let opened = self.cache.open(&key).map_err(|e| open_error(&e))?;
            match &opened.outcome {
                OpenOutcome::Reused => {
                    debug!(path = ?key, fingerprint = %opened.fingerprint, "Opened cached code knowledge graph")
                }
                OpenOutcome::Built(stats) => info!(
                    path = ?key,
                    fingerprint = %opened.fingerprint,
                    entities = stats.entities,
                    "Built code knowledge graph"
                ),
            }
            if let Some((evicted, _)) = stores.push(key.clone(), opened.store) {
                if evicted != key {
                    debug!(path = ?evicted, "Evicted store from cache");
                }
            }
        }
        let Some(store) = stores.get(&key) else {
            return Err(open_error(&"store unavailable"));
        };

        let entries = store
            .query(command.kind(), identifier, command.filter())
            .map_err(|e| {
                format!(
                    "Failed to query code knowledge graph for {}: {}",
                    codebase.display(),
                    e
                )
            })?;
        debug!(command = %command, identifier, matches = entries.len(), "Searched code knowledge graph");

        Ok(render(
            command,
            identifier,
            &entries,
            print_body,
            self.max_response_len,
        ))
    }
}

/// A present, non-null argument as text.
fn string_arg(arguments: &Value, key: &str) -> Option<String> {
    match arguments.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Truthiness of a JSON value: `false`, `null`, zero and empty values are false.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
