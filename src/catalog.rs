//! Operation catalog: the fixed registry of automation operations the
//! matcher can resolve a request to.
//!
//! The catalog is read-only input at index-build time. Each entry pairs a
//! unique operation name with the description and keywords that get
//! embedded, plus the category and parameter names the host layer needs
//! when it actually executes the operation (execution is not this crate's
//! concern).

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single catalog entry describing one named operation.
///
/// Immutable once loaded. Exactly one descriptor exists per distinct
/// `name` within a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// Unique operation identifier (e.g. `"get_cpu_usage"`).
    pub name: String,
    /// Human-readable description of what the operation does.
    pub description: String,
    /// Keywords that strengthen the semantic match.
    pub keywords: Vec<String>,
    /// Grouping label (e.g. `"system_monitoring"`).
    pub category: String,
    /// Parameter names the operation accepts, in call order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
}

impl OperationDescriptor {
    /// The text that gets embedded for this entry: name, description, and
    /// comma-joined keywords in one string.
    pub fn embedding_text(&self) -> String {
        format!(
            "{}: {}. Keywords: {}",
            self.name,
            self.description,
            self.keywords.join(", ")
        )
    }
}

/// Supplies the ordered list of operations the index is built from.
///
/// The order must be stable across calls within one process lifetime;
/// it defines the index's handle order.
pub trait CatalogProvider: Send + Sync {
    fn list_operations(&self) -> &[OperationDescriptor];
}

/// An in-memory catalog with a fixed entry list.
#[derive(Debug)]
pub struct StaticCatalog {
    operations: Vec<OperationDescriptor>,
}

/// Shape of a catalog TOML file: a list of `[[operations]]` tables.
#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    operations: Vec<OperationDescriptor>,
}

impl StaticCatalog {
    /// Create a catalog from a list of descriptors, rejecting duplicate
    /// names.
    pub fn new(operations: Vec<OperationDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for op in &operations {
            if !seen.insert(op.name.as_str()) {
                return Err(Error::Catalog(format!(
                    "duplicate operation name: {}",
                    op.name
                )));
            }
        }
        Ok(Self { operations })
    }

    /// The built-in automation catalog.
    pub fn builtin() -> Self {
        Self {
            operations: builtin_operations(),
        }
    }

    /// Load additional operations from a TOML file and append them to the
    /// built-in catalog. Host-supplied names must not collide with
    /// built-in ones.
    pub fn builtin_with_extra(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: CatalogFile = toml::from_str(&content)
            .map_err(|e| Error::Catalog(format!("failed to parse {}: {}", path.display(), e)))?;
        let mut operations = builtin_operations();
        operations.extend(file.operations);
        Self::new(operations)
    }
}

impl CatalogProvider for StaticCatalog {
    fn list_operations(&self) -> &[OperationDescriptor] {
        &self.operations
    }
}

fn op(
    name: &str,
    description: &str,
    keywords: &[&str],
    category: &str,
    parameters: &[&str],
) -> OperationDescriptor {
    OperationDescriptor {
        name: name.to_string(),
        description: description.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        category: category.to_string(),
        parameters: parameters.iter().map(|p| p.to_string()).collect(),
    }
}

/// The built-in operations, in registry order.
fn builtin_operations() -> Vec<OperationDescriptor> {
    vec![
        op(
            "open_chrome",
            "Opens Google Chrome web browser",
            &[
                "chrome", "browser", "web", "google", "internet", "open", "launch", "start",
            ],
            "application_control",
            &[],
        ),
        op(
            "open_calculator",
            "Opens the system calculator application",
            &["calculator", "calc", "math", "open", "launch", "start"],
            "application_control",
            &[],
        ),
        op(
            "open_notepad",
            "Opens the system text editor or notepad",
            &[
                "notepad",
                "text editor",
                "editor",
                "text",
                "notes",
                "open",
                "launch",
                "start",
            ],
            "application_control",
            &[],
        ),
        op(
            "open_file_explorer",
            "Opens the system file explorer or file manager",
            &[
                "file explorer",
                "explorer",
                "file manager",
                "files",
                "browse",
                "open",
                "launch",
                "start",
            ],
            "application_control",
            &[],
        ),
        op(
            "get_cpu_usage",
            "Returns the current CPU usage percentage",
            &[
                "cpu",
                "processor",
                "usage",
                "load",
                "performance",
                "monitoring",
                "system",
                "stats",
            ],
            "system_monitoring",
            &[],
        ),
        op(
            "get_memory_usage",
            "Returns information about RAM usage",
            &[
                "memory",
                "ram",
                "usage",
                "monitoring",
                "system",
                "performance",
                "stats",
            ],
            "system_monitoring",
            &[],
        ),
        op(
            "get_disk_usage",
            "Returns information about disk space usage",
            &[
                "disk", "storage", "drive", "space", "usage", "monitoring", "system", "stats",
            ],
            "system_monitoring",
            &[],
        ),
        op(
            "get_battery_status",
            "Returns battery status information if available",
            &[
                "battery",
                "power",
                "status",
                "charge",
                "monitoring",
                "system",
                "laptop",
            ],
            "system_monitoring",
            &[],
        ),
        op(
            "run_shell_command",
            "Executes a shell command and returns the output",
            &[
                "shell", "command", "cmd", "terminal", "console", "execute", "run",
            ],
            "command_execution",
            &["command"],
        ),
        op(
            "list_files_in_directory",
            "Lists all files in a specified directory",
            &[
                "list",
                "files",
                "directory",
                "folder",
                "contents",
                "ls",
                "dir",
            ],
            "command_execution",
            &["directory"],
        ),
        op(
            "get_system_info",
            "Returns basic system information",
            &[
                "system",
                "info",
                "information",
                "details",
                "specs",
                "specifications",
                "os",
                "platform",
            ],
            "system_monitoring",
            &[],
        ),
        op(
            "create_file",
            "Creates a new file with optional content",
            &["create", "file", "new", "make", "write"],
            "command_execution",
            &["filename", "content"],
        ),
        op(
            "read_file",
            "Reads the contents of a file",
            &["read", "file", "content", "open", "view"],
            "command_execution",
            &["filename"],
        ),
    ]
}
