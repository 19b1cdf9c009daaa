pub(crate) mod check;
pub(crate) mod properties;
pub(crate) mod validate;

use std::path::Path;

/// Read a file and parse it as JSON.
pub(crate) fn read_json(path: &Path) -> Result<serde_json::Value, String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("error reading file '{}': {}", path.display(), e))?;
    serde_json::from_str(&contents)
        .map_err(|e| format!("error parsing JSON in '{}': {}", path.display(), e))
}
