//! Field projection: keep only the properties a caller asked for.

use serde_json::{Map, Value};

/// Copy the keys named in `fields_csv` out of `source`.
///
/// Names missing from `source` are skipped silently, and an empty list
/// yields an empty map.
pub fn project(fields_csv: &str, source: &Map<String, Value>) -> Map<String, Value> {
    fields_csv
        .split(',')
        .filter_map(|name| source.get(name).map(|value| (name.to_string(), value.clone())))
        .collect()
}
