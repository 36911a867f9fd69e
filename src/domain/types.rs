use serde::Deserialize;

/// One dataset as returned by `/api/dataset/findByPage`. The service sends
/// more fields per record; only `name` drives filtering and link building,
/// and the id stays opaque.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct DatasetRecord {
    #[serde(default)]
    pub id: serde_json::Value,
    pub name: String,
}

impl DatasetRecord {
    #[cfg(test)]
    pub fn named(name: &str) -> Self {
        Self {
            id: serde_json::Value::Null,
            name: name.to_string(),
        }
    }
}
