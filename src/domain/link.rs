use crate::domain::DatasetRecord;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("select at least one dataset to view")]
pub struct EmptySelectionError;

/// Compose the browser URL for a selection. Names are joined with a literal
/// comma, in the order they were passed in (callers pass filtered-view order,
/// which is catalog order). The names and token are interpolated as-is; the
/// consuming frontend expects the unencoded form.
pub fn build_dataset_url(
    base_url: &str,
    selected: &[DatasetRecord],
    token: &str,
) -> Result<String, EmptySelectionError> {
    if selected.is_empty() {
        return Err(EmptySelectionError);
    }

    let names = selected
        .iter()
        .map(|record| record.name.as_str())
        .collect::<Vec<_>>()
        .join(",");

    Ok(format!(
        "{base_url}/#/datasets/list?datasetNames={names}&token={token}"
    ))
}
