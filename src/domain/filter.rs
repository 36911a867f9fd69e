use crate::domain::DatasetRecord;

/// Indices of records whose name contains `query` case-insensitively, in
/// catalog order. An empty query keeps every record. Pure: the result depends
/// only on the arguments, so recomputing after every keystroke cannot desync
/// from what the list renders.
pub fn filter_dataset_indices(records: &[DatasetRecord], query: &str) -> Vec<usize> {
    let query = query.to_lowercase();
    if query.is_empty() {
        return (0..records.len()).collect();
    }

    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| record.name.to_lowercase().contains(&query).then_some(index))
        .collect()
}
