//! Columnar input decoding: turns `{field: [v0, v1, ...]}` into row records.

use campaign_core::CampaignRow;
use serde_json::Value;

/// Decode a column-oriented record into rows.
///
/// The row count is taken from the first column. Anything that is not an
/// object (or whose first column is not an array) decodes to no rows; short
/// or non-array columns yield `null` for the missing cells.
pub fn columns_to_rows(columns: &Value) -> Vec<CampaignRow> {
    let Value::Object(cols) = columns else {
        return Vec::new();
    };

    let length = cols
        .values()
        .next()
        .and_then(Value::as_array)
        .map_or(0, Vec::len);

    (0..length)
        .map(|i| {
            let mut row = CampaignRow::new();
            for (field, column) in cols {
                let cell = column
                    .as_array()
                    .and_then(|values| values.get(i))
                    .cloned()
                    .unwrap_or(Value::Null);
                row.insert(field.clone(), cell);
            }
            row
        })
        .collect()
}
