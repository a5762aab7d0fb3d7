//! CSV dataset writer.

use std::path::Path;

use serde_json::Value;

use crate::error::Result;
use crate::table::RecordTable;

/// Header = table columns. Strings are written raw, nulls as empty cells,
/// nested values as compact JSON.
pub fn write_table(path: &Path, table: &RecordTable) -> Result<()> {
    let mut writer = ::csv::Writer::from_path(path)?;
    writer.write_record(table.columns())?;

    for row in table.rows() {
        writer.write_record(table.row_values(row).map(cell))?;
    }
    writer.flush()?;
    Ok(())
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell() {
        assert_eq!(cell(&Value::Null), "");
        assert_eq!(cell(&json!("Apple Inc")), "Apple Inc");
        assert_eq!(cell(&json!(1.5)), "1.5");
        assert_eq!(cell(&json!(true)), "true");
        assert_eq!(cell(&json!([1, 2])), "[1,2]");
    }
}
