//! Column-ordered collection of fetched rows.

use indexmap::IndexSet;
use serde_json::Value;

use crate::fetch::normalize::Record;

/// Rows from many tickers with the union of their columns.
///
/// Columns appear in first-seen order; [`lead_with`](Self::lead_with)
/// moves identifying columns to the front.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    columns: IndexSet<String>,
    rows: Vec<Record>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rows, registering any new columns.
    pub fn extend(&mut self, rows: impl IntoIterator<Item = Record>) {
        for row in rows {
            for key in row.keys() {
                if !self.columns.contains(key) {
                    self.columns.insert(key.clone());
                }
            }
            self.rows.push(row);
        }
    }

    /// Move `leading` columns (those present) to the front, in the given order.
    pub fn lead_with(&mut self, leading: &[&str]) {
        let mut ordered: IndexSet<String> = leading
            .iter()
            .filter(|c| self.columns.contains(**c))
            .map(|c| c.to_string())
            .collect();
        ordered.extend(self.columns.iter().cloned());
        self.columns = ordered;
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell values of `row` in column order; absent cells are `Null`.
    pub fn row_values<'a>(&'a self, row: &'a Record) -> impl Iterator<Item = &'a Value> + 'a {
        self.columns
            .iter()
            .map(move |c| row.get(c).unwrap_or(&Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_union_of_columns() {
        let mut table = RecordTable::new();
        table.extend(vec![record(json!({"buy": 1, "ticker": "A"}))]);
        table.extend(vec![record(json!({"sell": 2, "ticker": "B"}))]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.columns().collect::<Vec<_>>(), vec!["buy", "ticker", "sell"]);

        let second: Vec<&Value> = table.row_values(&table.rows()[1]).collect();
        assert_eq!(second, vec![&Value::Null, &json!("B"), &json!(2)]);
    }

    #[test]
    fn test_lead_with() {
        let mut table = RecordTable::new();
        table.extend(vec![record(json!({"cash": 1, "ticker": "A", "year": 2023}))]);
        table.lead_with(&["ticker", "year", "missing"]);
        assert_eq!(table.columns().collect::<Vec<_>>(), vec!["ticker", "year", "cash"]);
    }
}
