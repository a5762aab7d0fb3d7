//! JSON payload → flat rows.

use serde_json::{Map, Value};

use fundlake_core::Normalization;

use crate::error::FetchError;

/// One flat output row, fields in response order.
pub type Record = Map<String, Value>;

/// Column added to every row.
pub const TICKER_COLUMN: &str = "ticker";

/// Column used for scalar array elements.
const VALUE_COLUMN: &str = "value";

/// Falsy payloads: `null`, `false`, `0`, `""`, `[]`, `{}`.
pub fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Flatten `payload` with `strategy` and tag every row with `ticker`.
pub fn normalize(
    payload: Value,
    strategy: &Normalization,
    ticker: &str,
) -> Result<Vec<Record>, FetchError> {
    let mut rows = match strategy {
        Normalization::Nested { key } => nested(payload, key)?,
        Normalization::Columnar => columnar(payload)?,
        Normalization::SingleObject => single_object(payload)?,
        Normalization::Rows => row_list(payload)?,
    };

    for row in &mut rows {
        row.insert(TICKER_COLUMN.to_string(), Value::String(ticker.to_string()));
    }
    Ok(rows)
}

fn nested(payload: Value, key: &str) -> Result<Vec<Record>, FetchError> {
    let mut object = match payload {
        Value::Object(object) => object,
        other => {
            return Err(FetchError::Shape(format!(
                "expected an object holding '{}', got {}",
                key,
                kind(&other)
            )))
        }
    };

    match object.remove(key) {
        Some(Value::Array(items)) => Ok(items.into_iter().map(into_row).collect()),
        Some(Value::Null) => Ok(Vec::new()),
        Some(other) => Err(FetchError::Shape(format!(
            "expected an array under '{}', got {}",
            key,
            kind(&other)
        ))),
        None => Err(FetchError::Shape(format!("missing key '{}'", key))),
    }
}

fn columnar(payload: Value) -> Result<Vec<Record>, FetchError> {
    let object = match payload {
        Value::Object(object) => object,
        other => {
            return Err(FetchError::Shape(format!(
                "expected an object of arrays, got {}",
                kind(&other)
            )))
        }
    };

    let mut len: Option<usize> = None;
    for (name, value) in &object {
        if let Value::Array(items) = value {
            match len {
                None => len = Some(items.len()),
                Some(n) if n != items.len() => {
                    return Err(FetchError::Shape(format!(
                        "column '{}' has {} values, expected {}",
                        name,
                        items.len(),
                        n
                    )))
                }
                Some(_) => {}
            }
        }
    }

    let Some(len) = len else {
        // No array columns, e.g. {"s": "no_data"}
        return Ok(Vec::new());
    };

    let mut rows: Vec<Record> = (0..len).map(|_| Record::new()).collect();
    for (name, value) in object {
        match value {
            Value::Array(items) => {
                for (row, item) in rows.iter_mut().zip(items) {
                    row.insert(name.clone(), item);
                }
            }
            scalar => {
                for row in rows.iter_mut() {
                    row.insert(name.clone(), scalar.clone());
                }
            }
        }
    }
    Ok(rows)
}

fn single_object(payload: Value) -> Result<Vec<Record>, FetchError> {
    match payload {
        Value::Object(object) if object.is_empty() => Ok(Vec::new()),
        Value::Object(object) => Ok(vec![object]),
        other => Err(FetchError::Shape(format!(
            "expected a single object, got {}",
            kind(&other)
        ))),
    }
}

fn row_list(payload: Value) -> Result<Vec<Record>, FetchError> {
    match payload {
        Value::Array(items) => Ok(items.into_iter().map(into_row).collect()),
        Value::Object(object) if object.is_empty() => Ok(Vec::new()),
        Value::Object(object) => Ok(vec![object]),
        other => Err(FetchError::Shape(format!(
            "expected an array of rows, got {}",
            kind(&other)
        ))),
    }
}

fn into_row(item: Value) -> Record {
    match item {
        Value::Object(object) => object,
        scalar => {
            let mut row = Record::new();
            row.insert(VALUE_COLUMN.to_string(), scalar);
            row
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
