//! JSON to CSV conversion.
//!
//! Records are flattened into a single table:
//!
//! - a top-level array holds one object per row, a top-level object is one row
//! - nested objects become dotted columns (`autor.nome`)
//! - arrays stay whole and are written as compact JSON in one cell
//! - columns are the union of all flattened keys, in order of first appearance
//! - missing keys and `null` are written as empty cells

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::{HarvesterError, Result};

/// Separator between parent and child keys of nested objects.
const KEY_SEPARATOR: char = '.';

/// One flattened record: column name to scalar or array value.
pub type Row = Map<String, Value>;

/// Flat tabular form of a JSON dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Build a table from flattened rows, collecting columns in first-seen order.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for key in rows.iter().flat_map(|row| row.keys()) {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
        Self { columns, rows }
    }

    /// Serialize as UTF-8 CSV with a header row and `\n` line endings.
    ///
    /// A table without columns serializes to nothing.
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        if self.columns.is_empty() {
            return Ok(Vec::new());
        }

        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(self.columns.iter().map(|column| cell_text(row.get(column))))?;
        }

        writer
            .into_inner()
            .map_err(|e| HarvesterError::Io(e.into_error()))
    }
}

/// Text written to a CSV cell for a flattened value.
fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn flatten_into(prefix: Option<&str>, object: &Map<String, Value>, row: &mut Row) {
    for (key, value) in object {
        let name = match prefix {
            Some(parent) => format!("{parent}{KEY_SEPARATOR}{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) => flatten_into(Some(&name), nested, row),
            other => {
                row.insert(name, other.clone());
            }
        }
    }
}

/// Flatten one JSON object into a row.
pub fn flatten_record(object: &Map<String, Value>) -> Row {
    let mut row = Row::new();
    flatten_into(None, object, &mut row);
    row
}

/// Normalize a JSON dataset into a table.
pub fn normalize(value: &Value) -> Result<Table> {
    let rows = match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(object) => Ok(flatten_record(object)),
                other => Err(HarvesterError::Conversion(format!(
                    "record {index} is {}, expected an object",
                    kind(other)
                ))),
            })
            .collect::<Result<Vec<_>>>()?,
        Value::Object(object) => vec![flatten_record(object)],
        other => {
            return Err(HarvesterError::Conversion(format!(
                "top-level value is {}, expected an array or an object",
                kind(other)
            )))
        }
    };

    Ok(Table::from_rows(rows))
}

/// Convert a JSON dataset straight to CSV bytes.
pub fn convert(value: &Value) -> Result<Vec<u8>> {
    normalize(value)?.to_csv()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn csv_text(value: Value) -> String {
        String::from_utf8(convert(&value).unwrap()).unwrap()
    }

    #[test]
    fn test_uniform_flat_records() {
        let csv = csv_text(json!([
            {"id": 1, "titulo": "Lei A", "aprovada": true},
            {"id": 2, "titulo": "Lei B", "aprovada": false},
            {"id": 3, "titulo": "Lei C", "aprovada": null},
        ]));
        assert_eq!(
            csv,
            "id,titulo,aprovada\n1,Lei A,true\n2,Lei B,false\n3,Lei C,\n"
        );
    }

    #[test]
    fn test_key_order_follows_source() {
        let value: Value = serde_json::from_str(r#"[{"zeta": 1, "alpha": 2, "mid": 3}]"#).unwrap();
        let table = normalize(&value).unwrap();
        assert_eq!(table.columns, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_nested_objects_use_dotted_columns() {
        let csv = csv_text(json!([
            {"id": 1, "autor": {"nome": "Ana", "partido": {"sigla": "PS"}}},
        ]));
        assert_eq!(csv, "id,autor.nome,autor.partido.sigla\n1,Ana,PS\n");
    }

    #[test]
    fn test_arrays_stay_in_one_cell() {
        let csv = csv_text(json!([
            {"id": 1, "votos": [{"partido": "PS", "voto": "Favor"}], "tags": ["a", "b"]},
        ]));
        assert_eq!(
            csv,
            "id,votos,tags\n1,\"[{\"\"partido\"\":\"\"PS\"\",\"\"voto\"\":\"\"Favor\"\"}]\",\"[\"\"a\"\",\"\"b\"\"]\"\n"
        );
    }

    #[test]
    fn test_union_of_columns_with_missing_cells() {
        let csv = csv_text(json!([
            {"a": 1, "b": 2},
            {"b": 3, "c": {"d": 4}},
        ]));
        assert_eq!(csv, "a,b,c.d\n1,2,\n,3,4\n");
    }

    #[test]
    fn test_empty_nested_object_adds_no_column() {
        let table = normalize(&json!([{"a": 1, "meta": {}}])).unwrap();
        assert_eq!(table.columns, vec!["a"]);
    }

    #[test]
    fn test_top_level_object_is_one_row() {
        let csv = csv_text(json!({"legislatura": "XV", "inicio": "2022-03-29"}));
        assert_eq!(csv, "legislatura,inicio\nXV,2022-03-29\n");
    }

    #[test]
    fn test_cells_with_separators_are_quoted() {
        let csv = csv_text(json!([{"texto": "um, dois\ntrês"}]));
        assert_eq!(csv, "texto\n\"um, dois\ntrês\"\n");
    }

    #[test]
    fn test_empty_array_is_empty_output() {
        assert!(convert(&json!([])).unwrap().is_empty());
    }

    #[test]
    fn test_scalar_is_rejected() {
        let err = convert(&json!(42)).unwrap_err();
        assert!(matches!(err, HarvesterError::Conversion(_)));
        assert!(err.to_string().contains("a number"));

        assert!(matches!(
            convert(&Value::Null),
            Err(HarvesterError::Conversion(_))
        ));
    }

    #[test]
    fn test_non_object_record_is_rejected() {
        let err = convert(&json!([{"a": 1}, "loose"])).unwrap_err();
        assert!(err.to_string().contains("record 1 is a string"));
    }

    #[test]
    fn test_round_trip_counts() {
        let records: Vec<Value> = (0..25)
            .map(|i| json!({"id": i, "nome": format!("n{i}"), "valor": i * 10}))
            .collect();
        let csv = csv_text(Value::Array(records));

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 3);

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 25);
        assert_eq!(&rows[7][0], "7");
        assert_eq!(&rows[7][1], "n7");
        assert_eq!(&rows[7][2], "70");
    }

    #[test]
    fn test_conversion_is_deterministic() {
        let value = json!([{"b": 1, "a": {"x": [1, 2]}}, {"c": "z"}]);
        assert_eq!(convert(&value).unwrap(), convert(&value).unwrap());
    }
}
