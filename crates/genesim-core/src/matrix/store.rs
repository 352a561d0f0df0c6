//! Table-file container
//!
//! A table-file is a JSON object mapping table names to tables in the pandas
//! "split" orientation (`index`, `columns`, `data`). Names may carry a leading
//! `/` as HDF store keys do; it is stripped on load.

use super::table::SimilarityMatrix;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct RawTable {
    index: Vec<String>,
    columns: Vec<String>,
    data: Vec<Vec<Option<RawCell>>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCell {
    Number(f64),
    Text(String),
}

impl RawCell {
    fn value(&self) -> Result<f64> {
        match self {
            RawCell::Number(v) => Ok(*v),
            RawCell::Text(text) => {
                let text = text.trim();
                if text.is_empty() || text.eq_ignore_ascii_case("nan") {
                    return Ok(f64::NAN);
                }
                text.parse()
                    .map_err(|_| Error::InvalidInput(format!("'{}' is not a number", text)))
            }
        }
    }
}

/// Named tables loaded from a table-file
#[derive(Debug, Default)]
pub struct TableStore {
    tables: BTreeMap<String, SimilarityMatrix>,
}

impl TableStore {
    /// Open a table-file and load every table it contains
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingInput(path.display().to_string()));
        }
        let file = File::open(path)?;
        let store = Self::from_reader(BufReader::new(file))?;

        let names: Vec<&str> = store.names().collect();
        info!(path = %path.display(), tables = ?names, "Opened table-file");
        Ok(store)
    }

    /// Load every table from a JSON stream
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let raw: BTreeMap<String, RawTable> = serde_json::from_reader(reader)?;

        let mut tables = BTreeMap::new();
        for (key, table) in raw {
            let name = key.trim_start_matches('/').to_string();
            debug!(table = %name, rows = table.index.len(), "Loading table");
            let matrix = to_matrix(&name, table)?;
            tables.insert(name, matrix);
        }

        Ok(Self { tables })
    }

    /// Table names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Remove and return a table
    pub fn take(&mut self, name: &str) -> Option<SimilarityMatrix> {
        self.tables.remove(name)
    }
}

fn to_matrix(name: &str, table: RawTable) -> Result<SimilarityMatrix> {
    if table.data.len() != table.index.len() {
        return Err(Error::InvalidInput(format!(
            "table '{}' has {} index labels but {} data rows",
            name,
            table.index.len(),
            table.data.len()
        )));
    }

    let width = table.columns.len();
    let mut values = Vec::with_capacity(table.index.len() * width);
    for (row, cells) in table.index.iter().zip(&table.data) {
        if cells.len() != width {
            return Err(Error::InvalidInput(format!(
                "table '{}' row '{}' has {} cells, expected {}",
                name,
                row,
                cells.len(),
                width
            )));
        }
        for cell in cells {
            values.push(match cell {
                Some(cell) => cell.value()?,
                None => f64::NAN,
            });
        }
    }

    SimilarityMatrix::new(table.index, table.columns, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TABLE_FILE: &str = r#"{
        "/cosine": {
            "index": ["A", "B"],
            "columns": ["A", "B"],
            "data": [[1.0, "nan"], [null, 1.0]]
        },
        "pvals": {
            "index": ["A", "B"],
            "columns": ["A", "B"],
            "data": [[0.0, "0.04"], ["", 0.0]]
        }
    }"#;

    #[test]
    fn test_load_strips_keys_and_reads_sentinels() {
        let mut store = TableStore::from_reader(TABLE_FILE.as_bytes()).unwrap();
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["cosine", "pvals"]);

        let cosine = store.take("cosine").unwrap();
        assert_eq!(cosine.get("A", "A"), Some(1.0));
        assert_eq!(cosine.get("A", "B"), None);
        assert_eq!(cosine.get("B", "A"), None);

        let pvals = store.take("pvals").unwrap();
        assert_eq!(pvals.get("A", "B"), Some(0.04));
        assert_eq!(pvals.get("B", "A"), None);
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let json = r#"{"cosine": {"index": ["A"], "columns": ["A", "B"], "data": [[1.0]]}}"#;
        let err = TableStore::from_reader(json.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_rejects_repeated_index_label() {
        let json = r#"{"cosine": {
            "index": ["A", "B", "A"],
            "columns": ["A", "B", "C"],
            "data": [[1.0, 0.5, 0.2], [0.5, 1.0, 0.3], [0.2, 0.3, 1.0]]
        }}"#;
        let err = TableStore::from_reader(json.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref msg) if msg.contains("'A'")));
    }

    #[test]
    fn test_rejects_non_numeric_text() {
        let json = r#"{"cosine": {"index": ["A"], "columns": ["A"], "data": [["high"]]}}"#;
        let err = TableStore::from_reader(json.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("high"));
    }

    #[test]
    fn test_open_missing_file() {
        let err = TableStore::open(Path::new("/nonexistent/similarities.json")).unwrap_err();
        assert_eq!(err.code(), "E100");
    }

    #[test]
    fn test_open_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TABLE_FILE.as_bytes()).unwrap();

        let mut store = TableStore::open(file.path()).unwrap();
        assert!(store.take("cosine").is_some());
        assert!(store.take("cosine").is_none());
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["pvals"]);
    }
}
