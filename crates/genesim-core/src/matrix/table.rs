//! Labeled two-dimensional tables of similarity values

use crate::{Error, Result};
use std::collections::{HashMap, HashSet};

/// Dense table addressed by row and column labels.
///
/// Absent cells are stored as NaN and surface as `None` from [`get`].
///
/// [`get`]: SimilarityMatrix::get
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    rows: Vec<String>,
    columns: Vec<String>,
    row_index: HashMap<String, usize>,
    column_index: HashMap<String, usize>,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Build a table from row-major values. Labels must be unique per axis.
    pub fn new(rows: Vec<String>, columns: Vec<String>, values: Vec<f64>) -> Result<Self> {
        ensure_unique("row", &rows)?;
        ensure_unique("column", &columns)?;

        if values.len() != rows.len() * columns.len() {
            return Err(Error::InvalidInput(format!(
                "table of {} rows and {} columns needs {} values, got {}",
                rows.len(),
                columns.len(),
                rows.len() * columns.len(),
                values.len()
            )));
        }
        Ok(Self::from_parts(rows, columns, values))
    }

    /// Square table labeled the same way on both axes.
    pub fn square(labels: Vec<String>, values: Vec<f64>) -> Result<Self> {
        Self::new(labels.clone(), labels, values)
    }

    pub(super) fn from_parts(rows: Vec<String>, columns: Vec<String>, values: Vec<f64>) -> Self {
        Self {
            row_index: index_of(&rows),
            column_index: index_of(&columns),
            rows,
            columns,
            values,
        }
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    /// Value at `(row, column)`, `None` when a label is unknown or the cell is absent.
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let i = *self.row_index.get(row)?;
        let j = *self.column_index.get(column)?;
        let value = self.values[i * self.columns.len() + j];
        (!value.is_nan()).then_some(value)
    }

    /// Number of absent cells
    pub fn absent_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }
}

fn ensure_unique(axis: &str, labels: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(labels.len());
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(Error::InvalidInput(format!(
                "{} label '{}' appears more than once",
                axis, label
            )));
        }
    }
    Ok(())
}

fn index_of(labels: &[String]) -> HashMap<String, usize> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| (label.clone(), i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_get_by_labels_in_either_order() {
        let m = SimilarityMatrix::square(labels(&["A", "B"]), vec![1.0, 0.3, 0.4, 1.0]).unwrap();
        assert_eq!(m.get("A", "B"), Some(0.3));
        assert_eq!(m.get("B", "A"), Some(0.4));
        assert_eq!(m.get("A", "Z"), None);
        assert_eq!(m.shape(), (2, 2));
    }

    #[test]
    fn test_columns_may_be_ordered_differently() {
        let m = SimilarityMatrix::new(
            labels(&["A", "B"]),
            labels(&["B", "A"]),
            vec![0.3, 1.0, 1.0, 0.4],
        )
        .unwrap();
        assert_eq!(m.get("A", "B"), Some(0.3));
        assert_eq!(m.get("A", "A"), Some(1.0));
        assert_eq!(m.get("B", "A"), Some(0.4));
    }

    #[test]
    fn test_nan_is_absent() {
        let m = SimilarityMatrix::square(labels(&["A", "B"]), vec![1.0, f64::NAN, f64::NAN, 1.0])
            .unwrap();
        assert_eq!(m.get("A", "B"), None);
        assert_eq!(m.absent_count(), 2);
    }

    #[test]
    fn test_repeated_labels_rejected() {
        let err = SimilarityMatrix::new(labels(&["A", "B"]), labels(&["A", "A"]), vec![1.0; 4])
            .unwrap_err();
        assert!(err.to_string().contains("column label 'A'"));
    }

    #[test]
    fn test_shape_mismatch() {
        let err = SimilarityMatrix::square(labels(&["A", "B"]), vec![1.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
