//! Low-level bulk copy
//!
//! Appends rows from a tab-delimited stream straight into a table, the way a
//! `COPY ... FROM` would. Values are bound as text and converted by SQLite's
//! column affinity. Model validation is skipped entirely: only the storage
//! constraints (NOT NULL, UNIQUE, foreign keys) apply, and any violation
//! rolls back the whole copy.

use crate::storage::Database;
use crate::{Error, Result};
use std::io::{Read, Write};
use tracing::debug;

/// Marker for a NULL field in a copy stream
pub const NULL_MARKER: &str = "\\N";

/// Tables that accept bulk copies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyTarget {
    /// `genes (systematic_name, common_name)`
    Genes,
    /// `gene_similarities (gene1_id, gene2_id, metric, score)`
    Similarities,
}

impl CopyTarget {
    pub fn table(&self) -> &'static str {
        match self {
            CopyTarget::Genes => "genes",
            CopyTarget::Similarities => "gene_similarities",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            CopyTarget::Genes => &["systematic_name", "common_name"],
            CopyTarget::Similarities => &["gene1_id", "gene2_id", "metric", "score"],
        }
    }

    fn insert_sql(&self) -> String {
        let columns = self.columns();
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table(),
            columns.join(", "),
            placeholders
        )
    }
}

/// Build a writer producing the delimited format `copy_from` reads
pub fn copy_writer<W: Write>(inner: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(inner)
}

/// Copy every record of `reader` into `target` inside one transaction.
///
/// Returns the number of rows appended.
pub async fn copy_from<R: Read + Send>(db: &Database, reader: R, target: CopyTarget) -> Result<u64> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let sql = target.insert_sql();
    let width = target.columns().len();
    let mut record = csv::StringRecord::new();
    let mut copied = 0u64;

    let mut tx = db.pool().begin().await?;

    while rdr.read_record(&mut record)? {
        if record.len() != width {
            return Err(Error::InvalidInput(format!(
                "copy into {} expects {} fields, line {} has {}",
                target.table(),
                width,
                copied + 1,
                record.len()
            )));
        }

        let mut query = sqlx::query(&sql);
        for field in record.iter() {
            let value = (field != NULL_MARKER).then(|| field.to_string());
            query = query.bind(value);
        }
        query.execute(&mut *tx).await?;
        copied += 1;
    }

    tx.commit().await?;

    debug!(table = target.table(), rows = copied, "Bulk copy committed");
    Ok(copied)
}
