//! JSON Lines dataset writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::table::RecordTable;

/// One JSON object per row.
pub fn write_table(path: &Path, table: &RecordTable) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for row in table.rows() {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
