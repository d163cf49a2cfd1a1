//! CSV rendering: one file per sheet
//!
//! Machine sheets stack their two ranking tables, each preceded by its title
//! row and separated by an empty row, the way the sheets are laid out in the
//! workbook. Charts have no CSV form and are left out.

use crate::report::{Cell, ReportModel, Sheet, Table};
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Writes every sheet of a report as `<sheet name>.csv`
#[derive(Debug)]
pub struct CsvSheetOutput {
    dir: PathBuf,
}

impl CsvSheetOutput {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// File a sheet is written to
    pub fn sheet_path(&self, sheet: &Sheet) -> PathBuf {
        self.dir.join(format!("{}.csv", sheet.name()))
    }

    /// Write all sheets, returning the files in sheet order
    pub fn write(&self, model: &ReportModel) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output directory: {}", self.dir.display()))?;

        let mut written = Vec::with_capacity(model.sheets.len());
        for sheet in &model.sheets {
            let path = self.sheet_path(sheet);
            let file = fs::File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_sheet(file, sheet)
                .with_context(|| format!("Failed to write sheet '{}'", sheet.name()))?;
            written.push(path);
        }

        Ok(written)
    }
}

fn write_table<W: Write>(writer: &mut csv::Writer<W>, table: &Table) -> csv::Result<()> {
    writer.write_record([table.title.as_str()])?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(Cell::display))?;
    }
    Ok(())
}

/// Render one sheet as CSV into `out`
pub fn write_sheet<W: Write>(out: W, sheet: &Sheet) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(out);

    match sheet {
        Sheet::Machine(machine) => {
            let [duration, occurrence] = machine.tables();
            write_table(&mut writer, &duration)?;
            writer.write_record([""])?;
            write_table(&mut writer, &occurrence)?;
        }
        Sheet::Summary(summary) => write_table(&mut writer, &summary.table)?,
    }

    writer.flush()?;
    Ok(())
}

/// Render one sheet as a CSV string
pub fn sheet_to_csv(sheet: &Sheet) -> Result<String> {
    let mut buf = Vec::new();
    write_sheet(&mut buf, sheet)?;
    Ok(String::from_utf8(buf)?)
}
