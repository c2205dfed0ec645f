use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// A single cell value, detached from the file format it was read from.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    /// Numeric reading of the cell. Numeric text is accepted, with `,` as an
    /// alternative decimal separator.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => s
                .trim()
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display text of the cell; integral numbers lose their fractional part.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => Cell::Empty,
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(_) => Cell::Empty,
        }
    }
}

/// A named table: the first source row provides the column names.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Cell of `row` in column `index`; short rows read as empty.
    pub fn cell(&self, row: &[Cell], index: usize) -> Cell {
        row.get(index).cloned().unwrap_or(Cell::Empty)
    }
}

/// All sheets of an input file, in declared order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

pub fn load_workbook(path: &Path) -> Result<Workbook> {
    info!("Loading workbook {:?}...", path);

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Input workbook has no extension"))?;

    let workbook = match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_spreadsheet(path)?,
        "csv" => load_csv(path)?,
        _ => return Err(anyhow!("Unsupported workbook format: {}", extension)),
    };

    info!("Loaded {} sheets", workbook.sheets.len());
    Ok(workbook)
}

fn load_spreadsheet(path: &Path) -> Result<Workbook> {
    let mut reader = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {:?}", path))?;

    let mut sheets = Vec::new();
    for name in reader.sheet_names() {
        let range = reader
            .worksheet_range(&name)
            .with_context(|| format!("Failed to read sheet '{}'", name))?;

        let mut rows = range.rows();
        let columns: Vec<String> = rows
            .next()
            .map(|header| {
                header
                    .iter()
                    .map(|c| Cell::from(c).to_text().trim().to_string())
                    .collect()
            })
            .unwrap_or_default();
        let rows: Vec<Vec<Cell>> = rows
            .map(|r| r.iter().map(Cell::from).collect::<Vec<Cell>>())
            .filter(|r| !r.iter().all(Cell::is_empty))
            .collect();

        debug!("Sheet '{}': {} columns, {} rows", name, columns.len(), rows.len());
        sheets.push(Sheet::new(name, columns, rows));
    }

    Ok(Workbook { sheets })
}

/// A CSV file is a single sheet named after the file stem.
fn load_csv(path: &Path) -> Result<Workbook> {
    let file = File::open(path).with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("CSV path has no usable file name: {:?}", path))?
        .to_string();

    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(file);
    let columns: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row: Vec<Cell> = record.iter().map(csv_cell).collect();
        if !row.iter().all(Cell::is_empty) {
            rows.push(row);
        }
    }

    debug!("CSV sheet '{}': {} columns, {} rows", name, columns.len(), rows.len());
    Ok(Workbook {
        sheets: vec![Sheet::new(name, columns, rows)],
    })
}

fn csv_cell(field: &str) -> Cell {
    if field.trim().is_empty() {
        Cell::Empty
    } else if let Ok(n) = field.trim().parse::<f64>() {
        Cell::Number(n)
    } else {
        Cell::Text(field.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cell_numeric_reading() {
        assert_eq!(Cell::Number(48.85).as_f64(), Some(48.85));
        assert_eq!(Cell::Text(" 2,35 ".into()).as_f64(), Some(2.35));
        assert_eq!(Cell::Number(0.0).as_f64(), Some(0.0));
        assert_eq!(Cell::Number(f64::NAN).as_f64(), None);
        assert_eq!(Cell::Text("Paris".into()).as_f64(), None);
        assert_eq!(Cell::Empty.as_f64(), None);
        assert_eq!(Cell::Bool(true).as_f64(), None);
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(Cell::Number(12.0).to_text(), "12");
        assert_eq!(Cell::Number(1.5).to_text(), "1.5");
        assert_eq!(Cell::Text("Lycée A".into()).to_text(), "Lycée A");
        assert_eq!(Cell::Empty.to_text(), "");
        assert!(Cell::Text("   ".into()).is_empty());
    }

    #[test]
    fn test_load_csv_as_single_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Museums.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Ville,Museums").unwrap();
        writeln!(file, "Lyon,Louvre Lyon").unwrap();
        writeln!(file, ",").unwrap();
        writeln!(file, "Paris,Orsay").unwrap();
        drop(file);

        let workbook = load_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Museums"]);
        let sheet = &workbook.sheets[0];
        assert_eq!(sheet.columns, vec!["Ville", "Museums"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0][0], Cell::Text("Lyon".into()));
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(load_workbook(Path::new("points.txt")).is_err());
        assert!(load_workbook(Path::new("points")).is_err());
    }
}
