use std::collections::BTreeSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use arrow::error::ArrowError;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use calamine::{Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::{LoadError, Result};
use super::model::{CellValue, Column, Table};
use super::normalize::parse_number;

/// Cell text read as missing, the same set a dataframe reader treats as NaN.
const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];

// ---------------------------------------------------------------------------
// Sources and layout
// ---------------------------------------------------------------------------

/// Where a table comes from: a file on disk or bytes the user uploaded.
#[derive(Debug, Clone)]
pub enum Source {
    Path(PathBuf),
    Upload { name: String, bytes: Vec<u8> },
}

impl Source {
    /// Name used for format detection and messages.
    pub fn name(&self) -> String {
        match self {
            Source::Path(p) => p.display().to_string(),
            Source::Upload { name, .. } => name.clone(),
        }
    }

    fn read_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Source::Path(p) => std::fs::read(p).map_err(|source| LoadError::Io {
                path: p.clone(),
                source,
            }),
            Source::Upload { bytes, .. } => Ok(bytes.clone()),
        }
    }
}

/// Decoder picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    DelimitedText,
    Spreadsheet,
    Columnar,
    Json,
}

impl SourceFormat {
    pub fn from_name(name: &str) -> Result<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(SourceFormat::DelimitedText),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(SourceFormat::Spreadsheet),
            "parquet" | "pq" => Ok(SourceFormat::Columnar),
            "json" => Ok(SourceFormat::Json),
            _ => Err(LoadError::UnsupportedFormat {
                source_name: name.to_string(),
            }),
        }
    }
}

/// How the first rows of the source are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    /// Row 0 is the header.
    Direct,
    /// Row 0 holds a free-text title, row 1 the header.
    TitleThenHeader,
}

/// A decoded table plus the caption found above its header, if any.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub table: Table,
    pub title: Option<String>,
}

/// Rows of cells exactly as the source holds them, header rows included.
type Grid = Vec<Vec<CellValue>>;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// First candidate path that exists, or `SourceNotFound` listing them all.
pub fn default_source(candidates: &[PathBuf]) -> Result<Source> {
    candidates
        .iter()
        .find(|p| p.exists())
        .map(|p| Source::Path(p.clone()))
        .ok_or_else(|| LoadError::SourceNotFound {
            tried: candidates.to_vec(),
        })
}

/// Load a table from a source.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`                 – comma-separated text
/// * `.xlsx` / `.xls` / `.ods` – first worksheet of a spreadsheet
/// * `.parquet`             – flat columns; numbers stay numeric, other types are rendered as text
/// * `.json`                – `[{ "col": value, ... }, ...]`
pub fn load(source: &Source, mode: HeaderMode) -> Result<Loaded> {
    let name = source.name();
    let format = SourceFormat::from_name(&name)?;
    let bytes = source.read_bytes()?;

    let grid = match format {
        SourceFormat::DelimitedText => read_csv(&bytes, &name)?,
        SourceFormat::Spreadsheet => read_spreadsheet(bytes, &name)?,
        SourceFormat::Columnar => read_parquet(bytes, &name)?,
        SourceFormat::Json => read_json(&bytes, &name)?,
    };

    let loaded = grid_to_table(grid, mode, &name)?;
    log::info!(
        "Loaded {name}: {} rows x {} columns",
        loaded.table.row_count(),
        loaded.table.column_count()
    );
    Ok(loaded)
}

fn text_cell(s: &str) -> CellValue {
    if MISSING_TOKENS.contains(&s) {
        CellValue::Missing
    } else {
        CellValue::Text(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn read_csv(bytes: &[u8], name: &str) -> Result<Grid> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut grid = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record =
            result.map_err(|e| LoadError::parse(name, format!("CSV row {row_no}: {e}")))?;
        grid.push(record.iter().map(text_cell).collect());
    }
    Ok(grid)
}

// ---------------------------------------------------------------------------
// Spreadsheet
// ---------------------------------------------------------------------------

fn read_spreadsheet(bytes: Vec<u8>, name: &str) -> Result<Grid> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| LoadError::parse(name, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::parse(name, "workbook has no worksheets"))?
        .map_err(|e| LoadError::parse(name, e))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(spreadsheet_cell).collect())
        .collect())
}

fn spreadsheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => number_cell(*f),
        Data::String(s) => text_cell(s),
        Data::Bool(b) => CellValue::Text(if *b { "True" } else { "False" }.to_string()),
        Data::Empty | Data::Error(_) => CellValue::Missing,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat columns. The field names become grid row 0.
fn read_parquet(bytes: Vec<u8>, name: &str) -> Result<Grid> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes::Bytes::from(bytes))
        .map_err(|e| LoadError::parse(name, format!("reading parquet metadata: {e}")))?;
    let header: Vec<CellValue> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| CellValue::Text(f.name().clone()))
        .collect();
    let reader = builder
        .build()
        .map_err(|e| LoadError::parse(name, format!("building parquet reader: {e}")))?;

    let mut grid = vec![header];
    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| LoadError::parse(name, format!("reading parquet record batch: {e}")))?;
        let columns = batch
            .schema()
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, col)| {
                decode_column(col).map_err(|e| {
                    LoadError::parse(name, format!("decoding column '{}': {e}", field.name()))
                })
            })
            .collect::<Result<Vec<ArrayRef>>>()?;
        for row in 0..batch.num_rows() {
            grid.push(columns.iter().map(|col| extract_cell(col, row)).collect());
        }
    }
    Ok(grid)
}

/// Bring a column to one of the three layouts `extract_cell` reads:
/// `Float64` for every numeric type, `Boolean`, or `Utf8` for the rest.
fn decode_column(col: &ArrayRef) -> std::result::Result<ArrayRef, ArrowError> {
    match col.data_type() {
        DataType::Float64 | DataType::Boolean | DataType::Utf8 => Ok(Arc::clone(col)),
        dt if dt.is_numeric() => cast(col, &DataType::Float64),
        _ => cast(col, &DataType::Utf8).or_else(|_| format_column(col)),
    }
}

/// Display-format each value, for types the cast kernel cannot turn into text.
fn format_column(col: &ArrayRef) -> std::result::Result<ArrayRef, ArrowError> {
    let formatter = ArrayFormatter::try_new(col.as_ref(), &FormatOptions::default())?;
    let text = (0..col.len())
        .map(|i| {
            if col.is_null(i) {
                Ok(None)
            } else {
                formatter.value(i).try_to_string().map(Some)
            }
        })
        .collect::<std::result::Result<StringArray, ArrowError>>()?;
    Ok(Arc::new(text))
}

/// Extract a single value from a decoded Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Missing;
    }
    match col.data_type() {
        DataType::Float64 => col
            .as_primitive_opt::<Float64Type>()
            .map_or(CellValue::Missing, |a| number_cell(a.value(row))),
        DataType::Boolean => col.as_boolean_opt().map_or(CellValue::Missing, |a| {
            CellValue::Text(if a.value(row) { "True" } else { "False" }.to_string())
        }),
        _ => col
            .as_string_opt::<i32>()
            .map_or(CellValue::Missing, |a| text_cell(a.value(row))),
    }
}

fn number_cell(v: f64) -> CellValue {
    if v.is_nan() {
        CellValue::Missing
    } else {
        CellValue::Number(v)
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "TN No": "TN-01", "Contractor": "Apex Builders", "AS (L)": 125.5 },
///   ...
/// ]
/// ```
fn read_json(bytes: &[u8], name: &str) -> Result<Grid> {
    let root: JsonValue =
        serde_json::from_slice(bytes).map_err(|e| LoadError::parse(name, e))?;
    let records = root
        .as_array()
        .ok_or_else(|| LoadError::parse(name, "expected top-level JSON array"))?;

    let mut names: Vec<String> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::parse(name, format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if seen.insert(key.clone()) {
                names.push(key.clone());
            }
        }
    }

    let mut grid = Vec::with_capacity(records.len() + 1);
    grid.push(names.iter().map(|n| CellValue::Text(n.clone())).collect());
    for rec in records {
        grid.push(
            names
                .iter()
                .map(|key| json_to_cell(rec.get(key).unwrap_or(&JsonValue::Null)))
                .collect(),
        );
    }
    Ok(grid)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => text_cell(s),
        JsonValue::Number(n) => n.as_f64().map_or(CellValue::Missing, number_cell),
        JsonValue::Bool(b) => CellValue::Text(if *b { "True" } else { "False" }.to_string()),
        JsonValue::Null => CellValue::Missing,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Grid → Table
// ---------------------------------------------------------------------------

fn grid_to_table(grid: Grid, mode: HeaderMode, name: &str) -> Result<Loaded> {
    let mut rows = grid.into_iter();

    let title = match mode {
        HeaderMode::Direct => None,
        HeaderMode::TitleThenHeader => {
            let title_row = rows
                .next()
                .ok_or_else(|| LoadError::parse(name, "file is empty"))?;
            title_row
                .first()
                .and_then(CellValue::as_text)
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
        }
    };

    let header = rows
        .next()
        .ok_or_else(|| LoadError::parse(name, "no header row"))?;
    let data: Vec<Vec<CellValue>> = rows.collect();

    let width = data
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);
    let names = column_names(&header, width);
    let infer_types = mode == HeaderMode::Direct;

    let columns = names
        .into_iter()
        .enumerate()
        .map(|(i, col_name)| {
            let cells = data
                .iter()
                .map(|row| row.get(i).cloned().unwrap_or(CellValue::Missing));
            build_column(col_name, cells, infer_types)
        })
        .collect();

    Ok(Loaded {
        table: Table::new(columns)?,
        title,
    })
}

/// Header names padded to `width`, blanks named `Unnamed: {i}`, repeats suffixed `.1`, `.2`.
fn column_names(header: &[CellValue], width: usize) -> Vec<String> {
    let mut used: BTreeSet<String> = BTreeSet::new();
    (0..width)
        .map(|i| {
            let base = header
                .get(i)
                .and_then(CellValue::as_text)
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| format!("Unnamed: {i}"));
            let mut candidate = base.clone();
            let mut n = 1;
            while used.contains(&candidate) {
                candidate = format!("{base}.{n}");
                n += 1;
            }
            used.insert(candidate.clone());
            candidate
        })
        .collect()
}

/// Typed numeric when every present cell reads as a plain number and
/// `infer_types` is set; text otherwise.
fn build_column(name: String, cells: impl Iterator<Item = CellValue>, infer_types: bool) -> Column {
    let cells: Vec<CellValue> = cells.collect();

    if infer_types {
        let numbers: Option<Vec<Option<f64>>> = cells
            .iter()
            .map(|c| match c {
                CellValue::Missing => Some(None),
                CellValue::Number(v) => Some(Some(*v)),
                CellValue::Text(s) => parse_number(s).map(Some),
            })
            .collect();
        if let Some(values) = numbers {
            return Column::numeric(name, values);
        }
    }

    Column::text(name, cells.iter().map(CellValue::as_text).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Date32Array, DictionaryArray, Float32Array, Int16Array, UInt32Array};
    use arrow::datatypes::Int32Type;
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use rust_xlsxwriter::Workbook;

    fn upload(name: &str, text: &str) -> Source {
        Source::Upload {
            name: name.to_string(),
            bytes: text.as_bytes().to_vec(),
        }
    }

    #[test]
    fn direct_mode_infers_clean_numeric_columns() {
        let src = upload("t.csv", "Sl.No,Name,AS (L)\n1,Road,\"1,200\"\n2,Drain,300\n3,,NA\n");
        let loaded = load(&src, HeaderMode::Direct).unwrap();
        let t = &loaded.table;

        assert_eq!(loaded.title, None);
        assert_eq!(t.row_count(), 3);
        assert!(t.column("Sl.No").unwrap().is_numeric());
        assert!(!t.column("Name").unwrap().is_numeric());
        assert_eq!(t.column("Name").unwrap().cell(2), CellValue::Missing);
        // thousands separators are left for the normalizer
        assert!(!t.column("AS (L)").unwrap().is_numeric());
    }

    #[test]
    fn title_mode_skips_title_and_keeps_text() {
        let src = upload(
            "e.csv",
            "  Estimate for KU campus  ,,\nItems,Qty,Total Amt\nCement,10,\"1,000\"\nLumpsum,,500\n",
        );
        let loaded = load(&src, HeaderMode::TitleThenHeader).unwrap();

        assert_eq!(loaded.title.as_deref(), Some("Estimate for KU campus"));
        assert_eq!(loaded.table.column_names(), vec!["Items", "Qty", "Total Amt"]);
        assert_eq!(loaded.table.row_count(), 2);
        assert!(loaded.table.columns().iter().all(|c| !c.is_numeric()));
    }

    #[test]
    fn ragged_rows_are_padded_and_names_deduplicated() {
        let src = upload("r.csv", "a,a,\n1,2\n3,4,5,6\n");
        let t = load(&src, HeaderMode::Direct).unwrap().table;

        assert_eq!(t.column_names(), vec!["a", "a.1", "Unnamed: 2", "Unnamed: 3"]);
        assert_eq!(t.column("Unnamed: 3").unwrap().number(0), None);
        assert_eq!(t.column("Unnamed: 3").unwrap().number(1), Some(6.0));
    }

    #[test]
    fn json_records_become_columns() {
        let src = upload("j.json", r#"[{"Items": "A", "Amt": 1.5}, {"Items": "B", "Amt": null}]"#);
        let t = load(&src, HeaderMode::Direct).unwrap().table;

        assert_eq!(t.column("Amt").unwrap().number(0), Some(1.5));
        assert_eq!(t.column("Amt").unwrap().number(1), None);
        assert_eq!(t.column("Items").unwrap().text_at(1).as_deref(), Some("B"));
    }

    fn parquet_upload(batch: RecordBatch) -> Source {
        let mut writer = ArrowWriter::try_new(Vec::new(), batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        Source::Upload {
            name: "typed.parquet".to_string(),
            bytes: writer.into_inner().unwrap(),
        }
    }

    #[test]
    fn parquet_integer_and_float_types_stay_numeric() {
        let batch = RecordBatch::try_from_iter(vec![
            ("Year", Arc::new(Int16Array::from(vec![2023, 2024])) as ArrayRef),
            ("Lots", Arc::new(UInt32Array::from(vec![Some(7), None])) as ArrayRef),
            ("CV (L)", Arc::new(Float32Array::from(vec![1.5, f32::NAN])) as ArrayRef),
        ])
        .unwrap();
        let t = load(&parquet_upload(batch), HeaderMode::Direct).unwrap().table;

        assert!(t.columns().iter().all(Column::is_numeric));
        assert_eq!(t.column("Year").unwrap().number(1), Some(2024.0));
        assert_eq!(t.column("Lots").unwrap().number(0), Some(7.0));
        assert_eq!(t.column("Lots").unwrap().cell(1), CellValue::Missing);
        assert_eq!(t.column("CV (L)").unwrap().number(0), Some(1.5));
        assert_eq!(t.column("CV (L)").unwrap().cell(1), CellValue::Missing);
    }

    #[test]
    fn parquet_dates_and_dictionaries_read_as_text() {
        let contractors: DictionaryArray<Int32Type> =
            vec!["Apex", "Delta"].into_iter().collect();
        let batch = RecordBatch::try_from_iter(vec![
            ("Opened", Arc::new(Date32Array::from(vec![19372, 19783])) as ArrayRef),
            ("Contractor", Arc::new(contractors) as ArrayRef),
        ])
        .unwrap();
        let t = load(&parquet_upload(batch), HeaderMode::Direct).unwrap().table;

        let opened = t.column("Opened").unwrap();
        assert_eq!(opened.text_at(0).as_deref(), Some("2023-01-15"));
        assert_eq!(opened.text_at(1).as_deref(), Some("2024-03-01"));
        let contractor = t.column("Contractor").unwrap();
        assert_eq!(contractor.text_at(0).as_deref(), Some("Apex"));
        assert_eq!(contractor.text_at(1).as_deref(), Some("Delta"));
    }

    fn xlsx_upload(rows: &[&[XlsxCell]]) -> Source {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                let written = match cell {
                    XlsxCell::Text(s) => sheet.write_string(r, c, *s).map(|_| ()),
                    XlsxCell::Number(v) => sheet.write_number(r, c, *v).map(|_| ()),
                    XlsxCell::Blank => Ok(()),
                };
                written.unwrap();
            }
        }
        Source::Upload {
            name: "sheet.xlsx".to_string(),
            bytes: workbook.save_to_buffer().unwrap(),
        }
    }

    enum XlsxCell {
        Text(&'static str),
        Number(f64),
        Blank,
    }

    #[test]
    fn spreadsheet_direct_mode_types_columns() {
        use XlsxCell::*;
        let src = xlsx_upload(&[
            &[Text("Items"), Text("Qty"), Text("Rate")],
            &[Text("Cement"), Number(10.0), Number(5.5)],
            &[Text("Sand"), Blank, Number(2.0)],
            &[Text("Lumpsum"), Number(3.0), Blank],
        ]);
        let loaded = load(&src, HeaderMode::Direct).unwrap();
        let t = &loaded.table;

        assert_eq!(loaded.title, None);
        assert_eq!(t.column_names(), vec!["Items", "Qty", "Rate"]);
        assert_eq!(t.row_count(), 3);
        assert!(!t.column("Items").unwrap().is_numeric());
        assert_eq!(t.column("Qty").unwrap().number(0), Some(10.0));
        assert_eq!(t.column("Qty").unwrap().cell(1), CellValue::Missing);
        assert_eq!(t.column("Rate").unwrap().number(0), Some(5.5));
        assert_eq!(t.column("Rate").unwrap().cell(2), CellValue::Missing);
    }

    #[test]
    fn spreadsheet_title_mode_reads_caption_and_header() {
        use XlsxCell::*;
        let src = xlsx_upload(&[
            &[Text("KU Hostel Estimate")],
            &[Text("Items"), Text("Total Amt")],
            &[Text("Cement"), Number(1000.0)],
            &[Text("Lumpsum"), Number(500.0)],
        ]);
        let loaded = load(&src, HeaderMode::TitleThenHeader).unwrap();
        let t = &loaded.table;

        assert_eq!(loaded.title.as_deref(), Some("KU Hostel Estimate"));
        assert_eq!(t.column_names(), vec!["Items", "Total Amt"]);
        assert_eq!(t.row_count(), 2);
        assert!(t.columns().iter().all(|c| !c.is_numeric()));
        assert_eq!(t.column("Total Amt").unwrap().text_at(0).as_deref(), Some("1000"));
    }

    #[test]
    fn spreadsheet_cells_map_to_values() {
        assert_eq!(spreadsheet_cell(&Data::Empty), CellValue::Missing);
        assert_eq!(spreadsheet_cell(&Data::Float(f64::NAN)), CellValue::Missing);
        assert_eq!(spreadsheet_cell(&Data::Float(2.5)), CellValue::Number(2.5));
        assert_eq!(spreadsheet_cell(&Data::Int(4)), CellValue::Number(4.0));
        assert_eq!(spreadsheet_cell(&Data::String("NA".into())), CellValue::Missing);
    }

    #[test]
    fn empty_and_unknown_sources_are_errors() {
        assert!(matches!(
            load(&upload("empty.csv", ""), HeaderMode::Direct),
            Err(LoadError::Parse { .. })
        ));
        assert!(matches!(
            load(&upload("notes.txt", "a\n1\n"), HeaderMode::Direct),
            Err(LoadError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn missing_default_lists_every_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let candidates = vec![dir.path().join("A.csv"), dir.path().join("a.csv")];
        match default_source(&candidates) {
            Err(LoadError::SourceNotFound { tried }) => assert_eq!(tried, candidates),
            other => panic!("expected SourceNotFound, got {other:?}"),
        }

        std::fs::write(&candidates[1], "x\n1\n").unwrap();
        match default_source(&candidates).unwrap() {
            Source::Path(p) => assert_eq!(p, candidates[1]),
            other => panic!("unexpected source {other:?}"),
        }
    }
}
