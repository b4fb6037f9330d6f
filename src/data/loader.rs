use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::LoadError;
use super::model::{CellValue, Dataset};
use super::schema::ColumnMapping;
use super::xlsx;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the participant dataset from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` – first sheet of the workbook (recommended)
/// * `.csv`            – header row, every cell kept as text
/// * `.json`           – `[{ "Full Name": "...", "County": "...", ... }, ...]`
/// * `.parquet`        – flat string / integer / float / boolean columns
///
/// The first non-blank row is the header; blank rows are skipped. The file
/// is closed before this returns, on every path.
pub fn load(path: &Path, columns: &ColumnMapping) -> Result<Dataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let sheet = match ext.as_str() {
        "xlsx" | "xlsm" => load_xlsx(path)?,
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    sheet.into_dataset(columns)
}

/// Load, or fall back to an empty dataset when anything goes wrong.
///
/// The error is logged and handed back so the caller can show it.
pub fn load_or_empty(path: Option<&Path>, columns: &ColumnMapping) -> (Dataset, Option<LoadError>) {
    let result = match path {
        Some(path) => load(path, columns),
        None => Err(LoadError::NotConfigured),
    };

    match result {
        Ok(dataset) => {
            log::info!(
                "Loaded {} records across {} counties",
                dataset.len(),
                dataset.counties().len()
            );
            (dataset, None)
        }
        Err(e) => {
            log::warn!("Continuing with an empty dataset: {e}");
            (Dataset::default(), Some(e))
        }
    }
}

// ---------------------------------------------------------------------------
// Sheet – format-independent intermediate table
// ---------------------------------------------------------------------------

/// Header row plus data rows, before mapping onto records.
#[derive(Debug, Default)]
struct Sheet {
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

fn is_blank(row: &[CellValue]) -> bool {
    row.iter().all(CellValue::is_empty)
}

impl Sheet {
    /// Split raw rows into header and data, dropping blank rows.
    fn from_rows(rows: Vec<Vec<CellValue>>) -> Result<Self, LoadError> {
        let mut rows = rows.into_iter().filter(|row| !is_blank(row));
        let header = rows.next().ok_or(LoadError::NoHeader)?;
        Ok(Sheet {
            headers: header.iter().map(|c| c.to_text().into_owned()).collect(),
            rows: rows.collect(),
        })
    }

    /// Headers known up front (JSON keys, Parquet schema); blank rows dropped.
    fn with_headers(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Sheet {
            headers,
            rows: rows.into_iter().filter(|row| !is_blank(row)).collect(),
        }
    }

    fn into_dataset(self, columns: &ColumnMapping) -> Result<Dataset, LoadError> {
        if self.headers.is_empty() {
            return Err(LoadError::NoHeader);
        }
        let index = columns.resolve(&self.headers)?;
        let records = self.rows.iter().map(|row| index.record(row)).collect();
        Ok(Dataset::from_records(records))
    }
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// XLSX loader
// ---------------------------------------------------------------------------

fn load_xlsx(path: &Path) -> Result<Sheet, LoadError> {
    let file = open(path)?;
    let rows = xlsx::read_first_sheet(BufReader::new(file))
        .map_err(|e| LoadError::malformed(path, e))?;
    Sheet::from_rows(rows)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV cells stay text so IDs and phone numbers keep leading zeros.
fn load_csv(path: &Path) -> Result<Sheet, LoadError> {
    let file = open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| LoadError::malformed(path, format!("row {row_no}: {e}")))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }
    Sheet::from_rows(rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Full Name": "Jane Doe", "WHAT IS YOUR NATIONAL ID?": 12345678, "County": "Nairobi" },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Sheet, LoadError> {
    let file = open(path)?;
    let root: JsonValue = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| LoadError::malformed(path, e))?;

    let objects = root
        .as_array()
        .ok_or_else(|| LoadError::malformed(path, "expected a top-level JSON array"))?;

    let mut headers: Vec<String> = Vec::new();
    for (i, obj) in objects.iter().enumerate() {
        let obj = obj
            .as_object()
            .ok_or_else(|| LoadError::malformed(path, format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = objects
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_cell).unwrap_or(CellValue::Empty))
                .collect()
        })
        .collect();

    Ok(Sheet::with_headers(headers, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::from_number(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Empty,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet export. Column names are the headers; every column must be
/// flat (no lists or structs are read).
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Sheet, LoadError> {
    let file = open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| LoadError::malformed(path, e))?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().map_err(|e| LoadError::malformed(path, e))?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.map_err(|e| LoadError::malformed(path, e))?;
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| arrow_cell(col, row))
                    .collect(),
            );
        }
    }

    Ok(Sheet::with_headers(headers, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Empty;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => CellValue::Integer(col.as_primitive::<UInt8Type>().value(row).into()),
        DataType::UInt16 => CellValue::Integer(col.as_primitive::<UInt16Type>().value(row).into()),
        DataType::UInt32 => CellValue::Integer(col.as_primitive::<UInt32Type>().value(row).into()),
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v)
                .map(CellValue::Integer)
                .unwrap_or_else(|_| CellValue::Text(v.to_string()))
        }
        DataType::Float32 => {
            CellValue::from_number(col.as_primitive::<Float32Type>().value(row).into())
        }
        DataType::Float64 => CellValue::from_number(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        _ => arrow::util::display::array_value_to_string(col, row)
            .map(CellValue::Text)
            .unwrap_or(CellValue::Empty),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field as ArrowField, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::TempDir;

    use super::*;
    use crate::data::model::Field;
    use crate::data::xlsx::fixtures::{self, Cell};

    const HEADER_CSV: &str = "Full Name,WHAT IS YOUR NATIONAL ID?,Phone Number,County,Gender,Age,\
WHAT IS THE MAIN INDUSTRY SECTOR IN WHICH YOU OPERATE IN?,IS YOUR BUSINESS REGISTERED?";

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path
    }

    fn header_cells() -> Vec<Cell<'static>> {
        HEADER_CSV.split(',').map(Cell::Shared).collect()
    }

    #[test]
    fn loads_xlsx_with_numeric_ids() {
        let dir = TempDir::new().unwrap();
        let bytes = fixtures::workbook(&[
            header_cells(),
            vec![
                Cell::Shared("Jane Doe"),
                Cell::Number("12345678"),
                Cell::Number("254712345678"),
                Cell::Shared("Nairobi"),
                Cell::Shared("Female"),
                Cell::Number("34"),
                Cell::Inline("Agriculture"),
                Cell::Shared("Yes"),
            ],
            vec![],
            vec![
                Cell::Shared("John Doe"),
                Cell::Inline("00456"),
                Cell::Inline("0712000000"),
                Cell::Shared("Kisumu"),
            ],
        ]);
        let path = write(&dir, "JGP.xlsx", &bytes);

        let ds = load(&path, &ColumnMapping::default()).unwrap();
        assert_eq!(ds.len(), 2);
        let jane = &ds.records()[0];
        assert_eq!(jane.national_id, "12345678");
        assert_eq!(jane.phone_number, "254712345678");
        assert_eq!(jane.age, CellValue::Integer(34));
        assert_eq!(jane.field_text(Field::IndustrySector), "Agriculture");
        assert_eq!(jane.business_registered, "Yes");

        let john = &ds.records()[1];
        assert_eq!(john.national_id, "00456");
        assert_eq!(john.gender, "");
        assert_eq!(ds.counties(), ["Kisumu", "Nairobi"]);
    }

    #[test]
    fn loads_csv_as_text() {
        let dir = TempDir::new().unwrap();
        let body = format!(
            "{HEADER_CSV}\nJane Doe,0123,0712345678,Nairobi,Female,34,Retail,No\n,,,,,,,\n\
             John Doe,456,0700000000,kisumu,Male,,Transport,Yes\n"
        );
        let path = write(&dir, "jgp.CSV", body.as_bytes());

        let ds = load(&path, &ColumnMapping::default()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records()[0].national_id, "0123");
        assert_eq!(ds.records()[0].age, CellValue::Text("34".into()));
        assert_eq!(ds.records()[1].age, CellValue::Empty);
        assert_eq!(ds.counties(), ["Nairobi", "kisumu"]);
    }

    #[test]
    fn loads_records_oriented_json() {
        let dir = TempDir::new().unwrap();
        let body = r#"[
            {"Full Name": "Jane Doe", "WHAT IS YOUR NATIONAL ID?": 123.0, "Phone Number": 712345678,
             "County": "Nairobi", "Gender": "F", "Age": 30,
             "WHAT IS THE MAIN INDUSTRY SECTOR IN WHICH YOU OPERATE IN?": "Retail",
             "IS YOUR BUSINESS REGISTERED?": null}
        ]"#;
        let path = write(&dir, "jgp.json", body.as_bytes());

        let ds = load(&path, &ColumnMapping::default()).unwrap();
        let jane = &ds.records()[0];
        assert_eq!(jane.national_id, "123");
        assert_eq!(jane.phone_number, "712345678");
        assert_eq!(jane.business_registered, "");
    }

    #[test]
    fn loads_parquet_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jgp.parquet");
        let mapping = ColumnMapping::default();

        let mut fields = Vec::new();
        let mut arrays: Vec<ArrayRef> = Vec::new();
        for field in Field::ALL {
            let name = mapping.header(field);
            match field {
                Field::NationalId => {
                    fields.push(ArrowField::new(name, DataType::Int64, true));
                    arrays.push(Arc::new(Int64Array::from(vec![Some(12345678), None])));
                }
                Field::Age => {
                    fields.push(ArrowField::new(name, DataType::Float64, true));
                    arrays.push(Arc::new(Float64Array::from(vec![34.0, 41.5])));
                }
                _ => {
                    fields.push(ArrowField::new(name, DataType::Utf8, true));
                    arrays.push(Arc::new(StringArray::from(vec!["a", "b"])));
                }
            }
        }
        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), arrays).unwrap();
        let file = File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load(&path, &mapping).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records()[0].national_id, "12345678");
        assert_eq!(ds.records()[0].age, CellValue::Integer(34));
        assert_eq!(ds.records()[1].national_id, "");
        assert_eq!(ds.records()[1].age, CellValue::Float(41.5));
    }

    #[test]
    fn null_json_rows_are_skipped() {
        let dir = TempDir::new().unwrap();
        let row = |name: Option<&str>, county: Option<&str>| -> JsonValue {
            HEADER_CSV
                .split(',')
                .map(|h| {
                    let v = match h {
                        "Full Name" => name,
                        "County" => county,
                        _ => None,
                    };
                    (h.to_string(), v.map_or(JsonValue::Null, JsonValue::from))
                })
                .collect::<serde_json::Map<_, _>>()
                .into()
        };
        let body = JsonValue::Array(vec![
            row(Some("Jane Doe"), Some("Nairobi")),
            row(None, None),
            row(Some("John Doe"), Some("Kisumu")),
        ]);
        let path = write(&dir, "jgp.json", body.to_string().as_bytes());

        let ds = load(&path, &ColumnMapping::default()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.counties(), ["Kisumu", "Nairobi"]);
    }

    #[test]
    fn null_parquet_rows_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jgp.parquet");
        let mapping = ColumnMapping::default();

        let fields: Vec<ArrowField> = Field::ALL
            .iter()
            .map(|&f| ArrowField::new(mapping.header(f), DataType::Utf8, true))
            .collect();
        let arrays: Vec<ArrayRef> = Field::ALL
            .iter()
            .map(|_| Arc::new(StringArray::from(vec![Some("x"), None, Some("y")])) as ArrayRef)
            .collect();
        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), arrays).unwrap();
        let file = File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load(&path, &mapping).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.counties(), ["x", "y"]);
    }

    #[test]
    fn missing_file_degrades_to_empty_dataset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.xlsx");
        let (ds, err) = load_or_empty(Some(&path), &ColumnMapping::default());
        assert!(ds.is_empty());
        assert!(ds.counties().is_empty());
        assert!(matches!(err, Some(LoadError::Io { .. })));
    }

    #[test]
    fn corrupt_xlsx_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "broken.xlsx", b"PK\x03\x04 definitely not a workbook");
        let (ds, err) = load_or_empty(Some(&path), &ColumnMapping::default());
        assert!(ds.is_empty());
        assert!(matches!(err, Some(LoadError::Malformed { .. })));
    }

    #[test]
    fn missing_columns_fail_at_load_time() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "jgp.csv", b"Full Name,County\nJane,Nairobi\n");
        let err = load(&path, &ColumnMapping::default()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumns(ref cols) if cols.len() == 6));
        assert!(err.to_string().contains("Phone Number"));
    }

    #[test]
    fn empty_file_has_no_header() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "empty.csv", b"");
        assert!(matches!(
            load(&path, &ColumnMapping::default()),
            Err(LoadError::NoHeader)
        ));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "jgp.ods", b"");
        assert!(matches!(
            load(&path, &ColumnMapping::default()),
            Err(LoadError::UnsupportedFormat(ext)) if ext == "ods"
        ));
    }

    #[test]
    fn unconfigured_path_degrades() {
        let (ds, err) = load_or_empty(None, &ColumnMapping::default());
        assert!(ds.is_empty());
        assert!(matches!(err, Some(LoadError::NotConfigured)));
    }

    #[test]
    fn header_only_sheet_loads_zero_records() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "jgp.csv", format!("{HEADER_CSV}\n").as_bytes());
        let ds = load(&path, &ColumnMapping::default()).unwrap();
        assert!(ds.is_empty());
    }
}
