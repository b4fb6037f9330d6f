//! Minimal reader for the first worksheet of an Office Open XML workbook.
//!
//! An `.xlsx` file is a zip archive of XML parts. Only the parts needed to
//! recover cell values are read: `xl/workbook.xml` and its relationships (to
//! find the first sheet), `xl/sharedStrings.xml`, and the worksheet itself.

use std::io::{Read, Seek};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

use super::model::CellValue;

/// Maximum decompressed bytes read from a single zip entry.
const MAX_XML_ENTRY_BYTES: u64 = 64 * 1024 * 1024;

/// Highest column index Excel allows (`XFD`).
const MAX_COLUMN: usize = 16_383;

#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("not a valid xlsx archive: {0}")]
    Zip(#[from] ZipError),
    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("workbook contains no worksheets")]
    NoWorksheet,
    #[error("part {0} exceeds the size limit")]
    TooLarge(String),
}

/// Read every row of the workbook's first sheet. Rows keep their sparse
/// layout: a cell's position comes from its `r` reference, gaps are
/// [`CellValue::Empty`].
pub fn read_first_sheet<R: Read + Seek>(reader: R) -> Result<Vec<Vec<CellValue>>, XlsxError> {
    let mut archive = ZipArchive::new(reader)?;

    let shared_strings = match read_part(&mut archive, "xl/sharedStrings.xml")? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let sheet_path = first_sheet_path(&mut archive)?;
    let sheet_xml = read_part(&mut archive, &sheet_path)?.ok_or(XlsxError::NoWorksheet)?;
    parse_sheet(&sheet_xml, &shared_strings)
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>, XlsxError> {
    let entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut out = Vec::new();
    entry.take(MAX_XML_ENTRY_BYTES + 1).read_to_end(&mut out)?;
    if out.len() as u64 > MAX_XML_ENTRY_BYTES {
        return Err(XlsxError::TooLarge(name.to_string()));
    }
    Ok(Some(out))
}

// ---------------------------------------------------------------------------
// Locating the first sheet
// ---------------------------------------------------------------------------

/// Path of the first sheet in workbook order, falling back to the
/// lowest-numbered `xl/worksheets/sheetN.xml` when the workbook part or its
/// relationships are missing.
fn first_sheet_path<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String, XlsxError> {
    if let Some(path) = workbook_first_sheet(archive)? {
        if archive.file_names().any(|n| n == path) {
            return Ok(path);
        }
        log::debug!("workbook points at missing part {path}, scanning worksheets");
    }

    let mut sheets: Vec<(u32, String)> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .map(|n| {
            let number = n
                .trim_start_matches("xl/worksheets/sheet")
                .trim_end_matches(".xml")
                .parse::<u32>()
                .unwrap_or(u32::MAX);
            (number, n.to_string())
        })
        .collect();
    sheets.sort();
    sheets
        .into_iter()
        .next()
        .map(|(_, name)| name)
        .ok_or(XlsxError::NoWorksheet)
}

fn workbook_first_sheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<Option<String>, XlsxError> {
    let Some(workbook) = read_part(archive, "xl/workbook.xml")? else {
        return Ok(None);
    };
    let Some(rel_id) = first_element_attr(&workbook, b"sheet", b"id")? else {
        return Ok(None);
    };
    let Some(rels) = read_part(archive, "xl/_rels/workbook.xml.rels")? else {
        return Ok(None);
    };

    let mut reader = Reader::from_reader(rels.as_slice());
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if attr(&e, b"Id").as_deref() == Some(rel_id.as_str()) {
                    return Ok(attr(&e, b"Target").map(|t| normalize_target(&t)));
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// Relationship targets are relative to `xl/` unless absolute.
fn normalize_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    }
}

fn first_element_attr(xml: &[u8], element: &[u8], key: &[u8]) -> Result<Option<String>, XlsxError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == element => {
                return Ok(attr(&e, key));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// Value of the attribute whose local name is `key` (`r:id` matches `id`).
fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

// ---------------------------------------------------------------------------
// Shared strings
// ---------------------------------------------------------------------------

fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>, XlsxError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_item = false;
    let mut in_text = false;
    // Phonetic runs are annotations, not part of the string.
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => {
                    in_item = true;
                    current.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" => in_text = in_item && !in_phonetic,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(te) if in_text => current.push_str(&te.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(std::mem::take(&mut current));
                    in_item = false;
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

// ---------------------------------------------------------------------------
// Worksheet cells
// ---------------------------------------------------------------------------

/// The `t` attribute of a `<c>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Number,
    SharedString,
    InlineString,
    FormulaString,
    Boolean,
    Error,
    Date,
}

impl CellKind {
    fn from_attr(t: &str) -> Self {
        match t {
            "s" => CellKind::SharedString,
            "inlineStr" => CellKind::InlineString,
            "str" => CellKind::FormulaString,
            "b" => CellKind::Boolean,
            "e" => CellKind::Error,
            "d" => CellKind::Date,
            _ => CellKind::Number,
        }
    }
}

struct PendingCell {
    column: usize,
    kind: CellKind,
    raw: String,
}

impl PendingCell {
    fn into_value(self, shared_strings: &[String]) -> CellValue {
        let trimmed = self.raw.trim();
        match self.kind {
            CellKind::SharedString => trimmed
                .parse::<usize>()
                .ok()
                .and_then(|i| shared_strings.get(i))
                .map(|s| CellValue::Text(s.clone()))
                .unwrap_or(CellValue::Empty),
            CellKind::InlineString | CellKind::FormulaString | CellKind::Date => {
                CellValue::Text(self.raw)
            }
            CellKind::Boolean => CellValue::Bool(trimmed == "1"),
            CellKind::Error => CellValue::Empty,
            CellKind::Number if trimmed.is_empty() => CellValue::Empty,
            CellKind::Number => match trimmed.parse::<f64>() {
                Ok(v) => CellValue::from_number(v),
                Err(_) => CellValue::Text(self.raw),
            },
        }
    }
}

/// Zero-based column of a cell reference such as `AB12`.
fn column_index(reference: &str) -> Option<usize> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .map(|b| b.to_ascii_uppercase())
        .collect();
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let one_based = letters
        .iter()
        .fold(0usize, |acc, b| acc * 26 + usize::from(b - b'A' + 1));
    let column = one_based - 1;
    (column <= MAX_COLUMN).then_some(column)
}

fn start_cell(e: &BytesStart<'_>, next_column: usize) -> PendingCell {
    let column = attr(e, b"r")
        .and_then(|r| column_index(&r))
        .unwrap_or(next_column);
    let kind = attr(e, b"t")
        .map(|t| CellKind::from_attr(&t))
        .unwrap_or(CellKind::Number);
    PendingCell {
        column,
        kind,
        raw: String::new(),
    }
}

fn place(row: &mut Vec<CellValue>, column: usize, value: CellValue) {
    if column >= row.len() {
        row.resize(column + 1, CellValue::Empty);
    }
    row[column] = value;
}

fn parse_sheet(xml: &[u8], shared_strings: &[String]) -> Result<Vec<Vec<CellValue>>, XlsxError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut rows = Vec::new();
    let mut row: Vec<CellValue> = Vec::new();
    let mut cell: Option<PendingCell> = None;
    let mut next_column = 0usize;
    let mut in_value = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    row.clear();
                    next_column = 0;
                }
                b"c" => cell = Some(start_cell(&e, next_column)),
                b"v" | b"t" => in_value = cell.is_some(),
                _ => {}
            },
            // `<c r="B2" s="1"/>`: styled but empty.
            Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                next_column = start_cell(&e, next_column).column + 1;
            }
            Event::Text(te) if in_value => {
                if let Some(pending) = cell.as_mut() {
                    pending.raw.push_str(&te.unescape()?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let Some(pending) = cell.take() {
                        next_column = pending.column + 1;
                        let column = pending.column;
                        place(&mut row, column, pending.into_value(shared_strings));
                    }
                }
                b"row" => rows.push(std::mem::take(&mut row)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::fixtures::{self, Cell};
    use super::*;

    #[test]
    fn reads_shared_inline_and_numeric_cells() {
        let bytes = fixtures::workbook(&[
            vec![Cell::Shared("Full Name"), Cell::Shared("ID")],
            vec![Cell::Inline("Jane &amp; Co"), Cell::Number("12345678")],
            vec![Cell::Shared("John"), Cell::Number("2.5E+3")],
        ]);
        let rows = read_first_sheet(Cursor::new(bytes)).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], CellValue::Text("Full Name".into()));
        assert_eq!(rows[1][0], CellValue::Text("Jane & Co".into()));
        assert_eq!(rows[1][1], CellValue::Integer(12345678));
        assert_eq!(rows[2][1], CellValue::Integer(2500));
    }

    #[test]
    fn first_sheet_follows_workbook_order() {
        let (first, sst) = fixtures::sheet_xml(&[vec![Cell::Inline("first")]]);
        let (second, _) = fixtures::sheet_xml(&[vec![Cell::Inline("second")]]);
        let bytes = fixtures::archive(&[
            ("xl/workbook.xml", fixtures::WORKBOOK),
            ("xl/_rels/workbook.xml.rels", fixtures::RELS),
            ("xl/sharedStrings.xml", &sst),
            ("xl/worksheets/sheet1.xml", &second),
            ("xl/worksheets/sheet2.xml", &first),
        ]);
        let rows = read_first_sheet(Cursor::new(bytes)).unwrap();
        assert_eq!(rows[0][0], CellValue::Text("first".into()));
    }

    #[test]
    fn falls_back_to_lowest_numbered_sheet() {
        let (sheet, _) = fixtures::sheet_xml(&[vec![Cell::Number("7")]]);
        let bytes = fixtures::archive(&[
            ("xl/worksheets/sheet3.xml", "<worksheet/>"),
            ("xl/worksheets/sheet1.xml", &sheet),
        ]);
        let rows = read_first_sheet(Cursor::new(bytes)).unwrap();
        assert_eq!(rows, vec![vec![CellValue::Integer(7)]]);
    }

    #[test]
    fn sparse_cells_keep_their_column() {
        let sheet = r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="inlineStr"><is><t>a</t></is></c><c r="D1" t="b"><v>1</v></c></row>
            <row r="2"><c r="B2" s="3"/><c t="e"><v>#N/A</v></c><c><v>0712</v></c></row>
        </sheetData></worksheet>"#;
        let rows = parse_sheet(sheet.as_bytes(), &[]).unwrap();
        assert_eq!(
            rows[0],
            vec![
                CellValue::Text("a".into()),
                CellValue::Empty,
                CellValue::Empty,
                CellValue::Bool(true),
            ]
        );
        assert_eq!(rows[1], vec![CellValue::Empty, CellValue::Empty, CellValue::Empty, CellValue::Integer(712)]);
    }

    #[test]
    fn rich_text_runs_are_concatenated() {
        let sst = r#"<sst><si><r><t>Jane </t></r><r><t>Doe</t></r><rPh><t>ignored</t></rPh></si><si/></sst>"#;
        let strings = parse_shared_strings(sst.as_bytes()).unwrap();
        assert_eq!(strings, vec!["Jane Doe".to_string(), String::new()]);
    }

    #[test]
    fn column_references() {
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("Z9"), Some(25));
        assert_eq!(column_index("AA10"), Some(26));
        assert_eq!(column_index("ab3"), Some(27));
        assert_eq!(column_index("12"), None);
        assert_eq!(column_index("ZZZZ1"), None);
    }

    #[test]
    fn rejects_non_zip_input() {
        let err = read_first_sheet(Cursor::new(b"not a zip".to_vec())).unwrap_err();
        assert!(matches!(err, XlsxError::Zip(_)));
    }

    #[test]
    fn archive_without_sheets_is_an_error() {
        let bytes = fixtures::archive(&[("docProps/app.xml", "<Properties/>")]);
        let err = read_first_sheet(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, XlsxError::NoWorksheet));
    }
}
