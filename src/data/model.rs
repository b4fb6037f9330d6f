use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single spreadsheet cell as read from the source file
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring what spreadsheet readers produce.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Empty,
}

/// Floats at or above this magnitude are not printed as integers; `f64`
/// stops representing every integer exactly past 2^53.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

impl CellValue {
    /// Build a numeric cell, collapsing integral floats to `Integer`.
    ///
    /// Spreadsheets store every number as a double, so an ID typed as
    /// `12345678` arrives as `12345678.0`.
    pub fn from_number(v: f64) -> Self {
        if v.is_finite() && v.fract() == 0.0 && v.abs() < MAX_EXACT_INTEGER {
            CellValue::Integer(v as i64)
        } else {
            CellValue::Float(v)
        }
    }

    /// Canonical text form, used for storage of ID / phone fields and for
    /// display. Integral numbers never carry a trailing `.0`.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Text(s) => Cow::Borrowed(s.as_str()),
            CellValue::Integer(i) => Cow::Owned(i.to_string()),
            CellValue::Float(v) => match CellValue::from_number(*v) {
                CellValue::Integer(i) => Cow::Owned(i.to_string()),
                _ => Cow::Owned(format!("{v}")),
            },
            CellValue::Bool(b) => Cow::Borrowed(if *b { "TRUE" } else { "FALSE" }),
            CellValue::Empty => Cow::Borrowed(""),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

// ---------------------------------------------------------------------------
// Field – the eight record attributes
// ---------------------------------------------------------------------------

/// One attribute of a participant [`Record`]. Discriminants follow table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    FullName,
    NationalId,
    PhoneNumber,
    County,
    Gender,
    Age,
    IndustrySector,
    BusinessRegistered,
}

impl Field {
    /// All fields in table order.
    pub const ALL: [Field; 8] = [
        Field::FullName,
        Field::NationalId,
        Field::PhoneNumber,
        Field::County,
        Field::Gender,
        Field::Age,
        Field::IndustrySector,
        Field::BusinessRegistered,
    ];

    /// Short column heading for the results table.
    pub fn label(self) -> &'static str {
        match self {
            Field::FullName => "Full Name",
            Field::NationalId => "ID Number",
            Field::PhoneNumber => "Phone Number",
            Field::County => "County",
            Field::Gender => "Gender",
            Field::Age => "Age",
            Field::IndustrySector => "Industry",
            Field::BusinessRegistered => "Business Registered",
        }
    }

    /// Key used in the `[columns]` config table.
    pub fn key(self) -> &'static str {
        match self {
            Field::FullName => "full_name",
            Field::NationalId => "national_id",
            Field::PhoneNumber => "phone_number",
            Field::County => "county",
            Field::Gender => "gender",
            Field::Age => "age",
            Field::IndustrySector => "industry_sector",
            Field::BusinessRegistered => "business_registered",
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one participant row
// ---------------------------------------------------------------------------

/// A single participant (one row of the source sheet).
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub full_name: String,
    /// Always text; numeric cells are normalized by [`CellValue::to_text`].
    pub national_id: String,
    /// Same normalization as `national_id`.
    pub phone_number: String,
    pub county: String,
    pub gender: String,
    /// Passed through untouched.
    pub age: CellValue,
    pub industry_sector: String,
    pub business_registered: String,
}

impl Record {
    /// Text of one field, as shown in the results table.
    pub fn field_text(&self, field: Field) -> Cow<'_, str> {
        match field {
            Field::FullName => Cow::Borrowed(&self.full_name),
            Field::NationalId => Cow::Borrowed(&self.national_id),
            Field::PhoneNumber => Cow::Borrowed(&self.phone_number),
            Field::County => Cow::Borrowed(&self.county),
            Field::Gender => Cow::Borrowed(&self.gender),
            Field::Age => self.age.to_text(),
            Field::IndustrySector => Cow::Borrowed(&self.industry_sector),
            Field::BusinessRegistered => Cow::Borrowed(&self.business_registered),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// All loaded records plus the derived county vocabulary.
///
/// Built once by the loader and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    counties: Vec<String>,
}

impl Dataset {
    /// Build the county vocabulary from the loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let counties: BTreeSet<&str> = records.iter().map(|r| r.county.as_str()).collect();
        let counties = counties.into_iter().map(str::to_string).collect();
        Dataset { records, counties }
    }

    /// Records in source order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Distinct county values, sorted ascending, case as stored.
    pub fn counties(&self) -> &[String] {
        &self.counties
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn record(full_name: &str, national_id: &str, phone: &str, county: &str) -> Record {
    Record {
        full_name: full_name.to_string(),
        national_id: national_id.to_string(),
        phone_number: phone.to_string(),
        county: county.to_string(),
        gender: String::new(),
        age: CellValue::Empty,
        industry_sector: String::new(),
        business_registered: String::new(),
    }
}
