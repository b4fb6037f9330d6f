use serde::Deserialize;

use super::error::LoadError;
use super::model::{CellValue, Field, Record};

// ---------------------------------------------------------------------------
// Column mapping: source header text → record field
// ---------------------------------------------------------------------------

/// Header text of each source column, keyed by record field.
///
/// Headers are matched exactly (case and wording), ignoring only surrounding
/// whitespace. Every key of the `[columns]` config table is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnMapping {
    pub full_name: String,
    pub national_id: String,
    pub phone_number: String,
    pub county: String,
    pub gender: String,
    pub age: String,
    pub industry_sector: String,
    pub business_registered: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            full_name: "Full Name".into(),
            national_id: "WHAT IS YOUR NATIONAL ID?".into(),
            phone_number: "Phone Number".into(),
            county: "County".into(),
            gender: "Gender".into(),
            age: "Age".into(),
            industry_sector: "WHAT IS THE MAIN INDUSTRY SECTOR IN WHICH YOU OPERATE IN?".into(),
            business_registered: "IS YOUR BUSINESS REGISTERED?".into(),
        }
    }
}

impl ColumnMapping {
    /// Source header configured for `field`.
    pub fn header(&self, field: Field) -> &str {
        match field {
            Field::FullName => &self.full_name,
            Field::NationalId => &self.national_id,
            Field::PhoneNumber => &self.phone_number,
            Field::County => &self.county,
            Field::Gender => &self.gender,
            Field::Age => &self.age,
            Field::IndustrySector => &self.industry_sector,
            Field::BusinessRegistered => &self.business_registered,
        }
    }

    /// Locate every mapped column in `headers`.
    ///
    /// Fails with all missing headers at once so a drifted sheet is reported
    /// in a single message.
    pub fn resolve(&self, headers: &[String]) -> Result<ColumnIndex, LoadError> {
        let mut positions = [0usize; 8];
        let mut missing = Vec::new();

        for (slot, field) in positions.iter_mut().zip(Field::ALL) {
            let wanted = self.header(field).trim();
            match headers.iter().position(|h| h.trim() == wanted) {
                Some(idx) => *slot = idx,
                None => missing.push(wanted.to_string()),
            }
        }

        if missing.is_empty() {
            Ok(ColumnIndex { positions })
        } else {
            Err(LoadError::MissingColumns(missing))
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnIndex: resolved positions for one sheet
// ---------------------------------------------------------------------------

/// Column positions of each [`Field`] within a particular sheet.
#[derive(Debug, Clone, Copy)]
pub struct ColumnIndex {
    /// Indexed in [`Field::ALL`] order.
    positions: [usize; 8],
}

impl ColumnIndex {
    fn cell<'a>(&self, row: &'a [CellValue], field: Field) -> &'a CellValue {
        row.get(self.positions[field as usize])
            .unwrap_or(&CellValue::Empty)
    }

    fn text(&self, row: &[CellValue], field: Field) -> String {
        self.cell(row, field).to_text().into_owned()
    }

    /// Map one sheet row onto a [`Record`]. Short rows read as empty cells.
    pub fn record(&self, row: &[CellValue]) -> Record {
        Record {
            full_name: self.text(row, Field::FullName),
            national_id: self.text(row, Field::NationalId),
            phone_number: self.text(row, Field::PhoneNumber),
            county: self.text(row, Field::County),
            gender: self.text(row, Field::Gender),
            age: self.cell(row, Field::Age).clone(),
            industry_sector: self.text(row, Field::IndustrySector),
            business_registered: self.text(row, Field::BusinessRegistered),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_headers() -> Vec<String> {
        let mapping = ColumnMapping::default();
        Field::ALL.iter().map(|f| mapping.header(*f).to_string()).collect()
    }

    #[test]
    fn resolves_reordered_columns() {
        let mut headers = default_headers();
        headers.reverse();
        headers.insert(0, "Timestamp".into());
        let index = ColumnMapping::default().resolve(&headers).unwrap();

        let mut row = vec![CellValue::Empty; headers.len()];
        let county_pos = headers.iter().position(|h| h == "County").unwrap();
        let id_pos = headers.iter().position(|h| h == "WHAT IS YOUR NATIONAL ID?").unwrap();
        row[county_pos] = CellValue::Text("Nairobi".into());
        row[id_pos] = CellValue::Float(12345678.0);

        let rec = index.record(&row);
        assert_eq!(rec.county, "Nairobi");
        assert_eq!(rec.national_id, "12345678");
    }

    #[test]
    fn reports_every_missing_column() {
        let headers = vec!["Full Name".to_string(), "county".to_string()];
        let err = ColumnMapping::default().resolve(&headers).unwrap_err();
        match err {
            LoadError::MissingColumns(missing) => {
                assert_eq!(missing.len(), 7);
                assert!(missing.contains(&"County".to_string()));
                assert!(!missing.contains(&"Full Name".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn header_whitespace_is_ignored() {
        let headers: Vec<String> = default_headers().into_iter().map(|h| format!(" {h}  ")).collect();
        assert!(ColumnMapping::default().resolve(&headers).is_ok());
    }

    #[test]
    fn short_rows_read_as_empty() {
        let index = ColumnMapping::default().resolve(&default_headers()).unwrap();
        let rec = index.record(&[CellValue::Text("Jane Doe".into())]);
        assert_eq!(rec.full_name, "Jane Doe");
        assert_eq!(rec.county, "");
        assert_eq!(rec.age, CellValue::Empty);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let mapping: ColumnMapping = toml::from_str(r#"county = "Region""#).unwrap();
        assert_eq!(mapping.county, "Region");
        assert_eq!(mapping.full_name, "Full Name");
    }
}
