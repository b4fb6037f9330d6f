use std::fmt;

use thiserror::Error;

use super::model::{Dataset, Record};

// ---------------------------------------------------------------------------
// SearchCriteria – one query, built fresh per search
// ---------------------------------------------------------------------------

/// Filter values for a single search. `county` is required; the others are
/// ignored when `None` or blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pub county: String,
    pub national_id: Option<String>,
    pub phone_number: Option<String>,
    pub name_substring: Option<String>,
}

/// `None` for blank input, trimmed text otherwise.
fn optional(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl SearchCriteria {
    pub fn new(county: impl Into<String>) -> Self {
        Self {
            county: county.into(),
            ..Self::default()
        }
    }

    /// Build criteria from raw form input, trimming every field.
    pub fn from_inputs(county: &str, national_id: &str, phone_number: &str, name: &str) -> Self {
        Self {
            county: county.trim().to_string(),
            national_id: optional(national_id),
            phone_number: optional(phone_number),
            name_substring: optional(name),
        }
    }

    pub fn with_national_id(mut self, id: impl Into<String>) -> Self {
        self.national_id = Some(id.into());
        self
    }

    pub fn with_phone_number(mut self, phone: impl Into<String>) -> Self {
        self.phone_number = Some(phone.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name_substring = Some(name.into());
        self
    }
}

impl fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "county={:?}", self.county)?;
        if let Some(id) = &self.national_id {
            write!(f, " id={id:?}")?;
        }
        if let Some(phone) = &self.phone_number {
            write!(f, " phone={phone:?}")?;
        }
        if let Some(name) = &self.name_substring {
            write!(f, " name~{name:?}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("a county must be selected before searching")]
    MissingRequiredFilter,
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// One narrowing step. Needles are prepared once per search.
#[derive(Debug)]
enum Predicate<'c> {
    /// Case-insensitive equality ignoring surrounding whitespace, needle
    /// already trimmed and lowercased.
    County(String),
    NationalId(&'c str),
    PhoneNumber(&'c str),
    /// Case-insensitive containment, needle already lowercased.
    NameContains(String),
}

impl Predicate<'_> {
    fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::County(needle) => record.county.trim().to_lowercase() == *needle,
            Predicate::NationalId(needle) => record.national_id == *needle,
            Predicate::PhoneNumber(needle) => record.phone_number == *needle,
            Predicate::NameContains(needle) => record.full_name.to_lowercase().contains(needle.as_str()),
        }
    }
}

/// Supplied, non-blank criterion value.
fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn predicates(criteria: &SearchCriteria) -> Result<Vec<Predicate<'_>>, QueryError> {
    let county = criteria.county.trim();
    if county.is_empty() {
        return Err(QueryError::MissingRequiredFilter);
    }

    let mut steps = vec![Predicate::County(county.to_lowercase())];
    if let Some(id) = supplied(&criteria.national_id) {
        steps.push(Predicate::NationalId(id));
    }
    if let Some(phone) = supplied(&criteria.phone_number) {
        steps.push(Predicate::PhoneNumber(phone));
    }
    if let Some(name) = supplied(&criteria.name_substring) {
        steps.push(Predicate::NameContains(name.to_lowercase()));
    }
    Ok(steps)
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Indices of records matching every supplied criterion, in dataset order.
///
/// Rejects a blank county before looking at any record.
pub fn search_indices(dataset: &Dataset, criteria: &SearchCriteria) -> Result<Vec<usize>, QueryError> {
    let steps = predicates(criteria)?;
    Ok(dataset
        .records()
        .iter()
        .enumerate()
        .filter(|(_, record)| steps.iter().all(|p| p.matches(record)))
        .map(|(i, _)| i)
        .collect())
}

/// Records matching every supplied criterion, in dataset order.
pub fn search<'d>(dataset: &'d Dataset, criteria: &SearchCriteria) -> Result<Vec<&'d Record>, QueryError> {
    let records = dataset.records();
    Ok(search_indices(dataset, criteria)?
        .into_iter()
        .map(|i| &records[i])
        .collect())
}
