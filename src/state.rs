use std::path::PathBuf;

use crate::data::model::{Dataset, Record};
use crate::data::query::{search_indices, QueryError, SearchCriteria};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Raw text of the four search inputs, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchInputs {
    pub county: String,
    pub national_id: String,
    pub phone_number: String,
    pub full_name: String,
}

impl SearchInputs {
    pub fn to_criteria(&self) -> SearchCriteria {
        SearchCriteria::from_inputs(
            &self.county,
            &self.national_id,
            &self.phone_number,
            &self.full_name,
        )
    }
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded once at startup; empty when loading failed.
    pub dataset: Dataset,

    /// Where the dataset came from, for the status bar.
    pub source: Option<PathBuf>,

    /// Why the dataset could not be loaded, if it could not.
    pub load_error: Option<String>,

    pub inputs: SearchInputs,

    /// Indices into `dataset` of the last search's matches.
    pub result_indices: Vec<usize>,

    /// Whether a search has completed since startup or the last clear.
    pub searched: bool,

    /// Warning shown under the search form.
    pub notice: Option<String>,
}

impl AppState {
    pub fn new(dataset: Dataset, source: Option<PathBuf>, load_error: Option<String>) -> Self {
        Self {
            dataset,
            source,
            load_error,
            inputs: SearchInputs::default(),
            result_indices: Vec::new(),
            searched: false,
            notice: None,
        }
    }

    /// Run the query for the current inputs.
    ///
    /// Previous results are cleared first. A blank county is caught here,
    /// before the query engine sees it.
    pub fn run_search(&mut self) {
        self.result_indices.clear();
        self.searched = false;
        self.notice = None;

        if self.inputs.county.trim().is_empty() {
            self.notice = Some("Please select a county".into());
            return;
        }

        let criteria = self.inputs.to_criteria();
        match search_indices(&self.dataset, &criteria) {
            Ok(indices) => {
                log::debug!("search {criteria}: {} match(es)", indices.len());
                self.result_indices = indices;
                self.searched = true;
            }
            Err(e @ QueryError::MissingRequiredFilter) => {
                self.notice = Some(e.to_string());
            }
        }
    }

    /// Reset the form and drop results.
    pub fn clear(&mut self) {
        self.inputs = SearchInputs::default();
        self.result_indices.clear();
        self.searched = false;
        self.notice = None;
    }

    /// Matching records of the last search, in dataset order.
    pub fn results(&self) -> impl Iterator<Item = &Record> + '_ {
        let records = self.dataset.records();
        self.result_indices.iter().filter_map(move |&i| records.get(i))
    }

    /// Non-blank vocabulary entries containing the typed county text,
    /// ignoring case. Empty input lists the whole vocabulary.
    pub fn county_suggestions(&self) -> Vec<&str> {
        let typed = self.inputs.county.trim().to_lowercase();
        self.dataset
            .counties()
            .iter()
            .map(String::as_str)
            .filter(|c| !c.trim().is_empty())
            .filter(|c| typed.is_empty() || c.to_lowercase().contains(&typed))
            .collect()
    }

    /// Heading above the results table.
    pub fn results_label(&self) -> String {
        if !self.searched {
            return "Search Results".to_string();
        }
        let count = self.result_indices.len();
        let noun = if count == 1 { "record" } else { "records" };
        format!("Search Results ({count} {noun} found)")
    }
}
