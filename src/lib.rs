//! Participant lookup for the Jiinue Growth Programme dataset.
//!
//! [`data`] loads a spreadsheet into an immutable [`data::model::Dataset`]
//! and answers [`data::query::search`] calls; [`state`] holds the form
//! state the desktop UI renders; [`config`] resolves the data path and
//! column mapping at startup.

pub mod config;
pub mod data;
pub mod state;
