//! Output generation for the crawled vocabulary.
//!
//! # Submodules
//!
//! - [`vocabulary_csv`]: Sorts articles and writes their glossary rows as CSV
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── apod_tw_vocabulary_20240115.csv
//! ```

pub mod vocabulary_csv;
