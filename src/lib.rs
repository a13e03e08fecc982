//! sverka - Reconciliation of tabular financial exports read from Excel workbooks
//!
//! This crate compares two spreadsheet exports of the same financial relationship
//! (reconciliation acts, bank statements, invoices) and reports where they disagree.
//! Each sheet's column layout is detected automatically, rows are grouped by date,
//! and the amounts under every date are compared as multisets. Sheets without a
//! recognizable ledger layout are compared as product tables instead, with fuzzy
//! matching of product names.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use sverka::ReconcilerBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a reconciler with default settings
//!     let reconciler = ReconcilerBuilder::new().build()?;
//!
//!     // Open both exports
//!     let inputs = vec![File::open("ours.xlsx")?, File::open("theirs.xlsx")?];
//!
//!     // Compare and print the report
//!     let result = reconciler.reconcile(inputs)?;
//!     reconciler.render(&result, std::io::stdout())?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Working with in-memory sheets
//!
//! ```rust
//! use sverka::{Cell, ReconcilerBuilder, Sheet};
//!
//! # fn main() -> Result<(), sverka::SverkaError> {
//! let sheet = |rows: &[&[&str]]| {
//!     Sheet::from_rows(
//!         rows.iter()
//!             .map(|row| row.iter().map(|text| Cell::from(*text)).collect())
//!             .collect(),
//!     )
//! };
//!
//! let ours = sheet(&[&["Дата", "Дебет", "Кредит"], &["01.06.2024", "150", ""]]);
//! let theirs = sheet(&[&["Дата", "Дт", "Кт"], &["01.06.2024", "150,00", "0"]]);
//!
//! let reconciler = ReconcilerBuilder::new().build()?;
//! let result = reconciler.reconcile_sheets(&[ours, theirs])?;
//! assert!(result.is_identical());
//! # Ok(())
//! # }
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,no_run
//! use std::fs::File;
//! use sverka::{OutputFormat, ReconcilerBuilder, SheetSelector};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let reconciler = ReconcilerBuilder::new()
//!         .with_sheet_selector(SheetSelector::Name("Акт".to_string()))
//!         .compare_by_absolute_value(true)
//!         .with_min_key_overlap(0.5)
//!         .with_output_format(OutputFormat::Markdown)
//!         .build()?;
//!
//!     let inputs = vec![File::open("ours.xlsx")?, File::open("theirs.xlsx")?];
//!     let result = reconciler.reconcile(inputs)?;
//!     let report = reconciler.render_to_string(&result)?;
//!     println!("{}", report);
//!
//!     Ok(())
//! }
//! ```

mod api;
mod builder;
mod cell_text;
mod engine;
mod error;
mod layout;
mod layout_parser;
mod merge;
mod multiset;
mod normalize;
mod numeric;
mod output;
pub mod parser;
mod product;
mod result;
mod security;
mod types;

// 公開API
pub use api::{Layout, OutputFormat, SheetSelector};
pub use builder::{Reconciler, ReconcilerBuilder};
pub use cell_text::{cell_text, DATE_FORMAT};
pub use engine::{compare, compare_tables, key_overlap, CompareOptions};
pub use error::SverkaError;
pub use layout::classify;
pub use layout_parser::{classify_and_parse, parse_layout, ParsedSheet};
pub use merge::{compare_products, merge_product_tables, merge_products, MergeOptions};
pub use multiset::ValueMultiset;
pub use normalize::{edit_distance, normalize};
pub use numeric::{
    is_non_zero, is_numeric, is_sequence_number, is_zero, parse_decimal, NumberFormat,
};
pub use parser::{sniff_file_kind, FileKind};
pub use product::{parse_product_table, parse_product_table_with, ProductHeaders};
pub use result::{
    ComparisonDetail, ComparisonMode, ComparisonResult, FileSide, MismatchInfo,
    ProductDiscrepancy, SummaryLine,
};
pub use security::InputLimits;
pub use types::{Cell, CellKind, CellValue, KeyedTable, Row, Sheet};
