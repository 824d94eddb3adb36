pub mod content;
pub mod filter;
pub mod identity;
pub mod table;

pub use content::{DataSetContent, TableDataSetContent};
pub use filter::{AnyOfFilter, Field, SliceDefinition};
pub use identity::{DatasetIdentity, NamedDatasetIdentity, SliceDatasetIdentity, TimestampedDatasetIdentity};
pub use table::Table;
