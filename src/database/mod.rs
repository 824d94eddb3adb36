pub mod accessor;
pub mod hub;
pub mod manifest;
pub mod workbook;

pub use accessor::{AccessorAction, DataAccessor};
pub use hub::{DataHub, DataHubHandle, SingleRootDataHub};
pub use manifest::{DatabaseManifest, StaticDatabaseManifest};
pub use workbook::{Workbook, DEFAULT_SHEET};
