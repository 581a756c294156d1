pub mod convert;
pub mod fetch;
pub mod listings;
pub mod records;

pub use convert::Converter;
pub use records::{spreadsheet_name, FilingRecord};
