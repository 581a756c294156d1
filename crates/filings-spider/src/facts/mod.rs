pub mod dataset;
pub mod date;
pub mod extract;
pub mod profile;
pub mod scrape;
pub mod workbook;

pub use dataset::{EntityDataset, ExtractedRecord, Fact, Insertion, ShareCount};
pub use extract::{Extraction, Extractor, FieldLabels, Layout};
pub use profile::ExtractionProfile;
pub use scrape::scrape;
pub use workbook::{Cell, Sheet, Workbook};
