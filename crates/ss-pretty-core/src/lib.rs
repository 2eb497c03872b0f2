//! Parsing and column rendering for `ss -tmi` socket statistics.

pub mod catalog;
pub mod parser;
pub mod records;
pub mod render;
pub mod timestamp;

pub use catalog::{parse_field_list, CatalogError, FieldCatalog, FieldDescriptor, DEFAULT_FIELDS};
pub use parser::{FieldSet, ParseError, RecordParser, CONG_ALG_FIELD};
pub use records::{split_records, RawRecord};
pub use render::{json_row, OutputFormat, TableRenderer, LINE_END};
