use crate::catalog::FieldCatalog;
use crate::parser::FieldSet;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::str::FromStr;

/// Terminator for every emitted line. The terminal runs in raw mode, where a
/// bare `\n` does not return the carriage.
pub const LINE_END: &str = "\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{other}' (expected table or json)")),
        }
    }
}

/// Fixed-width column renderer. Header and rows share the catalog widths so
/// columns line up; values wider than their column push the rest of the row.
#[derive(Debug, Clone, Copy)]
pub struct TableRenderer<'a> {
    catalog: &'a FieldCatalog,
}

impl<'a> TableRenderer<'a> {
    pub fn new(catalog: &'a FieldCatalog) -> Self {
        Self { catalog }
    }

    pub fn header(&self, fields: &[String]) -> String {
        self.line(fields.iter().map(|name| (name.as_str(), name.as_str())))
    }

    pub fn row(&self, fields: &[String], values: &FieldSet) -> String {
        self.line(
            fields
                .iter()
                .map(|name| (name.as_str(), values.get(name).unwrap_or(""))),
        )
    }

    fn line<'v>(&self, cells: impl Iterator<Item = (&'v str, &'v str)>) -> String {
        let mut out = String::new();
        for (index, (name, text)) in cells.enumerate() {
            if index > 0 {
                out.push(' ');
            }
            let width = self.catalog.width_of(name).unwrap_or(0);
            pad_right(&mut out, text, width);
        }
        out
    }
}

fn pad_right(out: &mut String, value: &str, width: usize) {
    out.push_str(value);
    let visible = value.chars().count();
    if visible < width {
        out.extend(std::iter::repeat(' ').take(width - visible));
    }
}

/// Requested fields present in a record, serialized in requested order.
/// A name repeated in the request is written once.
struct JsonRow<'a> {
    fields: &'a [String],
    values: &'a FieldSet,
}

impl Serialize for JsonRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (index, name) in self.fields.iter().enumerate() {
            if self.fields[..index].contains(name) {
                continue;
            }
            if let Some(value) = self.values.get(name) {
                map.serialize_entry(name, value)?;
            }
        }
        map.end()
    }
}

/// One compact JSON object holding the requested fields present in `values`.
pub fn json_row(fields: &[String], values: &FieldSet) -> Result<String, serde_json::Error> {
    serde_json::to_string(&JsonRow { fields, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_field_list;

    fn sample_set() -> FieldSet {
        let mut set = FieldSet::default();
        set.insert("timestamp", "12:00:01.250");
        set.insert("cwnd", "10");
        set.insert("rtt", "0.5/0.25");
        set
    }

    #[test]
    fn header_pads_names_to_catalog_width() {
        let catalog = FieldCatalog::standard();
        let renderer = TableRenderer::new(&catalog);
        let header = renderer.header(&parse_field_list("cwnd,rto,timestamp"));
        assert_eq!(header, "cwnd   rto  timestamp   ");
    }

    #[test]
    fn row_columns_align_with_header() {
        let catalog = FieldCatalog::standard();
        let renderer = TableRenderer::new(&catalog);
        let fields = parse_field_list("timestamp,cwnd,rtt,ssthresh");
        let header = renderer.header(&fields);
        let row = renderer.row(&fields, &sample_set());
        assert_eq!(header.len(), row.len());
        assert_eq!(row, format!("{:12} {:6} {:15} {:9}", "12:00:01.250", "10", "0.5/0.25", ""));

        let mut offset = 0;
        for name in &fields {
            let width = catalog.width_of(name).expect("known");
            assert_eq!(&header[offset..offset + name.len()], name.as_str());
            offset += width + 1;
        }
    }

    #[test]
    fn missing_values_render_as_blank_columns() {
        let catalog = FieldCatalog::standard();
        let renderer = TableRenderer::new(&catalog);
        let row = renderer.row(&parse_field_list("notsent,busy"), &FieldSet::default());
        assert_eq!(row, format!("{} {}", " ".repeat(8), " ".repeat(6)));
    }

    #[test]
    fn wide_values_are_not_truncated() {
        let catalog = FieldCatalog::standard();
        let renderer = TableRenderer::new(&catalog);
        let mut set = FieldSet::default();
        set.insert("ts", "long-value");
        set.insert("sack", "x");
        let row = renderer.row(&parse_field_list("ts,sack"), &set);
        assert_eq!(row, "long-value x   ");
    }

    #[test]
    fn json_row_keeps_requested_order_and_skips_absent() {
        let fields = parse_field_list("timestamp,rtt,notsent,cwnd");
        let line = json_row(&fields, &sample_set()).expect("json");
        assert_eq!(
            line,
            r#"{"timestamp":"12:00:01.250","rtt":"0.5/0.25","cwnd":"10"}"#
        );
    }

    #[test]
    fn json_row_writes_repeated_field_once() {
        let fields = parse_field_list("cwnd,rtt,cwnd");
        let line = json_row(&fields, &sample_set()).expect("json");
        assert_eq!(line, r#"{"cwnd":"10","rtt":"0.5/0.25"}"#);
    }

    #[test]
    fn json_row_escapes_values() {
        let mut set = FieldSet::default();
        set.insert("local", "fe80::1%eth0:22");
        set.insert("bbr", "(bw:\"x\")");
        let line = json_row(&parse_field_list("bbr,local"), &set).expect("json");
        assert_eq!(line, r#"{"bbr":"(bw:\"x\")","local":"fe80::1%eth0:22"}"#);
    }

    #[test]
    fn output_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("table".parse::<OutputFormat>(), Ok(OutputFormat::Table));
        assert!("csv".parse::<OutputFormat>().is_err());
    }
}
