use crate::records::RawRecord;
use regex::Regex;
use std::collections::BTreeMap;
use thiserror::Error;

pub const CONG_ALG_FIELD: &str = "cong_alg";
pub const TIMESTAMP_FIELD: &str = "timestamp";
pub const LOCAL_FIELD: &str = "local";
pub const PEER_FIELD: &str = "peer";

const ADDRESS_PAIR_PATTERN: &str =
    r"([\w.:\[\]%*-]+:[\w*]+)\s+([\w.:\[\]%*-]+:[\w*]+)";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no local/peer address pair in header line: {line:?}")]
    AddressPair { line: String },
    #[error("field '{field}' has no value token")]
    MissingValue { field: String },
}

/// Field name to value for a single record. Rebuilt for every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    values: BTreeMap<String, String>,
}

impl FieldSet {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

enum Token<'a> {
    KeyValue(&'a str, &'a str),
    /// `send`, `pacing_rate`, `delivery_rate`: the value is the next token.
    Paired(&'a str),
    Bare(&'a str),
}

fn classify(token: &str) -> Token<'_> {
    if let Some((key, value)) = token.split_once(':') {
        Token::KeyValue(key, value)
    } else if token.contains("rate") || token == "send" {
        Token::Paired(token)
    } else {
        Token::Bare(token)
    }
}

/// Rule-based tokenizer for `ss -i` records.
#[derive(Debug, Clone)]
pub struct RecordParser {
    address_pair: Regex,
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordParser {
    pub fn new() -> Self {
        Self {
            address_pair: Regex::new(ADDRESS_PAIR_PATTERN).expect("valid regex"),
        }
    }

    pub fn parse(&self, record: &RawRecord<'_>, timestamp: &str) -> Result<FieldSet, ParseError> {
        let (local, peer) = self.addresses(record.header)?;
        let mut fields = FieldSet::default();
        fields.insert(TIMESTAMP_FIELD, timestamp);
        fields.insert(LOCAL_FIELD, local);
        fields.insert(PEER_FIELD, peer);
        parse_detail(record.detail, &mut fields)?;
        Ok(fields)
    }

    pub fn addresses<'a>(&self, header: &'a str) -> Result<(&'a str, &'a str), ParseError> {
        self.address_pair
            .captures(header)
            .and_then(|captures| Some((captures.get(1)?.as_str(), captures.get(2)?.as_str())))
            .ok_or_else(|| ParseError::AddressPair {
                line: header.to_string(),
            })
    }
}

/// Applies the detail-line rules in order. A paired field consumes its value
/// token, which is never classified on its own.
pub fn parse_detail(detail: &str, fields: &mut FieldSet) -> Result<(), ParseError> {
    let tokens: Vec<&str> = detail.split_whitespace().collect();
    let mut index = 0;
    while index < tokens.len() {
        match classify(tokens[index]) {
            Token::KeyValue(key, value) => fields.insert(key, value),
            Token::Paired(name) => {
                let value = tokens
                    .get(index + 1)
                    .ok_or_else(|| ParseError::MissingValue {
                        field: name.to_string(),
                    })?;
                fields.insert(name, *value);
                index += 1;
            }
            Token::Bare(name) if index == 1 => fields.insert(CONG_ALG_FIELD, name),
            Token::Bare(_) => {}
        }
        index += 1;
    }

    // Without the skmem block ss leads the line with the algorithm name.
    if !fields.contains(CONG_ALG_FIELD) && tokens.len() >= 2 {
        if let (Token::Bare(name), Token::KeyValue(..)) = (classify(tokens[0]), classify(tokens[1])) {
            fields.insert(CONG_ALG_FIELD, name);
        }
    }
    Ok(())
}
