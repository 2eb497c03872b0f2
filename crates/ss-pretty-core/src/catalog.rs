use thiserror::Error;

/// Fields shown when the operator does not pick any.
pub const DEFAULT_FIELDS: &str = "timestamp,local,peer,mss,rcvmss,advmss,rto,rtt,cwnd,ssthresh,bytes_acked,unacked,retrans,send,pacing_rate,delivery_rate,busy,rcv_space,notsent";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub width: usize,
}

const fn field(name: &'static str, width: usize) -> FieldDescriptor {
    FieldDescriptor { name, width }
}

// Widths line up with typical `ss -tmi` values; local/peer fit an IPv4 endpoint.
const STANDARD_FIELDS: &[FieldDescriptor] = &[
    field("timestamp", 12),
    field("local", 21),
    field("peer", 21),
    field("skmem", 60),
    field("cong_alg", 8),
    field("ts", 2),
    field("sack", 4),
    field("ecn", 3),
    field("ecnseen", 7),
    field("fastopen", 8),
    field("wscale", 6),
    field("rto", 4),
    field("rtt", 15),
    field("ato", 4),
    field("mss", 4),
    field("pmtu", 4),
    field("rcvmss", 6),
    field("advmss", 6),
    field("cwnd", 6),
    field("ssthresh", 9),
    field("bytes_acked", 12),
    field("bytes_received", 14),
    field("segs_out", 8),
    field("segs_in", 8),
    field("data_segs_out", 13),
    field("data_segs_in", 13),
    field("send", 10),
    field("lastsnd", 8),
    field("lastrcv", 7),
    field("lastack", 7),
    field("pacing_rate", 11),
    field("rcv_rtt", 7),
    field("delivery_rate", 13),
    field("busy", 6),
    field("unacked", 7),
    field("retrans", 7),
    field("rcv_space", 9),
    field("rcv_ssthresh", 12),
    field("notsent", 8),
    field("minrtt", 6),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("'{name}' is not a valid field, use one of: {valid}")]
    UnknownField { name: String, valid: String },
    #[error("no fields selected for display")]
    Empty,
}

/// Read-only registry of displayable fields and their column widths.
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    fields: &'static [FieldDescriptor],
}

impl Default for FieldCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl FieldCatalog {
    pub fn standard() -> Self {
        Self {
            fields: STANDARD_FIELDS,
        }
    }

    pub fn width_of(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .find(|descriptor| descriptor.name == name)
            .map(|descriptor| descriptor.width)
    }

    pub fn is_valid(&self, name: &str) -> bool {
        self.width_of(name).is_some()
    }

    pub fn descriptors(&self) -> &[FieldDescriptor] {
        self.fields
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|descriptor| descriptor.name)
    }

    /// Checks every requested name; the first unknown one rejects the whole list.
    pub fn validate(&self, requested: &[String]) -> Result<(), CatalogError> {
        if requested.is_empty() {
            return Err(CatalogError::Empty);
        }
        match requested.iter().find(|name| !self.is_valid(name)) {
            Some(name) => Err(CatalogError::UnknownField {
                name: name.clone(),
                valid: self.names().collect::<Vec<_>>().join(", "),
            }),
            None => Ok(()),
        }
    }
}

pub fn parse_field_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fields_are_all_known() {
        let catalog = FieldCatalog::standard();
        let fields = parse_field_list(DEFAULT_FIELDS);
        assert_eq!(fields.len(), 19);
        assert!(catalog.validate(&fields).is_ok());
    }

    #[test]
    fn width_lookup_matches_table() {
        let catalog = FieldCatalog::standard();
        assert_eq!(catalog.width_of("skmem"), Some(60));
        assert_eq!(catalog.width_of("ts"), Some(2));
        assert_eq!(catalog.width_of("cong_alg"), Some(8));
        assert_eq!(catalog.width_of("nope"), None);
        assert!(!catalog.is_valid("Lastsend"));
    }

    #[test]
    fn one_unknown_name_rejects_the_list() {
        let catalog = FieldCatalog::standard();
        let fields = parse_field_list("timestamp,cwnd,bogus,rtt");
        let err = catalog.validate(&fields).expect_err("bogus field");
        match &err {
            CatalogError::UnknownField { name, valid } => {
                assert_eq!(name, "bogus");
                assert!(valid.starts_with("timestamp, local, peer"));
                assert!(valid.ends_with("minrtt"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with("'bogus' is not a valid field"));
    }

    #[test]
    fn empty_list_is_rejected() {
        let catalog = FieldCatalog::standard();
        assert_eq!(
            catalog.validate(&parse_field_list(" , ")),
            Err(CatalogError::Empty)
        );
    }

    #[test]
    fn field_list_trims_names() {
        assert_eq!(
            parse_field_list("timestamp, pacing_rate,,cwnd "),
            vec!["timestamp", "pacing_rate", "cwnd"]
        );
    }

    #[test]
    fn widths_stay_in_display_range() {
        let catalog = FieldCatalog::standard();
        assert!(catalog
            .descriptors()
            .iter()
            .all(|descriptor| (2..=60).contains(&descriptor.width)));
    }
}
