use clap::Parser;
use ss_pretty_core::{parse_field_list, CatalogError, FieldCatalog, OutputFormat, DEFAULT_FIELDS};
use std::{path::PathBuf, time::Duration};
use thiserror::Error;

const AFTER_HELP: &str = "\
While running, press:
    h to repeat the header line
    v to toggle verbose
    q to quit

Example, showing just data rates:
    ss-pretty -f 'src 203.0.113.254:80' -u 0.5 -d 'timestamp,pacing_rate'";

#[derive(Parser, Debug, Clone)]
#[command(name = "ss-pretty")]
#[command(about = "Just like running 'ss -tmi', but with a columnar format")]
#[command(after_help = AFTER_HELP)]
pub struct Args {
    /// Comma-separated list of fields to display (see ss output or man)
    #[arg(short = 'd', long = "fields", default_value = DEFAULT_FIELDS)]
    pub fields: String,
    /// Filter expression passed through to ss
    #[arg(short = 'f', long = "filter", default_value = "")]
    pub filter: String,
    /// Seconds between polls
    #[arg(short = 'u', long = "interval", default_value_t = 1.0)]
    pub interval: f64,
    /// Seconds to run for (default: forever)
    #[arg(short = 't', long = "duration")]
    pub duration: Option<f64>,
    /// Echo the raw ss lines above each row
    #[arg(short = 'v', long = "verbose", default_value_t = false)]
    pub verbose: bool,
    #[arg(long, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
    #[arg(long = "ss-path", env = "SS_PRETTY_SS", default_value = "ss")]
    pub ss_path: String,
    #[arg(long = "ss-flags", default_value = "-tmi")]
    pub ss_flags: String,
    /// Print the known fields with their column widths and exit
    #[arg(long = "list-fields", default_value_t = false)]
    pub list_fields: bool,
    #[arg(long = "log-file", env = "SS_PRETTY_LOG_FILE")]
    pub log_file: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("interval must be a positive number of seconds, got {0}")]
    InvalidInterval(f64),
    #[error("duration must be a non-negative number of seconds, got {0}")]
    InvalidDuration(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub fields: Vec<String>,
    pub filter: String,
    pub interval: Duration,
    pub duration: Option<Duration>,
    pub verbose: bool,
    pub format: OutputFormat,
    pub ss_path: String,
    pub ss_flags: String,
}

impl SessionConfig {
    /// Validates everything up front; nothing is polled with a bad config.
    pub fn from_args(args: &Args, catalog: &FieldCatalog) -> Result<Self, ConfigError> {
        let fields = parse_field_list(&args.fields);
        catalog.validate(&fields)?;
        let interval = seconds(args.interval)
            .filter(|interval| !interval.is_zero())
            .ok_or(ConfigError::InvalidInterval(args.interval))?;
        let duration = match args.duration {
            Some(value) => Some(seconds(value).ok_or(ConfigError::InvalidDuration(value))?),
            None => None,
        };
        Ok(Self {
            fields,
            filter: args.filter.clone(),
            interval,
            duration,
            verbose: args.verbose,
            format: args.format,
            ss_path: args.ss_path.clone(),
            ss_flags: args.ss_flags.clone(),
        })
    }
}

fn seconds(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok()
}

pub fn format_catalog(catalog: &FieldCatalog) -> String {
    let mut out = String::new();
    for descriptor in catalog.descriptors() {
        out.push_str(&format!("{:<16}{}\n", descriptor.name, descriptor.width));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["ss-pretty"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).expect("parse args")
    }

    #[test]
    fn defaults_match_historic_tool() {
        let config =
            SessionConfig::from_args(&parse(&[]), &FieldCatalog::standard()).expect("config");
        assert_eq!(config.fields.len(), 19);
        assert_eq!(config.fields[0], "timestamp");
        assert_eq!(config.filter, "");
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.duration, None);
        assert!(!config.verbose);
        assert_eq!(config.format, OutputFormat::Table);
        assert_eq!(config.ss_flags, "-tmi");
    }

    #[test]
    fn short_flags_are_accepted() {
        let args = parse(&[
            "-d",
            "timestamp,pacing_rate",
            "-f",
            "src 203.0.113.254:80",
            "-u",
            "0.5",
            "-t",
            "10",
            "-v",
        ]);
        let config = SessionConfig::from_args(&args, &FieldCatalog::standard()).expect("config");
        assert_eq!(config.fields, vec!["timestamp", "pacing_rate"]);
        assert_eq!(config.filter, "src 203.0.113.254:80");
        assert_eq!(config.interval, Duration::from_millis(500));
        assert_eq!(config.duration, Some(Duration::from_secs(10)));
        assert!(config.verbose);
    }

    #[test]
    fn unknown_field_fails_validation() {
        let args = parse(&["-d", "timestamp,windowsize"]);
        let err = SessionConfig::from_args(&args, &FieldCatalog::standard()).expect_err("bad field");
        assert!(matches!(
            err,
            ConfigError::Catalog(CatalogError::UnknownField { ref name, .. }) if name == "windowsize"
        ));
    }

    #[test]
    fn non_positive_interval_is_rejected() {
        for value in ["--interval=0", "--interval=-1", "--interval=NaN"] {
            let args = parse(&[value]);
            let err =
                SessionConfig::from_args(&args, &FieldCatalog::standard()).expect_err("interval");
            assert!(matches!(err, ConfigError::InvalidInterval(_)));
        }
    }

    #[test]
    fn negative_duration_is_rejected() {
        let args = parse(&["--duration=-3"]);
        let err = SessionConfig::from_args(&args, &FieldCatalog::standard()).expect_err("duration");
        assert!(matches!(err, ConfigError::InvalidDuration(_)));
    }

    #[test]
    fn json_format_flag() {
        let config = SessionConfig::from_args(&parse(&["--format", "json"]), &FieldCatalog::standard())
            .expect("config");
        assert_eq!(config.format, OutputFormat::Json);
    }

    #[test]
    fn catalog_listing_has_one_line_per_field() {
        let catalog = FieldCatalog::standard();
        let listing = format_catalog(&catalog);
        assert_eq!(listing.lines().count(), catalog.descriptors().len());
        assert!(listing.starts_with("timestamp       12\n"));
    }
}
