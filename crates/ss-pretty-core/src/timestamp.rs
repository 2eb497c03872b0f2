use chrono::{DateTime, Local, TimeZone};

/// Wall-clock time of day at millisecond precision, e.g. `14:03:07.512`.
pub fn format_wall_clock<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%H:%M:%S%.3f").to_string()
}

pub fn now() -> String {
    format_wall_clock(&Local::now())
}
