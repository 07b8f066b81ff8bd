use chrono::{Local, NaiveDateTime};

/// Storage format for show start times. Lexical order equals
/// chronological order, so upcoming/past is a plain string comparison.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ACCEPTED_FORMATS: &[&str] = &[
    TIMESTAMP_FORMAT,
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a submitted start time and rewrites it in [`TIMESTAMP_FORMAT`].
pub fn normalize_start_time(input: &str) -> Option<String> {
    let input = input.trim();
    ACCEPTED_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
}

pub fn is_upcoming(start_time: &str, now: &str) -> bool {
    start_time > now
}

pub trait StartsAt {
    fn start_time(&self) -> &str;
}

/// Splits shows into `(past, upcoming)` relative to `now`.
pub fn partition_by_start<T: StartsAt>(shows: Vec<T>, now: &str) -> (Vec<T>, Vec<T>) {
    let (upcoming, past) = shows
        .into_iter()
        .partition(|s| is_upcoming(s.start_time(), now));
    (past, upcoming)
}
