pub mod analysis;
pub mod bulk;

use chrono::{DateTime, Local, Utc};

/// `YYYY-MM-DD HH:MM:SS` in the server's local time zone, as printed in reports
/// and filenames. Records are stored in UTC.
pub fn local_timestamp(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
