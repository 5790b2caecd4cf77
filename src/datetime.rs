//! Date/time helpers for chunk labels and timing reports.

use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};

/// Format of the label shared by the chunks of one file (`DDMMYYYYHHMMSSmmm`).
pub const LABEL_FORMAT: &str = "%d%m%Y%H%M%S%3f";

/// Label for a new upload, taken from the local clock.
///
/// Uniqueness is best-effort: two uploads started in the same millisecond
/// get the same label. Nothing downstream relies on labels being unique.
pub fn unique_datetime_label() -> String {
    datetime_label(&Local::now())
}

/// Format any datetime as a chunk label.
pub fn datetime_label<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format(LABEL_FORMAT).to_string()
}

/// Format an elapsed duration as `HH:MM:SS.mmm`.
///
/// Hours are not wrapped at 24.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_ms = elapsed.as_millis();
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;
    format!("{hours:02}:{mins:02}:{secs:02}.{ms:03}")
}
