//! Timestamp helpers for engine values and response bodies.

use serde::Serializer;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Serializes an optional timestamp as RFC 3339, or `null`.
pub fn serialize_option<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	match value {
		Some(value) => {
			let formatted = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;

			serializer.serialize_str(&formatted)
		},
		None => serializer.serialize_none(),
	}
}

/// Converts an engine date value (epoch milliseconds, possibly as a float) to a timestamp.
pub fn from_epoch_millis(millis: f64) -> Option<OffsetDateTime> {
	if !millis.is_finite() {
		return None;
	}

	OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000).ok()
}
