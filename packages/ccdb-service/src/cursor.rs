//! `search_after` cursor codec.
//!
//! A cursor is `<primary>_<tiebreak>`: the primary sort value (a relevance score or an epoch
//! millisecond timestamp) and the tiebreak document id in its original textual form.

use serde::{Serialize, Serializer, ser::SerializeSeq};
use serde_json::Value;

use ccdb_domain::SortMode;

const SEPARATOR: char = '_';

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortPrimary {
	Score(f64),
	/// Epoch milliseconds.
	Timestamp(i64),
}
impl SortPrimary {
	fn to_value(self) -> Value {
		match self {
			Self::Score(score) => Value::from(score),
			Self::Timestamp(millis) => Value::from(millis),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortCursor {
	pub primary: SortPrimary,
	/// Kept verbatim so the engine compares against the exact stored id.
	pub tiebreak: String,
}
impl SortCursor {
	/// Parses a raw cursor for the given sort mode. Malformed cursors yield `None`.
	pub fn decode(raw: &str, sort: SortMode) -> Option<Self> {
		let (primary, tiebreak) = raw.split_once(SEPARATOR)?;

		if tiebreak.contains(SEPARATOR)
			|| !tiebreak.parse::<f64>().is_ok_and(|tiebreak| tiebreak.is_finite())
		{
			return None;
		}

		let primary = if sort.is_relevance() {
			SortPrimary::Score(primary.parse::<f64>().ok().filter(|score| score.is_finite())?)
		} else {
			SortPrimary::Timestamp(primary.parse::<i64>().ok()?)
		};

		Some(Self { primary, tiebreak: tiebreak.to_string() })
	}

	pub fn encode(&self) -> String {
		let primary = match self.primary {
			SortPrimary::Score(score) => score.to_string(),
			SortPrimary::Timestamp(millis) => millis.to_string(),
		};

		format!("{primary}{SEPARATOR}{}", self.tiebreak)
	}

	/// Builds a cursor from a hit's engine sort values, `[primary, tiebreak]`.
	pub fn from_sort_values(values: &[Value], sort: SortMode) -> Option<Self> {
		let [primary, tiebreak] = values else {
			return None;
		};
		let primary = if sort.is_relevance() {
			SortPrimary::Score(primary.as_f64()?)
		} else {
			// Date sort values arrive as integers; tolerate whole floats.
			SortPrimary::Timestamp(
				primary.as_i64().or_else(|| primary.as_f64().map(|value| value as i64))?,
			)
		};
		let tiebreak = match tiebreak {
			Value::String(id) => id.clone(),
			Value::Number(id) => id.to_string(),
			_ => return None,
		};

		Some(Self { primary, tiebreak })
	}

	/// Engine `search_after` array for this cursor.
	pub fn to_search_after(&self) -> Value {
		Value::Array(vec![self.primary.to_value(), Value::String(self.tiebreak.clone())])
	}
}

impl Serialize for SortCursor {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(2))?;

		match self.primary {
			SortPrimary::Score(score) => seq.serialize_element(&score)?,
			SortPrimary::Timestamp(millis) => seq.serialize_element(&millis)?,
		}
		seq.serialize_element(&self.tiebreak)?;

		seq.end()
	}
}
