//! Corpus freshness and integrity metadata.

use serde::Serialize;
use serde_json::Value;
use time::{Duration, OffsetDateTime};

use ccdb_domain::fields;
use ccdb_engine::SearchEngine;

use crate::{Result, time_serde};

pub const DATA_ISSUE_FLAG: &str = "data_issue";

/// Boolean feature lookups.
pub trait FeatureFlags
where
	Self: Send + Sync,
{
	fn is_enabled(&self, flag: &str) -> bool;
}

/// Flags read from the `[flags]` config section.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigFlags {
	pub data_issue: bool,
}
impl ConfigFlags {
	pub fn new(cfg: &ccdb_config::Flags) -> Self {
		Self { data_issue: cfg.data_issue }
	}
}

impl FeatureFlags for ConfigFlags {
	fn is_enabled(&self, flag: &str) -> bool {
		match flag {
			DATA_ISSUE_FLAG => self.data_issue,
			_ => false,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusMeta {
	/// Newest `date_received` in the corpus.
	#[serde(rename = "last_updated", serialize_with = "time_serde::serialize_option")]
	pub max_data_date: Option<OffsetDateTime>,
	#[serde(rename = "last_indexed", serialize_with = "time_serde::serialize_option")]
	pub max_indexed_date: Option<OffsetDateTime>,
	pub total_record_count: u64,
	#[serde(rename = "is_data_stale")]
	pub is_stale: bool,
	pub has_data_issue: bool,
}

/// Raw figures gathered from the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorpusFigures {
	pub max_data_date: Option<OffsetDateTime>,
	pub max_indexed_date: Option<OffsetDateTime>,
	/// Hit total reported alongside the max-date aggregation.
	pub aggregated_total: u64,
	/// Total from the dedicated count request.
	pub counted_total: u64,
}

pub fn meta_query() -> Value {
	serde_json::json!({
		"size": 0,
		"track_total_hits": true,
		"query": { "match_all": {} },
		"aggs": {
			"max_date": { "max": { "field": fields::DATE_RECEIVED_FIELD } },
			"max_indexed_date": { "max": { "field": fields::DATE_INDEXED_FIELD } },
		}
	})
}

/// Issues the aggregation and count requests concurrently and evaluates the result.
pub async fn compute_meta(
	engine: &dyn SearchEngine,
	cfg: &ccdb_config::Meta,
	flags: &dyn FeatureFlags,
	now: OffsetDateTime,
) -> Result<CorpusMeta> {
	let aggregate_body = meta_query();
	let count_body = serde_json::json!({ "query": { "match_all": {} } });
	let (aggregated, counted) =
		tokio::join!(engine.search(&aggregate_body), engine.count(&count_body));
	let aggregated = aggregated?;
	let counted_total = counted?;
	let max_of = |name: &str| {
		aggregated
			.aggregations
			.as_ref()
			.and_then(|aggs| aggs.get(name))
			.and_then(|agg| agg.get("value"))
			.and_then(Value::as_f64)
			.and_then(time_serde::from_epoch_millis)
	};
	let figures = CorpusFigures {
		max_data_date: max_of("max_date"),
		max_indexed_date: max_of("max_indexed_date"),
		aggregated_total:
			aggregated.hits.total.as_ref().map(|total| total.value).unwrap_or_default(),
		counted_total,
	};

	Ok(evaluate(figures, cfg, flags.is_enabled(DATA_ISSUE_FLAG), now))
}

/// Applies the staleness window and the count mismatch threshold.
///
/// A corpus without any dated record is stale.
pub fn evaluate(
	figures: CorpusFigures,
	cfg: &ccdb_config::Meta,
	data_issue_flag: bool,
	now: OffsetDateTime,
) -> CorpusMeta {
	let is_stale = match figures.max_data_date {
		Some(newest) => now - newest > Duration::days(cfg.staleness_days),
		None => true,
	};
	let mismatch = figures.aggregated_total.abs_diff(figures.counted_total);

	CorpusMeta {
		max_data_date: figures.max_data_date,
		max_indexed_date: figures.max_indexed_date,
		total_record_count: figures.counted_total,
		is_stale,
		has_data_issue: data_issue_flag || mismatch > cfg.count_mismatch_threshold,
	}
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	fn cfg() -> ccdb_config::Meta {
		ccdb_config::Meta { staleness_days: 5, count_mismatch_threshold: 1_000 }
	}

	fn figures() -> CorpusFigures {
		CorpusFigures {
			max_data_date: Some(datetime!(2024-03-01 0:00 UTC)),
			max_indexed_date: Some(datetime!(2024-03-02 6:30 UTC)),
			aggregated_total: 4_000_000,
			counted_total: 4_000_500,
		}
	}

	#[test]
	fn fresh_corpus_without_issue() {
		let meta = evaluate(figures(), &cfg(), false, datetime!(2024-03-04 0:00 UTC));

		assert!(!meta.is_stale);
		assert!(!meta.has_data_issue);
		assert_eq!(meta.total_record_count, 4_000_500);
	}

	#[test]
	fn staleness_window_is_exclusive() {
		assert!(!evaluate(figures(), &cfg(), false, datetime!(2024-03-06 0:00 UTC)).is_stale);
		assert!(evaluate(figures(), &cfg(), false, datetime!(2024-03-06 0:01 UTC)).is_stale);
	}

	#[test]
	fn empty_corpus_is_stale() {
		let figures = CorpusFigures { max_data_date: None, ..figures() };

		assert!(evaluate(figures, &cfg(), false, datetime!(2024-03-01 0:00 UTC)).is_stale);
	}

	#[test]
	fn data_issue_from_flag_or_mismatch() {
		let now = datetime!(2024-03-02 0:00 UTC);

		assert!(evaluate(figures(), &cfg(), true, now).has_data_issue);

		let skewed = CorpusFigures { counted_total: 4_001_001, ..figures() };

		assert!(evaluate(skewed, &cfg(), false, now).has_data_issue);
	}

	#[test]
	fn serializes_public_names() {
		let meta = evaluate(figures(), &cfg(), false, datetime!(2024-03-02 0:00 UTC));
		let json = serde_json::to_value(&meta).expect("serialize");

		assert_eq!(json["last_updated"], "2024-03-01T00:00:00Z");
		assert_eq!(json["last_indexed"], "2024-03-02T06:30:00Z");
		assert_eq!(json["is_data_stale"], false);
		assert_eq!(json["has_data_issue"], false);
		assert!(ConfigFlags { data_issue: true }.is_enabled(DATA_ISSUE_FLAG));
	}
}
