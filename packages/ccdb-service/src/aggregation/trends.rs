//! Trend aggregations: lens buckets over time.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use ccdb_domain::{FilterField, Lens, SearchRequest, TrendInterval, fields};

use crate::{
	Error, Result,
	aggregation::{self, self_excluding},
	filter,
};

/// Name of the innermost date histogram in every trend bucket.
pub const PERIOD_AGG: &str = "trend_period";
/// Corpus-wide histogram under all active filters.
pub const AREA_AGG: &str = "dateRangeArea";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Depths {
	lens: u32,
	sub_lens: u32,
}

pub fn compile(request: &SearchRequest, cfg: &ccdb_config::Trends) -> Result<Map<String, Value>> {
	filter::validate(request)?;

	let params = &request.trend;
	let interval = params.trend_interval.ok_or_else(|| Error::InvalidFilter {
		field: "trend_interval".to_string(),
		message: "trend_interval is required.".to_string(),
	})?;

	if params.lens == Lens::Overview && params.sub_lens.is_some() {
		return Err(Error::InvalidFilter {
			field: "sub_lens".to_string(),
			message: "the overview lens has no sub lens.".to_string(),
		});
	}

	let depths = Depths {
		lens: params.trend_depth.unwrap_or(cfg.default_trend_depth).min(cfg.max_depth),
		sub_lens: params.sub_lens_depth.unwrap_or(cfg.default_sub_lens_depth).min(cfg.max_depth),
	};
	let mut aggs = Map::new();
	let everything = filter::compile(request, &BTreeSet::new())?;

	aggs.insert(
		AREA_AGG.to_string(),
		serde_json::json!({
			"filter": everything.to_query(),
			"aggs": { AREA_AGG: histogram(interval) },
		}),
	);

	match params.lens {
		Lens::Overview =>
			for name in ["product", "issue", "company"] {
				if name == "company" && !request.has_filter(name) {
					continue;
				}

				let field = lens_field(name)?;

				aggs.insert(
					name.to_string(),
					self_excluding(request, name, field, lens_buckets(field, depths.lens, interval))?,
				);
			},
		lens => {
			let field = lens_field(lens.as_str())?;
			let mut buckets = match params.focus.as_deref() {
				Some(focus) => {
					let mut focused = aggregation::terms(field.es_field, 1);

					focused["terms"]["include"] = serde_json::json!([focus]);

					focused
				},
				None => aggregation::terms(field.es_field, depths.lens),
			};
			let mut nested = Map::new();

			nested.insert(PERIOD_AGG.to_string(), histogram(interval));

			if let Some(sub_lens) = params.sub_lens {
				let sub_field = lens_field(sub_lens.as_str())?;

				nested.insert(
					sub_lens.as_str().to_string(),
					lens_buckets(sub_field, depths.sub_lens, interval),
				);
			}

			buckets["aggs"] = Value::Object(nested);

			aggs.insert(
				lens.as_str().to_string(),
				self_excluding(request, lens.as_str(), field, buckets)?,
			);
		},
	}

	Ok(aggs)
}

fn histogram(interval: TrendInterval) -> Value {
	serde_json::json!({
		"date_histogram": {
			"field": fields::DATE_RECEIVED_FIELD,
			"calendar_interval": interval.as_str(),
			"min_doc_count": 0,
		}
	})
}

fn lens_buckets(field: &FilterField, depth: u32, interval: TrendInterval) -> Value {
	let mut buckets = aggregation::terms(field.es_field, depth);

	buckets["aggs"] = serde_json::json!({ PERIOD_AGG: histogram(interval) });

	buckets
}

fn lens_field(name: &str) -> Result<&'static FilterField> {
	fields::lookup(name).ok_or_else(|| Error::Internal {
		message: format!("lens {name} has no field table entry."),
	})
}

#[cfg(test)]
mod tests {
	use ccdb_domain::TrendParams;

	use super::*;

	fn cfg() -> ccdb_config::Trends {
		ccdb_config::Trends::default()
	}

	fn request(trend: TrendParams) -> SearchRequest {
		SearchRequest { trend, ..Default::default() }
	}

	#[test]
	fn interval_is_required() {
		let err = compile(&request(TrendParams::default()), &cfg()).expect_err("missing interval");

		assert!(matches!(err, Error::InvalidFilter { ref field, .. } if field == "trend_interval"));
	}

	#[test]
	fn overview_carries_area_and_top_charts() {
		let aggs = compile(
			&request(TrendParams {
				trend_interval: Some(TrendInterval::Month),
				..Default::default()
			}),
			&cfg(),
		)
		.expect("compile");

		assert_eq!(
			aggs[AREA_AGG]["aggs"][AREA_AGG]["date_histogram"]["calendar_interval"],
			"month"
		);
		assert_eq!(aggs["product"]["aggs"]["product"]["terms"]["size"], 5);
		assert!(aggs["issue"]["aggs"]["issue"]["aggs"][PERIOD_AGG].is_object());
		assert!(!aggs.contains_key("company"));
	}

	#[test]
	fn overview_rejects_sub_lens() {
		let err = compile(
			&request(TrendParams {
				sub_lens: Some(Lens::Issue),
				trend_interval: Some(TrendInterval::Year),
				..Default::default()
			}),
			&cfg(),
		)
		.expect_err("overview with sub lens");

		assert!(matches!(err, Error::InvalidFilter { ref field, .. } if field == "sub_lens"));
	}

	#[test]
	fn lens_nests_sub_lens_and_histograms() {
		let aggs = compile(
			&request(TrendParams {
				lens: Lens::Product,
				sub_lens: Some(Lens::Issue),
				trend_depth: Some(500),
				sub_lens_depth: Some(3),
				trend_interval: Some(TrendInterval::Week),
				..Default::default()
			}),
			&cfg(),
		)
		.expect("compile");
		let product = &aggs["product"]["aggs"]["product"];

		assert_eq!(product["terms"]["size"], 100);
		assert!(product["aggs"][PERIOD_AGG]["date_histogram"].is_object());
		assert_eq!(product["aggs"]["issue"]["terms"]["size"], 3);
		assert_eq!(
			product["aggs"]["issue"]["aggs"][PERIOD_AGG]["date_histogram"]["calendar_interval"],
			"week"
		);
	}

	#[test]
	fn focus_restricts_lens_to_one_bucket() {
		let aggs = compile(
			&request(TrendParams {
				lens: Lens::Company,
				focus: Some("Acme Bank".to_string()),
				trend_interval: Some(TrendInterval::Year),
				..Default::default()
			}),
			&cfg(),
		)
		.expect("compile");
		let company = &aggs["company"]["aggs"]["company"]["terms"];

		assert_eq!(company["include"], serde_json::json!(["Acme Bank"]));
		assert_eq!(company["size"], 1);
	}
}
