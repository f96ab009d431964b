//! Aggregations behind the per-state map view.

use serde_json::{Map, Value};

use ccdb_domain::{FilterField, SearchRequest, fields};

use crate::{
	Error, Result,
	aggregation::{self, self_excluding},
	filter,
};

/// Buckets per top-N chart.
pub const TOP_N: u32 = 5;
/// Leading issue and product shown for each state.
pub const PER_STATE_TOP: u32 = 1;

/// Builds the `state`, `issue` and `product` aggregations, each excluding its own filter.
pub fn compile(request: &SearchRequest) -> Result<Map<String, Value>> {
	filter::validate(request)?;

	let state = field("state")?;
	let issue = field("issue")?;
	let product = field("product")?;
	let mut per_state = aggregation::terms(state.es_field, state.agg_size);

	per_state["aggs"] = serde_json::json!({
		"issue": aggregation::terms(issue.es_field, PER_STATE_TOP),
		"product": aggregation::terms(product.es_field, PER_STATE_TOP),
	});

	let mut aggs = Map::new();

	aggs.insert("state".to_string(), self_excluding(request, "state", state, per_state)?);

	for top in [issue, product] {
		let buckets = aggregation::terms(top.es_field, TOP_N);

		aggs.insert(top.name.to_string(), self_excluding(request, top.name, top, buckets)?);
	}

	Ok(aggs)
}

fn field(name: &str) -> Result<&'static FilterField> {
	fields::lookup(name).ok_or_else(|| Error::Internal {
		message: format!("field table has no {name} entry."),
	})
}
