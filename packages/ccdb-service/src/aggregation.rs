//! Facet aggregation compilation.
//!
//! Every facet is wrapped in a `filter` aggregation carrying all active filters except the
//! facet's own, so a facet's bucket counts ignore the caller's selection on that facet.

pub mod states;
pub mod trends;

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use ccdb_domain::{FilterField, SearchRequest, fields};

use crate::{Result, filter};

/// Compiles one self-excluding aggregation per facet, omitting fields named in `exclude`.
///
/// `company` is outside the default facet scope and only compiled while the request
/// filters on it.
pub fn compile(request: &SearchRequest, exclude: &BTreeSet<&str>) -> Result<Map<String, Value>> {
	filter::validate(request)?;

	let mut aggs = Map::new();

	for field in fields::FILTER_FIELDS {
		if exclude.contains(field.name) {
			continue;
		}
		if !field.default_facet && !request.has_filter(field.name) {
			continue;
		}

		aggs.insert(field.name.to_string(), facet(request, field)?);
	}

	Ok(aggs)
}

/// A self-excluding `filter` aggregation wrapping the field's bucket definition.
pub(crate) fn self_excluding(
	request: &SearchRequest,
	name: &str,
	field: &FilterField,
	inner: Value,
) -> Result<Value> {
	let exclude = BTreeSet::from([field.name]);
	let scope = filter::compile(request, &exclude)?;

	Ok(serde_json::json!({
		"filter": scope.to_query(),
		"aggs": { name: inner },
	}))
}

pub(crate) fn terms(es_field: &str, size: u32) -> Value {
	serde_json::json!({ "terms": { "field": es_field, "size": size } })
}

fn facet(request: &SearchRequest, field: &FilterField) -> Result<Value> {
	let mut buckets = terms(field.es_field, field.agg_size);

	if let (Some(child_name), Some(child_field)) = (field.child_name, field.child_es_field) {
		buckets["aggs"] = serde_json::json!({ child_name: terms(child_field, field.child_agg_size) });
	}

	self_excluding(request, field.name, field, buckets)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn facet_scope_excludes_its_own_filter() {
		let request = SearchRequest::default()
			.with_filter("state", "TX")
			.with_filter("product", "Mortgage");
		let aggs = compile(&request, &BTreeSet::new()).expect("compile");
		let state_scope = aggs["state"]["filter"].to_string();
		let product_scope = aggs["product"]["filter"].to_string();

		assert!(!state_scope.contains("\"state\""));
		assert!(state_scope.contains("product.raw"));
		assert!(product_scope.contains("\"state\""));
		assert!(!product_scope.contains("product.raw"));
	}

	#[test]
	fn hierarchical_facets_nest_child_buckets() {
		let aggs = compile(&SearchRequest::default(), &BTreeSet::new()).expect("compile");

		assert_eq!(aggs["issue"]["aggs"]["issue"]["terms"]["field"], "issue.raw");
		assert_eq!(
			aggs["issue"]["aggs"]["issue"]["aggs"]["sub_issue"]["terms"]["field"],
			"sub_issue.raw"
		);
		assert_eq!(aggs["issue"]["filter"], serde_json::json!({ "match_all": {} }));
	}

	#[test]
	fn company_is_reinstated_only_when_filtered() {
		let aggs = compile(&SearchRequest::default(), &BTreeSet::new()).expect("compile");

		assert!(!aggs.contains_key("company"));

		let request = SearchRequest::default().with_filter("company", "Acme Bank");
		let aggs = compile(&request, &BTreeSet::new()).expect("compile");

		assert_eq!(aggs["company"]["aggs"]["company"]["terms"]["size"], 10_000);
	}

	#[test]
	fn excluded_fields_are_omitted() {
		let aggs =
			compile(&SearchRequest::default(), &BTreeSet::from(["zip_code", "tags"])).expect("compile");

		assert!(!aggs.contains_key("zip_code"));
		assert!(!aggs.contains_key("tags"));
		assert!(aggs.contains_key("state"));
	}
}
