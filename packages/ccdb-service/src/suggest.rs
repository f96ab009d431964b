//! Typeahead over complaint text and filter values.

use std::collections::BTreeSet;

use serde_json::Value;

use ccdb_domain::{SearchRequest, SuggestMode, fields};

use crate::{
	CcdbService, Error, Result,
	aggregation,
	clause::{BoolClauses, QueryClause},
	filter,
};

pub const MAX_SUGGESTIONS: u32 = 10;

const SUGGEST_NAME: &str = "sgg";

impl CcdbService {
	/// Completion suggestions on the typeahead field, deduplicated by the engine.
	pub async fn suggest(&self, text: &str, size: u32) -> Result<Vec<String>> {
		let text = text.trim();

		if text.is_empty() {
			return Ok(Vec::new());
		}

		let body = serde_json::json!({
			"_source": false,
			"suggest": {
				SUGGEST_NAME: {
					"text": text,
					"completion": {
						"field": fields::TYPEAHEAD_FIELD,
						"skip_duplicates": true,
						"size": size.clamp(1, MAX_SUGGESTIONS),
					}
				}
			}
		});
		let response = self.engine.search(&body).await?;
		let options = response
			.suggest
			.as_ref()
			.and_then(|suggest| suggest.get(SUGGEST_NAME))
			.and_then(Value::as_array)
			.into_iter()
			.flatten()
			.filter_map(|entry| entry.get("options").and_then(Value::as_array))
			.flatten()
			.filter_map(|option| option.get("text").and_then(Value::as_str))
			.map(str::to_string)
			.collect();

		Ok(options)
	}

	/// Values of a suggestable filter field matching `text`, scoped by the request's other
	/// filters.
	pub async fn suggest_filter(
		&self,
		name: &str,
		text: &str,
		request: &SearchRequest,
	) -> Result<Vec<String>> {
		let field = fields::lookup(name).ok_or_else(|| Error::InvalidFilter {
			field: name.to_string(),
			message: "unknown filter field.".to_string(),
		})?;
		let Some(mode) = field.suggest else {
			return Err(Error::InvalidFilter {
				field: name.to_string(),
				message: "field does not support suggestions.".to_string(),
			});
		};
		let text = text.trim();

		if text.is_empty() {
			return Ok(Vec::new());
		}

		let matcher = match mode {
			SuggestMode::Contains => QueryClause::Wildcard {
				field: field.es_field,
				pattern: format!("*{}*", escape_wildcard(text)),
				case_insensitive: true,
			},
			SuggestMode::Prefix =>
				QueryClause::Prefix { field: field.es_field, value: text.to_string() },
		};
		let scope = filter::compile_query(request)
			.merge(filter::compile(request, &BTreeSet::from([field.name]))?)
			.merge(BoolClauses { filter: vec![matcher], ..Default::default() });
		let body = serde_json::json!({
			"size": 0,
			"query": scope.to_query(),
			"aggs": { field.name: aggregation::terms(field.es_field, MAX_SUGGESTIONS) },
		});
		let response = self.engine.search(&body).await?;
		let keys = response
			.aggregations
			.as_ref()
			.and_then(|aggs| aggs.get(field.name))
			.and_then(|agg| agg.get("buckets"))
			.and_then(Value::as_array)
			.into_iter()
			.flatten()
			.filter_map(|bucket| bucket.get("key").and_then(Value::as_str))
			.map(str::to_string)
			.collect();

		Ok(keys)
	}
}

/// Escapes wildcard metacharacters so caller text matches literally.
pub fn escape_wildcard(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());

	for ch in text.chars() {
		if matches!(ch, '*' | '?' | '\\') {
			escaped.push('\\');
		}
		escaped.push(ch);
	}

	escaped
}
