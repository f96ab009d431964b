use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
	#[serde(default)]
	pub hits: Hits,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub aggregations: Option<Value>,
	#[serde(rename = "_scroll_id", default, skip_serializing_if = "Option::is_none")]
	pub scroll_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub suggest: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hits {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub total: Option<HitsTotal>,
	#[serde(default)]
	pub hits: Vec<Hit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitsTotal {
	pub value: u64,
	/// "eq" for an exact count, "gte" once the engine stops counting.
	#[serde(default = "default_relation")]
	pub relation: String,
}
impl HitsTotal {
	pub fn exact(value: u64) -> Self {
		Self { value, relation: default_relation() }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
	#[serde(rename = "_id")]
	pub id: String,
	#[serde(rename = "_score", default)]
	pub score: Option<f64>,
	#[serde(rename = "_source", default)]
	pub source: Value,
	#[serde(default)]
	pub sort: Vec<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub highlight: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountResponse {
	pub count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentResponse {
	#[serde(default)]
	pub found: bool,
	#[serde(rename = "_source", default)]
	pub source: Option<Value>,
}

fn default_relation() -> String {
	"eq".to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_search_response_with_sort_values() {
		let json = serde_json::json!({
			"took": 3,
			"hits": {
				"total": { "value": 10000, "relation": "gte" },
				"hits": [
					{
						"_id": "180",
						"_score": 7.72,
						"_source": { "complaint_id": "180" },
						"sort": [7.72, "180"]
					}
				]
			},
			"aggregations": { "state": { "doc_count": 1 } }
		});
		let parsed: SearchResponse = serde_json::from_value(json).expect("parse failed");
		let total = parsed.hits.total.expect("total missing");

		assert_eq!(total.value, 10_000);
		assert_eq!(total.relation, "gte");
		assert_eq!(parsed.hits.hits[0].id, "180");
		assert_eq!(parsed.hits.hits[0].sort.len(), 2);
		assert!(parsed.aggregations.is_some());
		assert!(parsed.scroll_id.is_none());
	}

	#[test]
	fn missing_hits_default_to_empty() {
		let parsed: SearchResponse =
			serde_json::from_value(serde_json::json!({ "_scroll_id": "abc" }))
				.expect("parse failed");

		assert!(parsed.hits.hits.is_empty());
		assert_eq!(parsed.scroll_id.as_deref(), Some("abc"));
	}
}
