use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use time::{Date, macros::format_description};

use ccdb_domain::{
	Combinator, DateRange, FilterField, FilterValue, Hierarchy, SearchField, SearchRequest,
	ValueKind, fields,
};

use crate::{
	Error, Result,
	clause::{BoolClauses, QueryClause},
};

/// Compiles the request's facet filters, skipping every field named in `exclude`.
///
/// Positive values land in `filter`; negated values land in `must_not`. All values are
/// validated first so a malformed value never yields a partial compilation.
pub fn compile(request: &SearchRequest, exclude: &BTreeSet<&str>) -> Result<BoolClauses> {
	validate(request)?;

	let mut clauses = BoolClauses::default();

	for (name, values) in &request.filters {
		if exclude.contains(name.as_str()) {
			continue;
		}

		let field = resolve(name)?;
		let (negated, positive): (Vec<&FilterValue>, Vec<&FilterValue>) =
			values.iter().partition(|value| value.negated);

		if !positive.is_empty() {
			clauses.filter.push(compile_field(field, &positive)?);
		}
		if !negated.is_empty() {
			clauses.must_not.push(compile_field(field, &negated)?);
		}
	}

	Ok(clauses)
}

/// Rejects malformed filter values before any clause is built.
pub fn validate(request: &SearchRequest) -> Result<()> {
	for (name, values) in &request.filters {
		let field = resolve(name)?;

		for value in values {
			match field.kind {
				ValueKind::Hierarchical => {
					value.hierarchy(field.name)?;
				},
				ValueKind::BooleanCoded => {
					boolean_code(field, value)?;
				},
				ValueKind::String => {},
			}
		}
	}

	Ok(())
}

/// Compiles the non-facet part of the query: free text and date ranges.
pub fn compile_query(request: &SearchRequest) -> BoolClauses {
	let mut clauses = BoolClauses::default();

	if let Some(term) = request.search_term.as_deref() {
		match request.field {
			SearchField::All =>
				for field in SearchField::All.es_fields() {
					clauses.should.push(QueryClause::QueryString {
						fields: vec![field],
						query: term.to_string(),
					});
				},
			single => clauses.must.push(QueryClause::QueryString {
				fields: single.es_fields(),
				query: term.to_string(),
			}),
		}
	}

	for (field, range) in [
		(fields::DATE_RECEIVED_FIELD, &request.date_received),
		(fields::DATE_SENT_TO_COMPANY_FIELD, &request.company_received),
	] {
		if let Some(clause) = range_clause(field, range) {
			clauses.filter.push(clause);
		}
	}

	clauses
}

/// Facet filters and query clauses combined into a single query, for requests that do not
/// need self-excluding aggregations.
pub fn compile_all(request: &SearchRequest) -> Result<BoolClauses> {
	Ok(compile_query(request).merge(compile(request, &BTreeSet::new())?))
}

fn resolve(name: &str) -> Result<&'static FilterField> {
	fields::lookup(name).ok_or_else(|| Error::InvalidFilter {
		field: name.to_string(),
		message: "unknown filter field.".to_string(),
	})
}

fn compile_field(field: &'static FilterField, values: &[&FilterValue]) -> Result<QueryClause> {
	let terms = match field.kind {
		ValueKind::Hierarchical => return compile_hierarchy(field, values),
		ValueKind::BooleanCoded => {
			let mut coded = Vec::with_capacity(values.len());

			for value in values {
				let code = boolean_code(field, value)?;

				if !coded.contains(&code) {
					coded.push(code);
				}
			}

			coded
		},
		ValueKind::String => values.iter().map(|value| Value::from(value.raw.as_str())).collect(),
	};

	Ok(match field.combinator {
		Combinator::Must => QueryClause::ParallelTerms { field: field.es_field, values: terms },
		Combinator::Should => QueryClause::Terms { field: field.es_field, values: terms },
	})
}

fn compile_hierarchy(field: &'static FilterField, values: &[&FilterValue]) -> Result<QueryClause> {
	let child_field = field.child_es_field.ok_or_else(|| Error::Internal {
		message: format!("hierarchical field {} has no child field.", field.name),
	})?;
	let mut parents = Vec::new();
	let mut children: BTreeMap<&str, Vec<String>> = BTreeMap::new();

	for value in values {
		match value.hierarchy(field.name)? {
			Hierarchy::Parent(parent) => parents.push(Value::from(parent)),
			Hierarchy::Child { parent, child } =>
				children.entry(parent).or_default().push(child.to_string()),
		}
	}

	let mut alternatives = Vec::with_capacity(children.len() + 1);

	if !parents.is_empty() {
		alternatives.push(QueryClause::Terms { field: field.es_field, values: parents });
	}

	for (parent, children) in children {
		alternatives.push(QueryClause::ParentChild {
			parent_field: field.es_field,
			parent: parent.to_string(),
			child_field,
			children,
		});
	}

	if alternatives.len() == 1 {
		return Ok(alternatives.remove(0));
	}

	Ok(QueryClause::BoolShould(alternatives))
}

fn boolean_code(field: &FilterField, value: &FilterValue) -> Result<Value> {
	match value.raw.to_ascii_lowercase().as_str() {
		"yes" => Ok(Value::from(1)),
		"no" => Ok(Value::from(0)),
		_ => Err(Error::InvalidFilter {
			field: field.name.to_string(),
			message: format!("'{}' must be yes or no.", value.raw),
		}),
	}
}

fn range_clause(field: &'static str, range: &DateRange) -> Option<QueryClause> {
	if range.is_empty() {
		return None;
	}

	// The upper bound is inclusive for callers, so the engine sees the following day.
	let lt = range.max.map(|max| format_date(max.next_day().unwrap_or(max)));

	Some(QueryClause::Range { field, gte: range.min.map(format_date), lt })
}

fn format_date(date: Date) -> String {
	date.format(format_description!("[year]-[month]-[day]")).unwrap_or_else(|_| date.to_string())
}

#[cfg(test)]
mod tests {
	use time::macros::date;

	use super::*;

	fn compile_all_fields(request: &SearchRequest) -> BoolClauses {
		compile(request, &BTreeSet::new()).expect("compile")
	}

	#[test]
	fn plain_values_share_one_terms_clause() {
		let request =
			SearchRequest::default().with_filter("company", "Acme").with_filter("company", "Beta");

		assert_eq!(compile_all_fields(&request).filter, vec![QueryClause::Terms {
			field: "company.raw",
			values: vec![Value::from("Acme"), Value::from("Beta")],
		}]);
	}

	#[test]
	fn must_fields_compile_to_parallel_terms() {
		let request = SearchRequest::default()
			.with_filter("tags", "Servicemember")
			.with_filter("tags", "Older American");
		let query = compile_all_fields(&request).to_query();

		assert_eq!(query["bool"]["filter"].as_array().map(Vec::len), Some(2));
		assert_eq!(
			query["bool"]["filter"][1]["terms"]["tags"],
			serde_json::json!(["Older American"])
		);
	}

	#[test]
	fn negated_values_land_in_must_not() {
		let mut request = SearchRequest::default().with_filter("state", "CA");

		request.add_filter("state", FilterValue::negated("TX"));

		let clauses = compile_all_fields(&request);

		assert_eq!(clauses.filter.len(), 1);
		assert_eq!(clauses.must_not, vec![QueryClause::Terms {
			field: "state",
			values: vec![Value::from("TX")],
		}]);
		assert!(clauses.must.is_empty() && clauses.should.is_empty());
	}

	#[test]
	fn boolean_coded_values_map_to_digits() {
		let request = SearchRequest::default().with_filter("has_narrative", "YES");

		assert_eq!(compile_all_fields(&request).filter, vec![QueryClause::Terms {
			field: "has_narrative",
			values: vec![Value::from(1)],
		}]);

		let request = SearchRequest::default().with_filter("has_narrative", "maybe");
		let err = compile(&request, &BTreeSet::new()).expect_err("Expected yes/no error.");

		assert!(matches!(err, Error::InvalidFilter { ref field, .. } if field == "has_narrative"));
	}

	#[test]
	fn hierarchical_children_group_under_their_parent() {
		let request = SearchRequest::default()
			.with_filter("product", "Mortgage•FHA mortgage")
			.with_filter("product", "Mortgage•VA mortgage")
			.with_filter("product", "Student loan");
		let clauses = compile_all_fields(&request);

		assert_eq!(clauses.filter, vec![QueryClause::BoolShould(vec![
			QueryClause::Terms { field: "product.raw", values: vec![Value::from("Student loan")] },
			QueryClause::ParentChild {
				parent_field: "product.raw",
				parent: "Mortgage".to_string(),
				child_field: "sub_product.raw",
				children: vec!["FHA mortgage".to_string(), "VA mortgage".to_string()],
			},
		])]);
	}

	#[test]
	fn two_delimiters_fail_before_compilation() {
		let request = SearchRequest::default()
			.with_filter("state", "CA")
			.with_filter("issue", "Fees•Late fee•Other");
		let err = compile(&request, &BTreeSet::new()).expect_err("Expected delimiter error.");

		assert!(matches!(err, Error::InvalidFilter { ref field, .. } if field == "issue"));
	}

	#[test]
	fn excluded_fields_are_skipped() {
		let request = SearchRequest::default().with_filter("state", "CA").with_filter("timely", "Yes");
		let clauses = compile(&request, &BTreeSet::from(["state"])).expect("compile");

		assert_eq!(clauses.filter, vec![QueryClause::Terms {
			field: "timely",
			values: vec![Value::from("Yes")],
		}]);
	}

	#[test]
	fn unknown_fields_are_rejected() {
		let request = SearchRequest::default().with_filter("complaint_what_happened", "x");

		assert!(matches!(
			validate(&request),
			Err(Error::InvalidFilter { ref field, .. }) if field == "complaint_what_happened"
		));
	}

	#[test]
	fn search_term_scope_selects_must_or_should() {
		let mut request =
			SearchRequest { search_term: Some("late fee".to_string()), ..Default::default() };
		let single = compile_query(&request);

		assert_eq!(single.must.len(), 1);

		request.field = SearchField::All;

		let all = compile_query(&request);

		assert!(all.must.is_empty());
		assert_eq!(all.should.len(), 3);
		assert_eq!(all.to_query()["bool"]["minimum_should_match"], 1);
	}

	#[test]
	fn date_ranges_use_exclusive_next_day_bound() {
		let request = SearchRequest {
			date_received: DateRange {
				min: Some(date!(2020 - 01 - 01)),
				max: Some(date!(2020 - 12 - 31)),
			},
			..Default::default()
		};

		assert_eq!(compile_query(&request).filter, vec![QueryClause::Range {
			field: "date_received",
			gte: Some("2020-01-01".to_string()),
			lt: Some("2021-01-01".to_string()),
		}]);
	}
}
