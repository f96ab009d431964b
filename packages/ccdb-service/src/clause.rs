use serde_json::{Map, Value};

/// A compiled query clause, rendered to the engine's query DSL by [`QueryClause::render_into`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryClause {
	/// One clause matching any of `values`.
	Terms { field: &'static str, values: Vec<Value> },
	/// One single-value terms clause per entry; the document must carry every value.
	ParallelTerms { field: &'static str, values: Vec<Value> },
	/// Any of the nested clauses may match.
	BoolShould(Vec<QueryClause>),
	/// A parent value narrowed to a set of child values.
	ParentChild {
		parent_field: &'static str,
		parent: String,
		child_field: &'static str,
		children: Vec<String>,
	},
	Range { field: &'static str, gte: Option<String>, lt: Option<String> },
	Wildcard { field: &'static str, pattern: String, case_insensitive: bool },
	Prefix { field: &'static str, value: String },
	QueryString { fields: Vec<&'static str>, query: String },
}
impl QueryClause {
	/// Appends the rendered clause(s). `ParallelTerms` expands to several sibling clauses.
	pub fn render_into(&self, out: &mut Vec<Value>) {
		match self {
			Self::ParallelTerms { field, values } =>
				for value in values {
					out.push(serde_json::json!({ "terms": { *field: [value] } }));
				},
			other => out.push(other.render()),
		}
	}

	pub fn render(&self) -> Value {
		match self {
			Self::Terms { field, values } => serde_json::json!({ "terms": { *field: values } }),
			Self::ParallelTerms { .. } => {
				let mut clauses = Vec::new();

				self.render_into(&mut clauses);

				serde_json::json!({ "bool": { "filter": clauses } })
			},
			Self::BoolShould(clauses) => {
				let mut rendered = Vec::with_capacity(clauses.len());

				for clause in clauses {
					clause.render_into(&mut rendered);
				}

				serde_json::json!({ "bool": { "should": rendered, "minimum_should_match": 1 } })
			},
			Self::ParentChild { parent_field, parent, child_field, children } => serde_json::json!({
				"bool": {
					"filter": [
						{ "term": { *parent_field: parent } },
						{ "terms": { *child_field: children } },
					]
				}
			}),
			Self::Range { field, gte, lt } => {
				let mut bounds = Map::new();

				if let Some(gte) = gte {
					bounds.insert("gte".to_string(), Value::String(gte.clone()));
				}
				if let Some(lt) = lt {
					bounds.insert("lt".to_string(), Value::String(lt.clone()));
				}

				serde_json::json!({ "range": { *field: bounds } })
			},
			Self::Wildcard { field, pattern, case_insensitive } => serde_json::json!({
				"wildcard": { *field: { "value": pattern, "case_insensitive": case_insensitive } }
			}),
			Self::Prefix { field, value } =>
				serde_json::json!({ "prefix": { *field: { "value": value } } }),
			Self::QueryString { fields, query } => serde_json::json!({
				"query_string": {
					"query": query,
					"fields": fields,
					"default_operator": "AND",
				}
			}),
		}
	}
}

/// The four clause sets of an engine `bool` query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolClauses {
	pub must: Vec<QueryClause>,
	pub should: Vec<QueryClause>,
	pub filter: Vec<QueryClause>,
	pub must_not: Vec<QueryClause>,
}
impl BoolClauses {
	pub fn is_empty(&self) -> bool {
		self.must.is_empty()
			&& self.should.is_empty()
			&& self.filter.is_empty()
			&& self.must_not.is_empty()
	}

	pub fn merge(mut self, other: Self) -> Self {
		self.must.extend(other.must);
		self.should.extend(other.should);
		self.filter.extend(other.filter);
		self.must_not.extend(other.must_not);

		self
	}

	/// Renders a `bool` query, or `match_all` when there is nothing to constrain.
	pub fn to_query(&self) -> Value {
		if self.is_empty() {
			return serde_json::json!({ "match_all": {} });
		}

		let mut body = Map::new();

		for (key, clauses) in [
			("must", &self.must),
			("should", &self.should),
			("filter", &self.filter),
			("must_not", &self.must_not),
		] {
			if clauses.is_empty() {
				continue;
			}

			let mut rendered = Vec::with_capacity(clauses.len());

			for clause in clauses {
				clause.render_into(&mut rendered);
			}

			body.insert(key.to_string(), Value::Array(rendered));
		}

		if !self.should.is_empty() {
			body.insert("minimum_should_match".to_string(), Value::from(1));
		}

		serde_json::json!({ "bool": body })
	}
}
