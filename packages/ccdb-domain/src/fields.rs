//! Declarative field table for the complaint corpus.
//!
//! Every filterable or aggregatable field is described once here. Query and aggregation
//! compilation resolve engine field names through this table and never spell them inline.

/// Reserved separator between a parent value and a child value, e.g. `Mortgage•FHA mortgage`.
pub const HIERARCHY_DELIMITER: char = '•';

pub const DATE_RECEIVED_FIELD: &str = "date_received";
pub const DATE_SENT_TO_COMPANY_FIELD: &str = "date_sent_to_company";
pub const DATE_INDEXED_FIELD: &str = "date_indexed";
pub const TIEBREAK_FIELD: &str = "complaint_id";
pub const TYPEAHEAD_FIELD: &str = "typeahead";
pub const NARRATIVE_FIELD: &str = "complaint_what_happened";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
	String,
	/// Caller sends "yes"/"no"; the index stores 1/0.
	BooleanCoded,
	/// Parent value with an optional child value under `child_field`.
	Hierarchical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
	/// Every listed value must be present on the document.
	Must,
	/// Any listed value may match.
	Should,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestMode {
	/// Case-insensitive substring match.
	Contains,
	Prefix,
}

#[derive(Debug)]
pub struct FilterField {
	pub name: &'static str,
	pub kind: ValueKind,
	/// Exact-match (keyword) field used for filtering and bucketing.
	pub es_field: &'static str,
	pub child_name: Option<&'static str>,
	pub child_es_field: Option<&'static str>,
	pub combinator: Combinator,
	pub agg_size: u32,
	pub child_agg_size: u32,
	/// Whether the facet is part of the default aggregation scope.
	pub default_facet: bool,
	pub suggest: Option<SuggestMode>,
}

pub static FILTER_FIELDS: &[FilterField] = &[
	FilterField {
		name: "company",
		kind: ValueKind::String,
		es_field: "company.raw",
		child_name: None,
		child_es_field: None,
		combinator: Combinator::Should,
		agg_size: 10_000,
		child_agg_size: 0,
		default_facet: false,
		suggest: Some(SuggestMode::Contains),
	},
	FilterField {
		name: "company_public_response",
		kind: ValueKind::String,
		es_field: "company_public_response.raw",
		child_name: None,
		child_es_field: None,
		combinator: Combinator::Should,
		agg_size: 100,
		child_agg_size: 0,
		default_facet: true,
		suggest: None,
	},
	FilterField {
		name: "company_response",
		kind: ValueKind::String,
		es_field: "company_response.raw",
		child_name: None,
		child_es_field: None,
		combinator: Combinator::Should,
		agg_size: 100,
		child_agg_size: 0,
		default_facet: true,
		suggest: None,
	},
	FilterField {
		name: "consumer_consent_provided",
		kind: ValueKind::String,
		es_field: "consumer_consent_provided.raw",
		child_name: None,
		child_es_field: None,
		combinator: Combinator::Should,
		agg_size: 100,
		child_agg_size: 0,
		default_facet: true,
		suggest: None,
	},
	FilterField {
		name: "consumer_disputed",
		kind: ValueKind::String,
		es_field: "consumer_disputed.raw",
		child_name: None,
		child_es_field: None,
		combinator: Combinator::Should,
		agg_size: 100,
		child_agg_size: 0,
		default_facet: true,
		suggest: None,
	},
	FilterField {
		name: "has_narrative",
		kind: ValueKind::BooleanCoded,
		es_field: "has_narrative",
		child_name: None,
		child_es_field: None,
		combinator: Combinator::Should,
		agg_size: 10,
		child_agg_size: 0,
		default_facet: true,
		suggest: None,
	},
	FilterField {
		name: "issue",
		kind: ValueKind::Hierarchical,
		es_field: "issue.raw",
		child_name: Some("sub_issue"),
		child_es_field: Some("sub_issue.raw"),
		combinator: Combinator::Should,
		agg_size: 500,
		child_agg_size: 500,
		default_facet: true,
		suggest: None,
	},
	FilterField {
		name: "product",
		kind: ValueKind::Hierarchical,
		es_field: "product.raw",
		child_name: Some("sub_product"),
		child_es_field: Some("sub_product.raw"),
		combinator: Combinator::Should,
		agg_size: 100,
		child_agg_size: 100,
		default_facet: true,
		suggest: None,
	},
	FilterField {
		name: "state",
		kind: ValueKind::String,
		es_field: "state",
		child_name: None,
		child_es_field: None,
		combinator: Combinator::Should,
		agg_size: 100,
		child_agg_size: 0,
		default_facet: true,
		suggest: None,
	},
	FilterField {
		name: "submitted_via",
		kind: ValueKind::String,
		es_field: "submitted_via",
		child_name: None,
		child_es_field: None,
		combinator: Combinator::Should,
		agg_size: 100,
		child_agg_size: 0,
		default_facet: true,
		suggest: None,
	},
	FilterField {
		name: "tags",
		kind: ValueKind::String,
		es_field: "tags",
		child_name: None,
		child_es_field: None,
		combinator: Combinator::Must,
		agg_size: 100,
		child_agg_size: 0,
		default_facet: true,
		suggest: None,
	},
	FilterField {
		name: "timely",
		kind: ValueKind::String,
		es_field: "timely",
		child_name: None,
		child_es_field: None,
		combinator: Combinator::Should,
		agg_size: 10,
		child_agg_size: 0,
		default_facet: true,
		suggest: None,
	},
	FilterField {
		name: "zip_code",
		kind: ValueKind::String,
		es_field: "zip_code",
		child_name: None,
		child_es_field: None,
		combinator: Combinator::Should,
		agg_size: 1_000,
		child_agg_size: 0,
		default_facet: true,
		suggest: Some(SuggestMode::Prefix),
	},
];

pub fn lookup(name: &str) -> Option<&'static FilterField> {
	FILTER_FIELDS.iter().find(|field| field.name == name)
}

/// Free-text search scope selected by the `field` parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchField {
	#[default]
	ComplaintWhatHappened,
	Company,
	CompanyPublicResponse,
	All,
}
impl SearchField {
	pub const SEARCHABLE: [Self; 3] =
		[Self::ComplaintWhatHappened, Self::Company, Self::CompanyPublicResponse];

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"complaint_what_happened" => Some(Self::ComplaintWhatHappened),
			"company" => Some(Self::Company),
			"company_public_response" => Some(Self::CompanyPublicResponse),
			"all" => Some(Self::All),
			_ => None,
		}
	}

	/// Analyzed engine field searched for this scope; `None` for `All`.
	pub fn es_field(self) -> Option<&'static str> {
		match self {
			Self::ComplaintWhatHappened => Some(NARRATIVE_FIELD),
			Self::Company => Some("company"),
			Self::CompanyPublicResponse => Some("company_public_response"),
			Self::All => None,
		}
	}

	pub fn es_fields(self) -> Vec<&'static str> {
		match self.es_field() {
			Some(field) => vec![field],
			None => Self::SEARCHABLE.iter().filter_map(|field| field.es_field()).collect(),
		}
	}
}
