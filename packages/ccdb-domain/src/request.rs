use std::collections::BTreeMap;

use time::{Date, macros::format_description};

use crate::{
	Error, Result,
	fields::{self, HIERARCHY_DELIMITER, SearchField},
};

/// One caller-supplied filter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterValue {
	pub raw: String,
	/// Set when the value arrived through a `not_<field>` parameter.
	pub negated: bool,
}
impl FilterValue {
	pub fn new(raw: impl Into<String>) -> Self {
		Self { raw: raw.into(), negated: false }
	}

	pub fn negated(raw: impl Into<String>) -> Self {
		Self { raw: raw.into(), negated: true }
	}

	/// Splits a hierarchical value into parent and optional child.
	pub fn hierarchy(&self, field: &str) -> Result<Hierarchy<'_>> {
		let mut parts = self.raw.split(HIERARCHY_DELIMITER);
		let parent = parts.next().unwrap_or_default();

		match (parts.next(), parts.next()) {
			(None, _) => Ok(Hierarchy::Parent(parent)),
			(Some(child), None) => Ok(Hierarchy::Child { parent, child }),
			(Some(_), Some(_)) => Err(Error::invalid(
				field,
				format!(
					"'{}' contains more than one '{HIERARCHY_DELIMITER}' delimiter.",
					self.raw
				),
			)),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hierarchy<'a> {
	Parent(&'a str),
	Child { parent: &'a str, child: &'a str },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMode {
	#[default]
	RelevanceDesc,
	RelevanceAsc,
	CreatedDateDesc,
	CreatedDateAsc,
}
impl SortMode {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"relevance_desc" => Some(Self::RelevanceDesc),
			"relevance_asc" => Some(Self::RelevanceAsc),
			"created_date_desc" => Some(Self::CreatedDateDesc),
			"created_date_asc" => Some(Self::CreatedDateAsc),
			_ => None,
		}
	}

	pub fn is_relevance(self) -> bool {
		matches!(self, Self::RelevanceDesc | Self::RelevanceAsc)
	}

	pub fn order(self) -> &'static str {
		match self {
			Self::RelevanceDesc | Self::CreatedDateDesc => "desc",
			Self::RelevanceAsc | Self::CreatedDateAsc => "asc",
		}
	}

	/// Engine field carrying the primary sort value.
	pub fn primary_field(self) -> &'static str {
		if self.is_relevance() { "_score" } else { fields::DATE_RECEIVED_FIELD }
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Format {
	#[default]
	Default,
	Json,
	Csv,
	Unsupported(String),
}
impl Format {
	pub fn parse(raw: &str) -> Self {
		match raw.to_ascii_lowercase().as_str() {
			"" | "default" => Self::Default,
			"json" => Self::Json,
			"csv" => Self::Csv,
			_ => Self::Unsupported(raw.to_string()),
		}
	}

	pub fn is_export(&self) -> bool {
		!matches!(self, Self::Default)
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lens {
	#[default]
	Overview,
	Product,
	Issue,
	Company,
	Tags,
}
impl Lens {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"overview" => Some(Self::Overview),
			"product" => Some(Self::Product),
			"issue" => Some(Self::Issue),
			"company" => Some(Self::Company),
			"tags" => Some(Self::Tags),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Overview => "overview",
			Self::Product => "product",
			Self::Issue => "issue",
			Self::Company => "company",
			Self::Tags => "tags",
		}
	}

	/// Filter field grouped by this lens; `None` for the overview lens.
	pub fn field(self) -> Option<&'static fields::FilterField> {
		match self {
			Self::Overview => None,
			other => fields::lookup(other.as_str()),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendInterval {
	Year,
	Month,
	Week,
}
impl TrendInterval {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"year" => Some(Self::Year),
			"month" => Some(Self::Month),
			"week" => Some(Self::Week),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Year => "year",
			Self::Month => "month",
			Self::Week => "week",
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrendParams {
	pub lens: Lens,
	pub sub_lens: Option<Lens>,
	pub trend_depth: Option<u32>,
	pub sub_lens_depth: Option<u32>,
	pub trend_interval: Option<TrendInterval>,
	pub focus: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
	pub min: Option<Date>,
	pub max: Option<Date>,
}
impl DateRange {
	pub fn is_empty(&self) -> bool {
		self.min.is_none() && self.max.is_none()
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
	/// Filter field name to values, keyed by the field table's logical names.
	pub filters: BTreeMap<String, Vec<FilterValue>>,
	pub search_term: Option<String>,
	pub field: SearchField,
	pub date_received: DateRange,
	pub company_received: DateRange,
	pub sort: SortMode,
	/// Page size; the service applies the configured default when absent.
	pub size: Option<u32>,
	pub page: u32,
	pub search_after: Option<String>,
	pub format: Format,
	pub no_aggs: bool,
	pub no_highlight: bool,
	pub trend: TrendParams,
}
impl Default for SearchRequest {
	fn default() -> Self {
		Self {
			filters: BTreeMap::new(),
			search_term: None,
			field: SearchField::default(),
			date_received: DateRange::default(),
			company_received: DateRange::default(),
			sort: SortMode::default(),
			size: None,
			page: 1,
			search_after: None,
			format: Format::default(),
			no_aggs: false,
			no_highlight: false,
			trend: TrendParams::default(),
		}
	}
}
impl SearchRequest {
	/// Builds a request from decoded query-string pairs. Repeated keys accumulate for list
	/// parameters and unknown keys are ignored.
	pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let mut request = Self::default();

		for (key, value) in pairs {
			request.apply(key.as_ref(), value.as_ref())?;
		}

		if request.trend.sub_lens.is_some() && request.trend.sub_lens == Some(request.trend.lens)
		{
			return Err(Error::invalid("sub_lens", "sub_lens must differ from lens."));
		}

		Ok(request)
	}

	pub fn add_filter(&mut self, name: &str, value: FilterValue) {
		self.filters.entry(name.to_string()).or_default().push(value);
	}

	pub fn with_filter(mut self, name: &str, raw: &str) -> Self {
		self.add_filter(name, FilterValue::new(raw));

		self
	}

	pub fn has_filter(&self, name: &str) -> bool {
		self.filters.get(name).map(|values| !values.is_empty()).unwrap_or(false)
	}

	fn apply(&mut self, key: &str, value: &str) -> Result<()> {
		let value = value.trim();

		match key {
			"search_term" =>
				if !value.is_empty() {
					self.search_term = Some(value.to_string());
				},
			"field" =>
				self.field = SearchField::parse(value)
					.ok_or_else(|| Error::invalid(key, format!("unknown field '{value}'.")))?,
			"size" => self.size = Some(parse_positive(key, value)?),
			"page" => self.page = parse_positive(key, value)?,
			"search_after" =>
				if !value.is_empty() {
					self.search_after = Some(value.to_string());
				},
			"sort" =>
				self.sort = SortMode::parse(value)
					.ok_or_else(|| Error::invalid(key, format!("unknown sort '{value}'.")))?,
			"format" => self.format = Format::parse(value),
			"no_aggs" => self.no_aggs = parse_bool(key, value)?,
			"no_highlight" => self.no_highlight = parse_bool(key, value)?,
			"date_received_min" => self.date_received.min = Some(parse_date(key, value)?),
			"date_received_max" => self.date_received.max = Some(parse_date(key, value)?),
			"company_received_min" => self.company_received.min = Some(parse_date(key, value)?),
			"company_received_max" => self.company_received.max = Some(parse_date(key, value)?),
			"lens" =>
				self.trend.lens = Lens::parse(value)
					.ok_or_else(|| Error::invalid(key, format!("unknown lens '{value}'.")))?,
			"sub_lens" =>
				if !value.is_empty() && value != "overview" {
					self.trend.sub_lens = Some(Lens::parse(value).ok_or_else(|| {
						Error::invalid(key, format!("unknown sub_lens '{value}'."))
					})?);
				},
			"trend_depth" => self.trend.trend_depth = Some(parse_positive(key, value)?),
			"sub_lens_depth" => self.trend.sub_lens_depth = Some(parse_positive(key, value)?),
			"trend_interval" =>
				self.trend.trend_interval = Some(TrendInterval::parse(value).ok_or_else(|| {
					Error::invalid(key, format!("unknown trend_interval '{value}'."))
				})?),
			"focus" =>
				if !value.is_empty() {
					self.trend.focus = Some(value.to_string());
				},
			_ => self.apply_filter(key, value),
		}

		Ok(())
	}

	fn apply_filter(&mut self, key: &str, value: &str) {
		if value.is_empty() {
			return;
		}

		if let Some(field) = fields::lookup(key) {
			self.add_filter(field.name, FilterValue::new(value));
		} else if let Some(field) = key.strip_prefix("not_").and_then(fields::lookup) {
			self.add_filter(field.name, FilterValue::negated(value));
		}
	}
}

fn parse_positive(key: &str, value: &str) -> Result<u32> {
	match value.parse::<u32>() {
		Ok(parsed) if parsed > 0 => Ok(parsed),
		_ => Err(Error::invalid(key, format!("'{value}' must be a positive integer."))),
	}
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
	match value.to_ascii_lowercase().as_str() {
		"" | "true" | "1" => Ok(true),
		"false" | "0" => Ok(false),
		_ => Err(Error::invalid(key, format!("'{value}' must be true or false."))),
	}
}

fn parse_date(key: &str, value: &str) -> Result<Date> {
	Date::parse(value, format_description!("[year]-[month]-[day]"))
		.map_err(|_| Error::invalid(key, format!("'{value}' must be a YYYY-MM-DD date.")))
}
