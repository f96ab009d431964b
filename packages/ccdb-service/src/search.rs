use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};
use time::OffsetDateTime;

use ccdb_domain::{Format, SearchRequest, fields};
use ccdb_engine::{Hit, HitsTotal};

use crate::{
	CcdbService, Error, Result,
	aggregation::{self, states, trends},
	cursor::SortCursor,
	export::{ExportCursor, ExportFormat},
	filter,
	meta::{self, CorpusMeta},
	pagination::BreakPointTable,
};

const HIGHLIGHT_FRAGMENT_SIZE: u32 = 500;

pub enum SearchOutcome {
	Page(SearchPage),
	Export(ExportCursor),
	/// The requested export format is not served; nothing was sent to the engine.
	Unsupported,
}

#[derive(Debug, Serialize)]
pub struct SearchPage {
	pub hits: PageHits,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub aggregations: Option<Value>,
	#[serde(rename = "_meta")]
	pub meta: PageMeta,
}

#[derive(Debug, Serialize)]
pub struct PageHits {
	pub total: HitsTotal,
	pub hits: Vec<Hit>,
}

#[derive(Debug, Serialize)]
pub struct PageMeta {
	pub break_points: BreakPointTable,
	#[serde(flatten)]
	pub corpus: Option<CorpusMeta>,
}

/// Aggregation-only responses for the states and trends views.
#[derive(Debug, Serialize)]
pub struct AggregationResponse {
	pub aggregations: Value,
	#[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
	pub meta: Option<CorpusMeta>,
}

impl CcdbService {
	/// Runs a search page, or opens an export cursor for export formats.
	pub async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome> {
		if !request.format.is_export() {
			return Ok(SearchOutcome::Page(self.search_page(request).await?));
		}

		let format = match &request.format {
			Format::Json => ExportFormat::Json,
			Format::Csv => ExportFormat::Csv,
			Format::Default | Format::Unsupported(_) => {
				tracing::info!(format = ?request.format, "Unsupported export format requested.");

				return Ok(SearchOutcome::Unsupported);
			},
		};

		Ok(SearchOutcome::Export(self.export(request, format).await?))
	}

	pub async fn search_page(&self, request: &SearchRequest) -> Result<SearchPage> {
		let planner = self.planner();
		let size = self.page_size(request);
		let cursor = request.search_after.as_deref().and_then(|raw| {
			let cursor = SortCursor::decode(raw, request.sort);

			if cursor.is_none() {
				tracing::debug!(search_after = raw, "Ignoring malformed cursor.");
			}

			cursor
		});
		let (fetch, first_page) = match cursor {
			Some(_) => (planner.query_size(1, size), request.page),
			None => {
				let end = u64::from(request.page) * u64::from(size);

				if end > u64::from(self.cfg.pagination.max_depth) {
					return Err(Error::InvalidFilter {
						field: "page".to_string(),
						message: "page is beyond the result window; resume from a break point."
							.to_string(),
					});
				}

				(planner.query_size(request.page, size), 1)
			},
		};
		let body = search_body(request, fetch, cursor.as_ref())?;
		let (main, corpus) = tokio::join!(self.engine.search(&body), self.corpus_meta());
		let main = main?;
		let break_points = planner.break_points(&main.hits.hits, size, first_page, request.sort);
		let offset = planner.slice_offset(request.page, size, cursor.is_some());
		let mut total =
			main.hits.total.unwrap_or_else(|| HitsTotal::exact(main.hits.hits.len() as u64));

		if total.value >= self.cfg.pagination.high_volume_threshold
			&& let Some(corpus) = &corpus
		{
			total = HitsTotal::exact(corpus.total_record_count);
		}

		let hits = main.hits.hits.into_iter().skip(offset).take(size as usize).collect();

		Ok(SearchPage {
			hits: PageHits { total, hits },
			aggregations: main.aggregations,
			meta: PageMeta { break_points, corpus },
		})
	}

	pub async fn states(&self, request: &SearchRequest) -> Result<AggregationResponse> {
		let body = aggregation_body(request, states::compile(request)?);
		let response = self.engine.search(&body).await?;

		Ok(AggregationResponse {
			aggregations: response.aggregations.unwrap_or_else(empty_object),
			meta: None,
		})
	}

	pub async fn trends(&self, request: &SearchRequest) -> Result<AggregationResponse> {
		let body = aggregation_body(request, trends::compile(request, &self.cfg.trends)?);
		let (response, corpus) = tokio::join!(self.engine.search(&body), self.corpus_meta());
		let response = response?;

		Ok(AggregationResponse {
			aggregations: response.aggregations.unwrap_or_else(empty_object),
			meta: corpus,
		})
	}

	pub async fn document(&self, id: &str) -> Result<Value> {
		self.engine
			.get_document(id)
			.await?
			.ok_or_else(|| Error::NotFound { message: format!("Complaint {id} not found.") })
	}

	/// Corpus metadata; failures degrade to `None`.
	pub async fn corpus_meta(&self) -> Option<CorpusMeta> {
		let now = OffsetDateTime::now_utc();

		match meta::compute_meta(self.engine.as_ref(), &self.cfg.meta, self.flags.as_ref(), now)
			.await
		{
			Ok(corpus) => Some(corpus),
			Err(err) => {
				tracing::warn!(error = %err, "Corpus metadata unavailable.");

				None
			},
		}
	}

	pub fn page_size(&self, request: &SearchRequest) -> u32 {
		let cfg = &self.cfg.pagination;

		request.size.unwrap_or(cfg.default_size).clamp(1, cfg.max_size)
	}

	async fn export(&self, request: &SearchRequest, format: ExportFormat) -> Result<ExportCursor> {
		let body = serde_json::json!({
			"query": filter::compile_all(request)?.to_query(),
			"size": self.cfg.export.batch_size,
			"sort": ["_doc"],
		});

		ExportCursor::open(self.engine.clone(), &body, &self.cfg.export.scroll_keep_alive, format)
			.await
	}
}

/// Engine body for a search page.
///
/// Facet filters go to `post_filter` so the facet aggregations can each drop their own filter.
pub fn search_body(
	request: &SearchRequest,
	fetch: u32,
	cursor: Option<&SortCursor>,
) -> Result<Value> {
	let facets = filter::compile(request, &BTreeSet::new())?;
	let order = request.sort.order();
	let primary = request.sort.primary_field();
	let tiebreak = fields::TIEBREAK_FIELD;
	let mut body = Map::new();

	body.insert("query".to_string(), filter::compile_query(request).to_query());
	body.insert("size".to_string(), Value::from(fetch));
	body.insert("from".to_string(), Value::from(0));
	body.insert(
		"sort".to_string(),
		serde_json::json!([
			{ primary: { "order": order } },
			{ tiebreak: { "order": order } },
		]),
	);

	if !facets.is_empty() {
		body.insert("post_filter".to_string(), facets.to_query());
	}
	if !request.no_aggs {
		body.insert(
			"aggs".to_string(),
			Value::Object(aggregation::compile(request, &BTreeSet::new())?),
		);
	}
	if let Some(cursor) = cursor {
		body.insert("search_after".to_string(), cursor.to_search_after());
	}
	if request.search_term.is_some() && !request.no_highlight {
		let mut highlighted = Map::new();

		for field in request.field.es_fields() {
			highlighted.insert(field.to_string(), serde_json::json!({}));
		}

		body.insert(
			"highlight".to_string(),
			serde_json::json!({
				"fields": highlighted,
				"number_of_fragments": 1,
				"fragment_size": HIGHLIGHT_FRAGMENT_SIZE,
			}),
		);
	}

	Ok(Value::Object(body))
}

fn aggregation_body(request: &SearchRequest, aggs: Map<String, Value>) -> Value {
	serde_json::json!({
		"size": 0,
		"query": filter::compile_query(request).to_query(),
		"aggs": aggs,
	})
}

fn empty_object() -> Value {
	Value::Object(Map::new())
}
