mod error;

pub use error::{Error, Result};

use std::{
	collections::{HashMap, VecDeque},
	env, fs,
	sync::{
		Mutex, MutexGuard,
		atomic::{AtomicU64, Ordering},
	},
};

use serde_json::Value;

use ccdb_config::Config;
use ccdb_engine::{BoxFuture, Hit, Hits, HitsTotal, SearchEngine, SearchResponse};

const TEST_CONFIG_TOML: &str = include_str!("../fixtures/test_config.toml");

pub const SCROLL_ID: &str = "scroll-1";

/// Loads the shared test configuration through the regular load path.
pub fn test_config() -> Result<Config> {
	load_config_str(TEST_CONFIG_TOML)
}

pub fn load_config_str(payload: &str) -> Result<Config> {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let mut path = env::temp_dir();

	path.push(format!("ccdb_testkit_{}_{ordinal}.toml", std::process::id()));

	fs::write(&path, payload)?;

	let loaded = ccdb_config::load(&path);

	fs::remove_file(&path)?;

	Ok(loaded?)
}

/// A relevance-sorted hit carrying engine sort values `[score, id]`.
pub fn hit(id: &str, score: f64) -> Hit {
	Hit {
		id: id.to_string(),
		score: Some(score),
		source: serde_json::json!({ "complaint_id": id }),
		sort: vec![Value::from(score), Value::from(id)],
		highlight: None,
	}
}

/// A date-sorted hit carrying engine sort values `[millis, id]`.
pub fn date_hit(id: &str, millis: i64) -> Hit {
	Hit {
		id: id.to_string(),
		score: None,
		source: serde_json::json!({ "complaint_id": id, "date_received": millis }),
		sort: vec![Value::from(millis), Value::from(id)],
		highlight: None,
	}
}

/// `count` hits in descending score order, ids "1" through `count`.
pub fn ranked_hits(count: usize) -> Vec<Hit> {
	(1..=count).map(|i| hit(&i.to_string(), 1_000.0 - i as f64)).collect()
}

#[derive(Default)]
struct FakeState {
	hits: Vec<Hit>,
	total: Option<HitsTotal>,
	aggregations: Option<Value>,
	suggestions: Vec<String>,
	max_date_millis: Option<i64>,
	max_indexed_millis: Option<i64>,
	aggregated_total: u64,
	counted_total: u64,
	fail_search: bool,
	fail_meta: bool,
	scroll_batches: VecDeque<Vec<Value>>,
	documents: HashMap<String, Value>,
	requests: Vec<Value>,
	cleared_scrolls: Vec<String>,
}

/// Scripted in-memory engine.
///
/// Requests are routed by shape: the corpus metadata query, completion suggest requests, and
/// everything else as a regular search. Regular searches honor `size` and `search_after`
/// against the scripted hits.
#[derive(Default)]
pub struct FakeEngine {
	state: Mutex<FakeState>,
}
impl FakeEngine {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_hits(self, hits: Vec<Hit>) -> Self {
		self.lock().hits = hits;

		self
	}

	pub fn with_total(self, value: u64, relation: &str) -> Self {
		self.lock().total = Some(HitsTotal { value, relation: relation.to_string() });

		self
	}

	pub fn with_aggregations(self, aggregations: Value) -> Self {
		self.lock().aggregations = Some(aggregations);

		self
	}

	pub fn with_suggestions(self, suggestions: &[&str]) -> Self {
		self.lock().suggestions = suggestions.iter().map(|text| text.to_string()).collect();

		self
	}

	/// Newest received and indexed dates, as epoch milliseconds.
	pub fn with_corpus_dates(self, max_date_millis: i64, max_indexed_millis: i64) -> Self {
		{
			let mut state = self.lock();

			state.max_date_millis = Some(max_date_millis);
			state.max_indexed_millis = Some(max_indexed_millis);
		}

		self
	}

	pub fn with_corpus_totals(self, aggregated_total: u64, counted_total: u64) -> Self {
		{
			let mut state = self.lock();

			state.aggregated_total = aggregated_total;
			state.counted_total = counted_total;
		}

		self
	}

	pub fn failing_search(self) -> Self {
		self.lock().fail_search = true;

		self
	}

	pub fn failing_meta(self) -> Self {
		self.lock().fail_meta = true;

		self
	}

	pub fn with_scroll_batches(self, batches: Vec<Vec<Value>>) -> Self {
		self.lock().scroll_batches = batches.into();

		self
	}

	pub fn with_document(self, id: &str, source: Value) -> Self {
		self.lock().documents.insert(id.to_string(), source);

		self
	}

	/// Every body received by `search`, `count` and `open_scroll`, in arrival order.
	pub fn requests(&self) -> Vec<Value> {
		self.lock().requests.clone()
	}

	/// Bodies received outside the corpus metadata and count requests.
	pub fn search_requests(&self) -> Vec<Value> {
		self.requests().into_iter().filter(|body| !is_meta(body) && !is_count(body)).collect()
	}

	pub fn cleared_scrolls(&self) -> Vec<String> {
		self.lock().cleared_scrolls.clone()
	}

	fn lock(&self) -> MutexGuard<'_, FakeState> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn respond(&self, body: &Value) -> ccdb_engine::Result<SearchResponse> {
		let mut state = self.lock();

		state.requests.push(body.clone());

		if is_meta(body) {
			if state.fail_meta {
				return Err(unavailable("metadata"));
			}

			let max_of = |millis: Option<i64>| {
				serde_json::json!({ "value": millis.map(|millis| millis as f64) })
			};

			return Ok(SearchResponse {
				hits: Hits {
					total: Some(HitsTotal::exact(state.aggregated_total)),
					hits: Vec::new(),
				},
				aggregations: Some(serde_json::json!({
					"max_date": max_of(state.max_date_millis),
					"max_indexed_date": max_of(state.max_indexed_millis),
				})),
				..Default::default()
			});
		}
		if state.fail_search {
			return Err(unavailable("search"));
		}
		if body.get("suggest").is_some() {
			let options: Vec<Value> =
				state.suggestions.iter().map(|text| serde_json::json!({ "text": text })).collect();

			return Ok(SearchResponse {
				suggest: Some(serde_json::json!({ "sgg": [{ "options": options }] })),
				..Default::default()
			});
		}

		let start = match body.get("search_after").and_then(Value::as_array) {
			Some(after) => state
				.hits
				.iter()
				.position(|hit| same_sort(&hit.sort, after))
				.map(|position| position + 1)
				.unwrap_or(state.hits.len()),
			None => 0,
		};
		let size = body.get("size").and_then(Value::as_u64).unwrap_or(10) as usize;
		let total =
			state.total.clone().unwrap_or_else(|| HitsTotal::exact(state.hits.len() as u64));

		Ok(SearchResponse {
			hits: Hits {
				total: Some(total),
				hits: state.hits.iter().skip(start).take(size).cloned().collect(),
			},
			aggregations: state.aggregations.clone(),
			..Default::default()
		})
	}
}

impl SearchEngine for FakeEngine {
	fn search<'a>(
		&'a self,
		body: &'a Value,
	) -> BoxFuture<'a, ccdb_engine::Result<SearchResponse>> {
		Box::pin(async move { self.respond(body) })
	}

	fn count<'a>(&'a self, body: &'a Value) -> BoxFuture<'a, ccdb_engine::Result<u64>> {
		Box::pin(async move {
			let mut state = self.lock();

			state.requests.push(serde_json::json!({ "count": body }));

			if state.fail_meta {
				return Err(unavailable("count"));
			}

			Ok(state.counted_total)
		})
	}

	fn open_scroll<'a>(
		&'a self,
		body: &'a Value,
		_keep_alive: &'a str,
	) -> BoxFuture<'a, ccdb_engine::Result<SearchResponse>> {
		Box::pin(async move {
			let mut state = self.lock();

			state.requests.push(body.clone());

			if state.fail_search {
				return Err(unavailable("scroll"));
			}

			Ok(scroll_page(state.scroll_batches.pop_front().unwrap_or_default()))
		})
	}

	fn scroll<'a>(
		&'a self,
		_scroll_id: &'a str,
		_keep_alive: &'a str,
	) -> BoxFuture<'a, ccdb_engine::Result<SearchResponse>> {
		Box::pin(async move {
			Ok(scroll_page(self.lock().scroll_batches.pop_front().unwrap_or_default()))
		})
	}

	fn clear_scroll<'a>(&'a self, scroll_id: &'a str) -> BoxFuture<'a, ccdb_engine::Result<()>> {
		Box::pin(async move {
			self.lock().cleared_scrolls.push(scroll_id.to_string());

			Ok(())
		})
	}

	fn get_document<'a>(
		&'a self,
		id: &'a str,
	) -> BoxFuture<'a, ccdb_engine::Result<Option<Value>>> {
		Box::pin(async move { Ok(self.lock().documents.get(id).cloned()) })
	}
}

fn is_meta(body: &Value) -> bool {
	body.pointer("/aggs/max_date").is_some()
}

fn is_count(body: &Value) -> bool {
	body.get("count").is_some()
}

fn same_sort(sort: &[Value], after: &[Value]) -> bool {
	sort.len() == after.len()
		&& sort.iter().zip(after).all(|(left, right)| match (left.as_f64(), right.as_f64()) {
			(Some(left), Some(right)) => left == right,
			_ => sort_text(left) == sort_text(right),
		})
}

fn sort_text(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		other => other.to_string(),
	}
}

fn scroll_page(sources: Vec<Value>) -> SearchResponse {
	let hits = sources
		.into_iter()
		.enumerate()
		.map(|(i, source)| Hit {
			id: i.to_string(),
			score: None,
			source,
			sort: Vec::new(),
			highlight: None,
		})
		.collect();

	SearchResponse {
		hits: Hits { total: None, hits },
		scroll_id: Some(SCROLL_ID.to_string()),
		..Default::default()
	}
}

fn unavailable(what: &str) -> ccdb_engine::Error {
	ccdb_engine::Error::Unavailable { message: format!("Scripted {what} failure.") }
}
