use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub engine: Engine,
	pub pagination: Pagination,
	pub meta: Meta,
	#[serde(default)]
	pub trends: Trends,
	pub export: Export,
	#[serde(default)]
	pub flags: Flags,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Engine {
	/// Base URL of the search engine, e.g. "http://127.0.0.1:9200".
	pub url: String,
	/// Index (or alias) holding the complaint corpus.
	pub index: String,
	pub timeout_ms: u64,
	pub username: Option<String>,
	pub password: Option<String>,
}

/// Deep pagination tunables.
///
/// `batch_unit` and `max_depth` size the over-fetched batch a page is sliced from. Requests that
/// imply a depth beyond `max_depth` are only reachable through a break-point cursor.
#[derive(Debug, Deserialize)]
pub struct Pagination {
	pub batch_unit: u32,
	pub max_depth: u32,
	#[serde(default = "default_page_size")]
	pub default_size: u32,
	#[serde(default = "default_max_page_size")]
	pub max_size: u32,
	/// Engine hit totals at or above this value are replaced by the corpus total.
	pub high_volume_threshold: u64,
}

#[derive(Debug, Deserialize)]
pub struct Meta {
	pub staleness_days: i64,
	pub count_mismatch_threshold: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Trends {
	pub default_trend_depth: u32,
	pub default_sub_lens_depth: u32,
	pub max_depth: u32,
}
impl Default for Trends {
	fn default() -> Self {
		Self { default_trend_depth: 5, default_sub_lens_depth: 10, max_depth: 100 }
	}
}

#[derive(Debug, Deserialize)]
pub struct Export {
	/// Scroll context lifetime, in the engine's duration syntax ("1m", "30s").
	pub scroll_keep_alive: String,
	pub batch_size: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Flags {
	pub data_issue: bool,
}

fn default_page_size() -> u32 {
	25
}

fn default_max_page_size() -> u32 {
	100
}
