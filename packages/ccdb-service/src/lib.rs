pub mod aggregation;
pub mod clause;
pub mod cursor;
pub mod export;
pub mod filter;
pub mod meta;
pub mod pagination;
pub mod search;
pub mod suggest;
pub mod time_serde;

mod error;

pub use clause::{BoolClauses, QueryClause};
pub use cursor::{SortCursor, SortPrimary};
pub use error::{Error, Result};
pub use export::{ExportCursor, ExportFormat};
pub use meta::{ConfigFlags, CorpusMeta, FeatureFlags};
pub use pagination::{BreakPointTable, PaginationPlanner};
pub use search::{AggregationResponse, PageHits, PageMeta, SearchOutcome, SearchPage};

use std::sync::Arc;

use ccdb_config::Config;
use ccdb_engine::SearchEngine;

pub struct CcdbService {
	pub cfg: Config,
	pub engine: Arc<dyn SearchEngine>,
	pub flags: Arc<dyn FeatureFlags>,
}
impl CcdbService {
	/// Builds the service with config-backed feature flags.
	pub fn new(cfg: Config, engine: Arc<dyn SearchEngine>) -> Self {
		let flags = Arc::new(ConfigFlags::new(&cfg.flags));

		Self { cfg, engine, flags }
	}

	pub fn with_flags(
		cfg: Config,
		engine: Arc<dyn SearchEngine>,
		flags: Arc<dyn FeatureFlags>,
	) -> Self {
		Self { cfg, engine, flags }
	}

	pub fn planner(&self) -> PaginationPlanner {
		PaginationPlanner::new(&self.cfg.pagination)
	}
}
