use std::collections::BTreeMap;

use serde::Serialize;

use ccdb_domain::SortMode;
use ccdb_engine::Hit;

use crate::cursor::SortCursor;

/// Page number to the cursor that resumes iteration at that page. Never holds page 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BreakPointTable(pub BTreeMap<u32, SortCursor>);
impl BreakPointTable {
	pub fn get(&self, page: u32) -> Option<&SortCursor> {
		self.0.get(&page)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

/// Sizes over-fetched batches and derives break points from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationPlanner {
	/// Batch unit; fetches are whole multiples of it.
	batch_unit: u32,
	/// Engine result window; no fetch exceeds it.
	max_depth: u32,
}
impl PaginationPlanner {
	pub fn new(cfg: &ccdb_config::Pagination) -> Self {
		Self::with_limits(cfg.batch_unit, cfg.max_depth)
	}

	pub fn with_limits(batch_unit: u32, max_depth: u32) -> Self {
		Self { batch_unit: batch_unit.max(1), max_depth: max_depth.max(1) }
	}

	/// Number of hits to fetch so that `page` and at least one following batch are covered.
	pub fn query_size(&self, page: u32, size: u32) -> u32 {
		let unit = u64::from(self.batch_unit);
		let required = u64::from(page) * u64::from(size);
		let batches = required.div_ceil(unit).max(2);

		batches.saturating_mul(unit).min(u64::from(self.max_depth)) as u32
	}

	/// Offset of the requested page inside the fetched batch.
	pub fn slice_offset(&self, page: u32, size: u32, has_cursor: bool) -> usize {
		if has_cursor {
			return 0;
		}

		(page.saturating_sub(1) as usize).saturating_mul(size as usize)
	}

	/// Derives the cursor for every page after the first one in `hits`.
	///
	/// `first_page` is the page number the batch starts at: 1 for an offset fetch, the cursor's
	/// page when the batch was resumed with `search_after`.
	pub fn break_points(
		&self,
		hits: &[Hit],
		size: u32,
		first_page: u32,
		sort: SortMode,
	) -> BreakPointTable {
		let mut table = BTreeMap::new();

		if size == 0 {
			return BreakPointTable(table);
		}

		let size = size as usize;
		let pages = hits.len().div_ceil(size);

		for page in 2..=pages {
			let Some(hit) = hits.get((page - 1) * size - 1) else {
				continue;
			};
			let Some(cursor) = SortCursor::from_sort_values(&hit.sort, sort) else {
				tracing::debug!(hit_id = %hit.id, "Hit carries no usable sort values.");

				continue;
			};

			table.insert(first_page.max(1) + page as u32 - 1, cursor);
		}

		BreakPointTable(table)
	}
}
