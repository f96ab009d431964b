//! Scroll-driven document export.

use std::sync::Arc;

use serde_json::Value;

use ccdb_engine::{SearchEngine, SearchResponse};

use crate::Result;

/// Column order of exported documents.
pub const EXPORT_COLUMNS: &[&str] = &[
	"date_received",
	"product",
	"sub_product",
	"issue",
	"sub_issue",
	"complaint_what_happened",
	"company_public_response",
	"company",
	"state",
	"zip_code",
	"tags",
	"consumer_consent_provided",
	"submitted_via",
	"date_sent_to_company",
	"company_response",
	"timely",
	"consumer_disputed",
	"complaint_id",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
	Json,
	Csv,
}
impl ExportFormat {
	pub fn content_type(self) -> &'static str {
		match self {
			Self::Json => "application/json",
			Self::Csv => "text/csv; charset=utf-8",
		}
	}

	pub fn extension(self) -> &'static str {
		match self {
			Self::Json => "json",
			Self::Csv => "csv",
		}
	}
}

/// Lazily pulls complaint documents one scroll batch at a time.
///
/// The scroll context is released once the stream is exhausted, on [`ExportCursor::close`], or
/// when the cursor is dropped early.
pub struct ExportCursor {
	engine: Arc<dyn SearchEngine>,
	keep_alive: String,
	scroll_id: Option<String>,
	pending: Option<Vec<Value>>,
	format: ExportFormat,
}
impl ExportCursor {
	/// Opens the scroll and holds its first batch, so engine failures surface before any
	/// output is written.
	pub async fn open(
		engine: Arc<dyn SearchEngine>,
		body: &Value,
		keep_alive: &str,
		format: ExportFormat,
	) -> Result<Self> {
		let first = engine.open_scroll(body, keep_alive).await?;
		let scroll_id = first.scroll_id.clone();

		tracing::debug!(format = format.extension(), "Export scroll opened.");

		Ok(Self {
			engine,
			keep_alive: keep_alive.to_string(),
			scroll_id,
			pending: Some(sources(first)),
			format,
		})
	}

	pub fn format(&self) -> ExportFormat {
		self.format
	}

	/// Next batch of `_source` documents; `None` once the scroll is exhausted.
	pub async fn next_batch(&mut self) -> Result<Option<Vec<Value>>> {
		let batch = match self.pending.take() {
			Some(batch) => batch,
			None => {
				let Some(scroll_id) = self.scroll_id.clone() else {
					return Ok(None);
				};
				let page = self.engine.scroll(&scroll_id, &self.keep_alive).await?;

				if let Some(next) = page.scroll_id.clone() {
					self.scroll_id = Some(next);
				}

				sources(page)
			},
		};

		if batch.is_empty() {
			self.close().await?;

			return Ok(None);
		}

		Ok(Some(batch))
	}

	pub async fn close(&mut self) -> Result<()> {
		if let Some(scroll_id) = self.scroll_id.take() {
			self.engine.clear_scroll(&scroll_id).await?;
		}

		Ok(())
	}
}

impl Drop for ExportCursor {
	fn drop(&mut self) {
		let Some(scroll_id) = self.scroll_id.take() else {
			return;
		};
		let Ok(handle) = tokio::runtime::Handle::try_current() else {
			tracing::warn!("No runtime to release an abandoned export scroll.");

			return;
		};
		let engine = self.engine.clone();

		handle.spawn(async move {
			if let Err(err) = engine.clear_scroll(&scroll_id).await {
				tracing::warn!(error = %err, "Failed to release export scroll.");
			}
		});
	}
}

fn sources(response: SearchResponse) -> Vec<Value> {
	response.hits.hits.into_iter().map(|hit| hit.source).collect()
}
