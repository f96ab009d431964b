//! Streaming JSON and CSV encoders for export cursors.

use std::io;

use axum::{
	body::Body,
	http::{HeaderValue, header},
	response::{IntoResponse, Response},
};
use serde_json::Value;

use ccdb_service::{ExportCursor, ExportFormat, export::EXPORT_COLUMNS};

struct ExportState {
	cursor: ExportCursor,
	started: bool,
	finished: bool,
}

/// Streams the cursor as an attachment, one encoded chunk per scroll batch.
pub fn response(cursor: ExportCursor) -> Response {
	let format = cursor.format();
	let state = ExportState { cursor, started: false, finished: false };
	let stream = futures::stream::unfold(state, move |mut state| async move {
		if state.finished {
			return None;
		}

		let chunk = match state.cursor.next_batch().await {
			Ok(Some(batch)) => {
				let chunk = encode_batch(format, &batch, !state.started);

				state.started = true;

				chunk
			},
			Ok(None) => {
				state.finished = true;

				Ok(closing(format, state.started))
			},
			Err(err) => {
				tracing::error!(error = %err, "Export batch failed.");

				state.finished = true;

				Err(io::Error::other(err.to_string()))
			},
		};

		Some((chunk, state))
	});
	let disposition = format!("attachment; filename=\"complaints.{}\"", format.extension());
	let mut response = Body::from_stream(stream).into_response();
	let headers = response.headers_mut();

	headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(format.content_type()));

	if let Ok(value) = HeaderValue::from_str(&disposition) {
		headers.insert(header::CONTENT_DISPOSITION, value);
	}

	response
}

fn encode_batch(format: ExportFormat, batch: &[Value], first: bool) -> io::Result<Vec<u8>> {
	match format {
		ExportFormat::Json => {
			let mut out = Vec::new();

			for (i, document) in batch.iter().enumerate() {
				out.push(if first && i == 0 { b'[' } else { b',' });
				serde_json::to_writer(&mut out, document)?;
			}

			Ok(out)
		},
		ExportFormat::Csv => {
			let mut writer = csv::Writer::from_writer(Vec::new());

			if first {
				writer.write_record(EXPORT_COLUMNS).map_err(io::Error::other)?;
			}

			for document in batch {
				writer
					.write_record(EXPORT_COLUMNS.iter().map(|column| cell(document.get(*column))))
					.map_err(io::Error::other)?;
			}

			writer.into_inner().map_err(|err| io::Error::other(err.to_string()))
		},
	}
}

/// Trailing bytes once the cursor is exhausted.
fn closing(format: ExportFormat, started: bool) -> Vec<u8> {
	match (format, started) {
		(ExportFormat::Json, true) => b"]".to_vec(),
		(ExportFormat::Json, false) => b"[]".to_vec(),
		(ExportFormat::Csv, true) => Vec::new(),
		(ExportFormat::Csv, false) => {
			let header = EXPORT_COLUMNS.join(",");

			format!("{header}\n").into_bytes()
		},
	}
}

fn cell(value: Option<&Value>) -> String {
	match value {
		None | Some(Value::Null) => String::new(),
		Some(Value::String(text)) => text.clone(),
		Some(Value::Array(items)) =>
			items.iter().map(|item| cell(Some(item))).collect::<Vec<_>>().join(", "),
		Some(other) => other.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn json_batches_form_one_array() {
		let first = encode_batch(
			ExportFormat::Json,
			&[serde_json::json!({ "a": 1 }), serde_json::json!({ "a": 2 })],
			true,
		)
		.expect("encode");
		let second =
			encode_batch(ExportFormat::Json, &[serde_json::json!({ "a": 3 })], false).expect("encode");
		let mut body = first;

		body.extend(second);
		body.extend(closing(ExportFormat::Json, true));

		let parsed: Value = serde_json::from_slice(&body).expect("valid json");

		assert_eq!(parsed, serde_json::json!([{ "a": 1 }, { "a": 2 }, { "a": 3 }]));
		assert_eq!(closing(ExportFormat::Json, false), b"[]".to_vec());
	}

	#[test]
	fn csv_rows_follow_export_columns() {
		let document = serde_json::json!({
			"complaint_id": "3021",
			"tags": ["Older American", "Servicemember"],
			"company": "Acme, Inc.",
			"state": null,
		});
		let out = encode_batch(ExportFormat::Csv, &[document], true).expect("encode");
		let text = String::from_utf8(out).expect("utf8");
		let mut lines = text.lines();

		assert_eq!(lines.next(), Some(EXPORT_COLUMNS.join(",").as_str()));

		let row = lines.next().expect("row");

		assert!(row.ends_with(",3021"));
		assert!(row.contains("\"Acme, Inc.\""));
		assert!(row.contains("\"Older American, Servicemember\""));
	}
}
