pub mod response;

mod error;

pub use error::{Error, Result};
pub use response::{CountResponse, DocumentResponse, Hit, Hits, HitsTotal, SearchResponse};

use std::{future::Future, pin::Pin, time::Duration};

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Engine operations the search core depends on.
pub trait SearchEngine
where
	Self: Send + Sync,
{
	fn search<'a>(&'a self, body: &'a Value) -> BoxFuture<'a, Result<SearchResponse>>;

	fn count<'a>(&'a self, body: &'a Value) -> BoxFuture<'a, Result<u64>>;

	fn open_scroll<'a>(
		&'a self,
		body: &'a Value,
		keep_alive: &'a str,
	) -> BoxFuture<'a, Result<SearchResponse>>;

	fn scroll<'a>(
		&'a self,
		scroll_id: &'a str,
		keep_alive: &'a str,
	) -> BoxFuture<'a, Result<SearchResponse>>;

	fn clear_scroll<'a>(&'a self, scroll_id: &'a str) -> BoxFuture<'a, Result<()>>;

	fn get_document<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<Value>>>;
}

/// HTTP handle to the search engine.
///
/// Built once at startup and shared by every request; dropping it closes the connection pool.
#[derive(Debug, Clone)]
pub struct EngineClient {
	client: Client,
	base_url: String,
	index: String,
	credentials: Option<(String, String)>,
}
impl EngineClient {
	pub fn new(cfg: &ccdb_config::Engine) -> Result<Self> {
		if cfg.index.contains('/') {
			return Err(Error::InvalidConfig {
				message: "engine.index must not contain '/'.".to_string(),
			});
		}

		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
		let credentials = match (&cfg.username, &cfg.password) {
			(Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
			_ => None,
		};

		Ok(Self {
			client,
			base_url: cfg.url.trim_end_matches('/').to_string(),
			index: cfg.index.clone(),
			credentials,
		})
	}

	pub fn index(&self) -> &str {
		&self.index
	}

	pub async fn search(&self, body: &Value) -> Result<SearchResponse> {
		let url = self.index_url("_search");

		self.send_json(self.request(Method::POST, url).json(body)).await
	}

	pub async fn count(&self, body: &Value) -> Result<u64> {
		let url = self.index_url("_count");
		let res: CountResponse = self.send_json(self.request(Method::POST, url).json(body)).await?;

		Ok(res.count)
	}

	/// Opens a scroll context and returns its first batch.
	pub async fn open_scroll(&self, body: &Value, keep_alive: &str) -> Result<SearchResponse> {
		let url = self.index_url("_search");
		let req = self.request(Method::POST, url).query(&[("scroll", keep_alive)]).json(body);

		self.send_json(req).await
	}

	pub async fn scroll(&self, scroll_id: &str, keep_alive: &str) -> Result<SearchResponse> {
		let url = format!("{}/_search/scroll", self.base_url);
		let body = serde_json::json!({ "scroll": keep_alive, "scroll_id": scroll_id });

		self.send_json(self.request(Method::POST, url).json(&body)).await
	}

	pub async fn clear_scroll(&self, scroll_id: &str) -> Result<()> {
		let url = format!("{}/_search/scroll", self.base_url);
		let body = serde_json::json!({ "scroll_id": [scroll_id] });
		let res = self.request(Method::DELETE, url).json(&body).send().await?;

		// An expired context is already released.
		if res.status() == StatusCode::NOT_FOUND {
			return Ok(());
		}

		res.error_for_status()?;

		Ok(())
	}

	pub async fn get_document(&self, id: &str) -> Result<Option<Value>> {
		if id.is_empty() || !id.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-') {
			return Ok(None);
		}

		let url = self.index_url(&format!("_doc/{id}"));
		let res = self.request(Method::GET, url).send().await?;

		if res.status() == StatusCode::NOT_FOUND {
			return Ok(None);
		}

		let doc: DocumentResponse = res.error_for_status()?.json().await?;

		Ok(doc.source.filter(|_| doc.found))
	}

	pub(crate) fn index_url(&self, path: &str) -> String {
		format!("{}/{}/{}", self.base_url, self.index, path)
	}

	fn request(&self, method: Method, url: String) -> RequestBuilder {
		tracing::debug!(%method, %url, "Engine request.");

		let req = self.client.request(method, url);

		match &self.credentials {
			Some((user, pass)) => req.basic_auth(user, Some(pass)),
			None => req,
		}
	}

	async fn send_json<T>(&self, req: RequestBuilder) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let res = req.send().await?;
		let status = res.status();

		if status.is_server_error() {
			return Err(Error::Unavailable {
				message: format!("Engine responded with {status}."),
			});
		}

		let bytes = res.error_for_status()?.bytes().await?;

		serde_json::from_slice(&bytes).map_err(|err| Error::InvalidResponse {
			message: format!("Engine returned an unexpected payload: {err}."),
		})
	}
}

impl SearchEngine for EngineClient {
	fn search<'a>(&'a self, body: &'a Value) -> BoxFuture<'a, Result<SearchResponse>> {
		Box::pin(EngineClient::search(self, body))
	}

	fn count<'a>(&'a self, body: &'a Value) -> BoxFuture<'a, Result<u64>> {
		Box::pin(EngineClient::count(self, body))
	}

	fn open_scroll<'a>(
		&'a self,
		body: &'a Value,
		keep_alive: &'a str,
	) -> BoxFuture<'a, Result<SearchResponse>> {
		Box::pin(EngineClient::open_scroll(self, body, keep_alive))
	}

	fn scroll<'a>(
		&'a self,
		scroll_id: &'a str,
		keep_alive: &'a str,
	) -> BoxFuture<'a, Result<SearchResponse>> {
		Box::pin(EngineClient::scroll(self, scroll_id, keep_alive))
	}

	fn clear_scroll<'a>(&'a self, scroll_id: &'a str) -> BoxFuture<'a, Result<()>> {
		Box::pin(EngineClient::clear_scroll(self, scroll_id))
	}

	fn get_document<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
		Box::pin(EngineClient::get_document(self, id))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn engine_cfg(url: &str) -> ccdb_config::Engine {
		ccdb_config::Engine {
			url: url.to_string(),
			index: "complaint-public".to_string(),
			timeout_ms: 1_000,
			username: None,
			password: None,
		}
	}

	#[test]
	fn composes_index_scoped_urls() {
		let client = EngineClient::new(&engine_cfg("http://127.0.0.1:9200/")).expect("client");

		assert_eq!(client.index_url("_search"), "http://127.0.0.1:9200/complaint-public/_search");
		assert_eq!(client.index(), "complaint-public");
	}

	#[test]
	fn rejects_index_with_path_separator() {
		let mut cfg = engine_cfg("http://127.0.0.1:9200");

		cfg.index = "a/b".to_string();

		assert!(matches!(EngineClient::new(&cfg), Err(Error::InvalidConfig { .. })));
	}
}
