use std::sync::Arc;

use ccdb_engine::EngineClient;
use ccdb_service::CcdbService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<CcdbService>,
}
impl AppState {
	/// Connects the engine client described by `config.engine`.
	pub fn new(config: ccdb_config::Config) -> color_eyre::Result<Self> {
		let engine = EngineClient::new(&config.engine)?;
		let service = CcdbService::new(config, Arc::new(engine));

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: CcdbService) -> Self {
		Self { service: Arc::new(service) }
	}
}
