pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid value for {field}: {message}")]
	InvalidFilter { field: String, message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Search engine unavailable: {message}")]
	EngineUnavailable { message: String },
	#[error("Internal error: {message}")]
	Internal { message: String },
}
impl From<ccdb_domain::Error> for Error {
	fn from(err: ccdb_domain::Error) -> Self {
		match err {
			ccdb_domain::Error::InvalidParameter { field, message } =>
				Self::InvalidFilter { field, message },
		}
	}
}

impl From<ccdb_engine::Error> for Error {
	fn from(err: ccdb_engine::Error) -> Self {
		match err {
			ccdb_engine::Error::Reqwest(inner) =>
				Self::EngineUnavailable { message: inner.to_string() },
			ccdb_engine::Error::Unavailable { message } => Self::EngineUnavailable { message },
			other => Self::Internal { message: other.to_string() },
		}
	}
}
