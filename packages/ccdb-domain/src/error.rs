pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("Invalid value for {field}: {message}")]
	InvalidParameter { field: String, message: String },
}
impl Error {
	pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidParameter { field: field.into(), message: message.into() }
	}
}
