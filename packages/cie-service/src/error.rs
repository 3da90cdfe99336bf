pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Configuration error: {message}")]
	Config { message: String },
	#[error("Retrieval error: {message}")]
	Retrieval { message: String },
}
impl From<cie_providers::Error> for Error {
	fn from(err: cie_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<cie_storage::Error> for Error {
	fn from(err: cie_storage::Error) -> Self {
		match err {
			cie_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			cie_storage::Error::Qdrant(inner) => Self::Retrieval { message: inner.to_string() },
		}
	}
}
