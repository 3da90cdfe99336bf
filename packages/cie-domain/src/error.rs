pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read hierarchy file at {path:?}.")]
	ReadHierarchy { path: std::path::PathBuf, source: std::io::Error },
	#[error("Failed to parse hierarchy document.")]
	ParseHierarchy { source: serde_json::Error },
	#[error("Duplicate classification code {code:?} in hierarchy.")]
	DuplicateCode { code: String },
	#[error("Empty classification code under {parent:?}.")]
	EmptyCode { parent: String },
	#[error("Invalid synonym pattern {pattern:?}.")]
	InvalidPattern { pattern: String, source: Box<regex::Error> },
}
