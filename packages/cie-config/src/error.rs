use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Cannot read CIE config {path:?}: {source}")]
	Unreadable { path: PathBuf, source: std::io::Error },
	#[error("CIE config {path:?} is not valid TOML: {source}")]
	Malformed { path: PathBuf, source: toml::de::Error },
	/// A `[[normalizer.synonyms]]` pattern the regex engine refuses.
	#[error("normalizer.synonyms.pattern {pattern:?} is invalid: {source}")]
	SynonymPattern { pattern: String, source: regex::Error },
	#[error("{message}")]
	Validation { message: String },
}
