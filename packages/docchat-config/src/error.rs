use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read docchat config at {path:?}.")]
	ReadConfig { path: PathBuf, source: std::io::Error },
	/// `path` is `None` when the TOML came from a string rather than a file.
	#[error("Failed to parse docchat config from {}.", origin(.path))]
	ParseConfig { path: Option<PathBuf>, source: toml::de::Error },
	#[error("Invalid docchat config: {message}")]
	Validation { message: String },
}

fn origin(path: &Option<PathBuf>) -> String {
	match path {
		Some(path) => format!("{path:?}"),
		None => "inline TOML".to_string(),
	}
}
