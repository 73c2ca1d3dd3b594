use reqwest::header::{InvalidHeaderName, InvalidHeaderValue};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Provider request failed: {0}")]
	Request(#[from] reqwest::Error),
	#[error("Invalid provider header name: {0}")]
	HeaderName(#[from] InvalidHeaderName),
	#[error("Invalid provider header value: {0}")]
	HeaderValue(#[from] InvalidHeaderValue),
	#[error("Invalid provider config: {message}")]
	InvalidConfig { message: String },
	#[error("Unexpected provider response: {message}")]
	InvalidResponse { message: String },
}
