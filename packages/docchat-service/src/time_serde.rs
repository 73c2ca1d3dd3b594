//! RFC 3339 wire format for optional document timestamps.

use serde::{Deserialize, Deserializer, Serializer, de::Error as _, ser::Error as _};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let Some(value) = value else {
		return serializer.serialize_none();
	};
	let formatted = value.format(&Rfc3339).map_err(S::Error::custom)?;

	serializer.serialize_str(&formatted)
}

/// Accepts `null`, a blank string (documents uploaded without a date), or an RFC 3339 timestamp.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
	D: Deserializer<'de>,
{
	Option::<String>::deserialize(deserializer)?
		.filter(|raw| !raw.trim().is_empty())
		.map(|raw| OffsetDateTime::parse(raw.trim(), &Rfc3339).map_err(D::Error::custom))
		.transpose()
}
