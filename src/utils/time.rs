//! Serde helpers for `Option<OffsetDateTime>` fields.
//!
//! Entity fields are written through their serde representation, and the
//! default `time` encoding is a tuple that PostgreSQL cannot cast. These helpers
//! use RFC 3339 strings instead, which cast cleanly to `TIMESTAMPTZ`.
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! struct Account {
//!     #[serde(
//!         serialize_with = "serialize_offset_date_time",
//!         deserialize_with = "deserialize_offset_date_time"
//!     )]
//!     created_at: Option<OffsetDateTime>,
//! }
//! ```

use serde::{self, Deserialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub fn serialize_offset_date_time<S>(
    date_time: &Option<OffsetDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match date_time {
        Some(dt) => {
            serializer.serialize_str(&dt.format(&Rfc3339).map_err(serde::ser::Error::custom)?)
        }
        None => serializer.serialize_none(),
    }
}

pub fn deserialize_offset_date_time<'de, D>(
    deserializer: D,
) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) => Ok(Some(
            OffsetDateTime::parse(&s, &Rfc3339).map_err(serde::de::Error::custom)?,
        )),
        None => Ok(None),
    }
}
