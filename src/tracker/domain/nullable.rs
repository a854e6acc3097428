//! Serde support for payload fields that distinguish "absent" from "null".

use serde::{Deserialize, Deserializer};

/// Deserializes a present field into `Some(value)`, keeping an explicit
/// `null` as `Some(None)`.
///
/// Pair with `#[serde(default)]` so that an absent field stays `None`.
pub(crate) fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
