//! Deserializers that accept the shapes older stats files used for "nothing":
//! `null`, `[]` and `{}` all mean an empty map, list or record.

use std::collections::BTreeMap;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<V> {
    Value(V),
    List(Vec<IgnoredAny>),
    Object(BTreeMap<String, IgnoredAny>),
}

impl<V: Default> Lenient<V> {
    fn into_value<E: serde::de::Error>(self) -> Result<V, E> {
        match self {
            Lenient::Value(v) => Ok(v),
            Lenient::List(items) if items.is_empty() => Ok(V::default()),
            Lenient::Object(fields) if fields.is_empty() => Ok(V::default()),
            Lenient::List(items) => Err(E::invalid_length(items.len(), &"an empty list")),
            Lenient::Object(_) => Err(E::custom("unexpected object")),
        }
    }
}

/// Map keyed by name or timestamp whose values may themselves be empty placeholders.
pub(crate) fn map<'de, D, V>(deserializer: D) -> Result<BTreeMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de> + Default,
{
    let raw: Option<Lenient<BTreeMap<String, Lenient<V>>>> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(BTreeMap::new());
    };
    raw.into_value::<D::Error>()?
        .into_iter()
        .map(|(key, value)| Ok((key, value.into_value::<D::Error>()?)))
        .collect()
}

/// List that may be stored as `null` or `{}`.
pub(crate) fn list<'de, D, V>(deserializer: D) -> Result<Vec<V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    let raw: Option<Lenient<Vec<V>>> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(Vec::new()),
        Some(raw) => raw.into_value(),
    }
}
