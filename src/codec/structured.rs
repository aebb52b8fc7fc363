//! Structured codecs
//!
//! Sequences, maps and records are stored as `JSON:` + serde_json text.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::ops::{Deref, DerefMut};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{structured_payload, CacheDecode, CacheEncode, JSON_MARKER};
use crate::error::Result;

/// Wrapper routing any serde record through the structured encoding
///
/// ```
/// use dalkit::codec::{self, Json};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct User { id: u64, name: String }
///
/// let raw = codec::encode(&Json(User { id: 1, name: "ann".into() })).unwrap();
/// assert_eq!(raw, r#"JSON:{"id":1,"name":"ann"}"#);
///
/// let Json(user) = codec::decode::<Json<User>>(&raw).unwrap();
/// assert_eq!(user.name, "ann");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Unwrap the inner value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Json<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

/// Serialize with the structured marker
fn to_marked<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    Ok(format!("{}{}", JSON_MARKER, json))
}

/// Deserialize marked text, or unmarked text as plain JSON
fn from_structured<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let json = structured_payload(raw).unwrap_or(raw);
    Ok(serde_json::from_str(json)?)
}

impl<T: Serialize> CacheEncode for Json<T> {
    fn encode(&self) -> Result<String> {
        to_marked(&self.0)
    }
}

impl<T: DeserializeOwned> CacheDecode for Json<T> {
    fn decode(raw: &str) -> Result<Self> {
        from_structured(raw).map(Json)
    }
}

impl CacheEncode for serde_json::Value {
    fn encode(&self) -> Result<String> {
        to_marked(self)
    }
}

impl CacheDecode for serde_json::Value {
    fn decode(raw: &str) -> Result<Self> {
        from_structured(raw)
    }
}

impl<T: Serialize> CacheEncode for [T] {
    fn encode(&self) -> Result<String> {
        to_marked(self)
    }
}

impl<T: Serialize> CacheEncode for Vec<T> {
    fn encode(&self) -> Result<String> {
        to_marked(self)
    }
}

impl<T: DeserializeOwned> CacheDecode for Vec<T> {
    fn decode(raw: &str) -> Result<Self> {
        from_structured(raw)
    }
}

impl<K, V> CacheEncode for HashMap<K, V>
where
    K: Serialize + Eq + Hash,
    V: Serialize,
{
    fn encode(&self) -> Result<String> {
        to_marked(self)
    }
}

impl<K, V> CacheDecode for HashMap<K, V>
where
    K: DeserializeOwned + Eq + Hash,
    V: DeserializeOwned,
{
    fn decode(raw: &str) -> Result<Self> {
        from_structured(raw)
    }
}

impl<K: Serialize + Ord, V: Serialize> CacheEncode for BTreeMap<K, V> {
    fn encode(&self) -> Result<String> {
        to_marked(self)
    }
}

impl<K: DeserializeOwned + Ord, V: DeserializeOwned> CacheDecode for BTreeMap<K, V> {
    fn decode(raw: &str) -> Result<Self> {
        from_structured(raw)
    }
}
