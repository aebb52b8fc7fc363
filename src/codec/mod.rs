//! Value Codec Module
//!
//! Converts typed values to and from the single string representation kept
//! in a string-keyed store.
//!
//! ## Representation
//! ```text
//! scalar      →  "42" | "-1.5" | "true" | "plain text"
//! structured  →  "JSON:" + serde_json text
//! nil / None  →  ""
//! ```
//!
//! The `JSON:` marker is checked first on decode, for every destination
//! type. Unmarked text is parsed according to the destination's own kind.
//!
//! ## Supported kinds
//! - Text: `String`, `str`
//! - Integers: `i8`..`i128`, `u8`..`u128`, `isize`, `usize`
//! - Floats: `f32`, `f64`
//! - Booleans
//! - Structured: `Vec<T>`, slices, `HashMap`, `BTreeMap`, `serde_json::Value`,
//!   and any serde record wrapped in [`Json`]
//! - `Option<T>` of any of the above

mod scalar;
mod structured;

pub use structured::Json;

use crate::error::Result;

/// Prefix tagging a structured (JSON) payload
pub const JSON_MARKER: &str = "JSON:";

/// Types that can be written into the store
pub trait CacheEncode {
    /// Produce the stored representation
    fn encode(&self) -> Result<String>;
}

/// Types that can be read back from the store
pub trait CacheDecode: Sized {
    /// Parse a stored representation
    fn decode(raw: &str) -> Result<Self>;
}

impl<T: CacheEncode + ?Sized> CacheEncode for &T {
    fn encode(&self) -> Result<String> {
        (**self).encode()
    }
}

impl<T: CacheEncode + ?Sized> CacheEncode for Box<T> {
    fn encode(&self) -> Result<String> {
        (**self).encode()
    }
}

impl<T: CacheEncode> CacheEncode for Option<T> {
    fn encode(&self) -> Result<String> {
        match self {
            Some(value) => value.encode(),
            None => Ok(String::new()),
        }
    }
}

impl<T: CacheDecode> CacheDecode for Option<T> {
    fn decode(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Ok(None);
        }
        T::decode(raw).map(Some)
    }
}

/// Encode a value into its stored representation
pub fn encode<T: CacheEncode + ?Sized>(value: &T) -> Result<String> {
    value.encode()
}

/// Decode a stored representation into `T`
pub fn decode<T: CacheDecode>(raw: &str) -> Result<T> {
    T::decode(raw)
}

/// Strip the structured marker, if present
pub(crate) fn structured_payload(raw: &str) -> Option<&str> {
    raw.strip_prefix(JSON_MARKER)
}
