//! Scalar codecs
//!
//! Text, integers, floats and booleans are stored as their plain textual
//! form. Integer parsing respects the destination's bit width.

use serde::de::DeserializeOwned;

use super::{structured_payload, CacheDecode, CacheEncode};
use crate::error::{DalError, Result};

/// Literals accepted as `true` before falling back to the generic parser
const TRUTHY: [&str; 7] = ["true", "1", "True", "TRUE", "yes", "Yes", "YES"];

/// Literals accepted as `false` before falling back to the generic parser
const FALSY: [&str; 7] = ["false", "0", "False", "FALSE", "no", "No", "NO"];

/// Deserialize a marked payload into a scalar destination
fn from_marked<T: DeserializeOwned>(json: &str) -> Result<T> {
    Ok(serde_json::from_str(json)?)
}

fn parse_error(raw: &str, kind: &str, err: impl std::fmt::Display) -> DalError {
    DalError::Format(format!("cannot convert {:?} to {}: {}", raw, kind, err))
}

// =============================================================================
// Text
// =============================================================================

impl CacheEncode for str {
    fn encode(&self) -> Result<String> {
        Ok(self.to_string())
    }
}

impl CacheEncode for String {
    fn encode(&self) -> Result<String> {
        Ok(self.clone())
    }
}

impl CacheDecode for String {
    fn decode(raw: &str) -> Result<Self> {
        if let Some(json) = structured_payload(raw) {
            return from_marked(json);
        }
        Ok(raw.to_string())
    }
}

// =============================================================================
// Numbers
// =============================================================================

macro_rules! impl_numeric_codec {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CacheEncode for $ty {
                fn encode(&self) -> Result<String> {
                    Ok(self.to_string())
                }
            }

            impl CacheDecode for $ty {
                fn decode(raw: &str) -> Result<Self> {
                    if let Some(json) = structured_payload(raw) {
                        return from_marked(json);
                    }
                    raw.parse::<$ty>()
                        .map_err(|e| parse_error(raw, stringify!($ty), e))
                }
            }
        )*
    };
}

impl_numeric_codec!(i8, i16, i32, i64, i128, isize);
impl_numeric_codec!(u8, u16, u32, u64, u128, usize);
// Display for floats is the shortest text that parses back to the same value
impl_numeric_codec!(f32, f64);

// =============================================================================
// Booleans
// =============================================================================

impl CacheEncode for bool {
    fn encode(&self) -> Result<String> {
        Ok(if *self { "true" } else { "false" }.to_string())
    }
}

impl CacheDecode for bool {
    fn decode(raw: &str) -> Result<Self> {
        if let Some(json) = structured_payload(raw) {
            return from_marked(json);
        }
        if TRUTHY.contains(&raw) {
            return Ok(true);
        }
        if FALSY.contains(&raw) {
            return Ok(false);
        }
        parse_bool(raw).ok_or_else(|| parse_error(raw, "bool", "invalid syntax"))
    }
}

/// Generic boolean parser for inputs outside the literal sets
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "t" | "T" => Some(true),
        "f" | "F" => Some(false),
        _ => None,
    }
}
