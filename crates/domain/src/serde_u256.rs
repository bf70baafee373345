//! Serde adapter writing `U256` values as decimal strings.
//!
//! `primitive_types` serializes as `0x`-prefixed hex; the wire format of the
//! exchange uses decimal-string integers instead. Deserialization also
//! accepts plain JSON integers for convenience.

use primitive_types::U256;
use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;

pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    deserializer.deserialize_any(DecimalVisitor)
}

struct DecimalVisitor;

impl Visitor<'_> for DecimalVisitor {
    type Value = U256;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative decimal integer string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<U256, E> {
        parse_decimal(v).ok_or_else(|| E::custom(format!("invalid decimal integer '{v}'")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<U256, E> {
        Ok(U256::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<U256, E> {
        Ok(U256::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<U256, E> {
        u64::try_from(v)
            .map(U256::from)
            .map_err(|_| E::custom("negative amounts are not allowed"))
    }
}

/// Parses an ASCII decimal integer; rejects signs, whitespace and empty input.
pub(crate) fn parse_decimal(v: &str) -> Option<U256> {
    if v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    U256::from_dec_str(v).ok()
}
