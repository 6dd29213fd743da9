//! Tolerant field readers for store documents.
//!
//! Documents written by older dashboards store numbers as strings, flags
//! as "SIM"/"NAO" and timestamps in assorted shapes. Every reader here
//! accepts any JSON value and falls back to a neutral default.

use crate::coerce;
use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use std::fmt;

/// Any scalar, with containers collapsed to `Null`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Loose {
    Null,
    Bool(bool),
    Num(f64),
    Text(String),
}

struct LooseVisitor;

impl<'de> Visitor<'de> for LooseVisitor {
    type Value = Loose;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Loose, E> {
        Ok(Loose::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Loose, E> {
        Ok(Loose::Num(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Loose, E> {
        Ok(Loose::Num(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Loose, E> {
        Ok(Loose::Num(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Loose, E> {
        Ok(Loose::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Loose, E> {
        Ok(Loose::Text(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Loose, E> {
        Ok(Loose::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Loose, E> {
        Ok(Loose::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Loose, D::Error> {
        d.deserialize_any(LooseVisitor)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Loose, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Loose::Null)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Loose, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(Loose::Null)
    }
}

impl<'de> Deserialize<'de> for Loose {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_any(LooseVisitor)
    }
}

impl Loose {
    pub(crate) fn into_number(self) -> f64 {
        match self {
            Loose::Num(n) => coerce::finite(n),
            Loose::Text(s) => coerce::number(&s),
            Loose::Bool(b) => f64::from(u8::from(b)),
            Loose::Null => 0.0,
        }
    }

    pub(crate) fn into_text(self) -> String {
        match self {
            Loose::Text(s) => s,
            Loose::Num(n) => n.to_string(),
            Loose::Bool(b) => b.to_string(),
            Loose::Null => String::new(),
        }
    }
}

pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Loose::deserialize(d)?.into_number())
}

pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    Ok(coerce::count(number(d)?))
}

pub fn turn<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(u32::try_from(count(d)?).unwrap_or(u32::MAX))
}

pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Loose::deserialize(d)?.into_text())
}

pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Loose::deserialize(d)? {
        Loose::Bool(b) => b,
        Loose::Num(n) => n != 0.0,
        Loose::Text(s) => coerce::flag(&s),
        Loose::Null => false,
    })
}

/// Optional identifier; blank strings count as absent.
pub fn optional_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let id = Loose::deserialize(d)?.into_text();
    let id = id.trim();
    Ok(if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    })
}

/// RFC 3339 timestamps; anything unreadable is treated as absent.
pub fn timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    Ok(match Loose::deserialize(d)? {
        Loose::Text(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "number")]
        n: f64,
        #[serde(default, deserialize_with = "flag")]
        f: bool,
        #[serde(default, deserialize_with = "optional_id")]
        id: Option<String>,
        #[serde(default, deserialize_with = "timestamp")]
        at: Option<DateTime<Utc>>,
    }

    fn probe(v: serde_json::Value) -> Probe {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn numbers_from_any_shape() {
        assert_eq!(probe(json!({"n": 12})).n, 12.0);
        assert_eq!(probe(json!({"n": "1.234,5"})).n, 1234.5);
        assert_eq!(probe(json!({"n": null})).n, 0.0);
        assert_eq!(probe(json!({"n": [1, 2]})).n, 0.0);
        assert_eq!(probe(json!({"n": {"seconds": 5}})).n, 0.0);
        assert_eq!(probe(json!({})).n, 0.0);
    }

    #[test]
    fn flags_and_ids() {
        assert!(probe(json!({"f": "SIM"})).f);
        assert!(probe(json!({"f": true})).f);
        assert!(!probe(json!({"f": "NAO"})).f);
        assert_eq!(probe(json!({"id": "  "})).id, None);
        assert_eq!(probe(json!({"id": "uid-1"})).id.as_deref(), Some("uid-1"));
        assert_eq!(probe(json!({"id": null})).id, None);
    }

    #[test]
    fn timestamps() {
        let p = probe(json!({"at": "2025-03-01T12:00:00Z"}));
        assert!(p.at.is_some());
        assert!(probe(json!({"at": {"seconds": 1}})).at.is_none());
        assert!(probe(json!({"at": "yesterday"})).at.is_none());
    }
}
