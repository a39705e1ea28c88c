//! Pull-based path reader over JSON bytes.
//!
//! A pass follows one pre-split path through the document with a
//! [`DeserializeSeed`] chain: the entry named by the next step is descended
//! into, every other key, value and array element goes through
//! [`IgnoredAny`], so nothing outside the path is ever materialized. The
//! whole document is still consumed, so malformed input anywhere in it is
//! reported.

use super::compare::{Number, Value};
use crate::error::FilterError;
use crate::predicate::Step;
use serde::Deserializer;
use serde::de::{self, DeserializeSeed, Deserialize, IgnoredAny, MapAccess, SeqAccess, Visitor};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum State {
    #[default]
    Pending,
    Missing,
    Null,
    Bool(bool),
    Number(Number),
    /// The text lives in [`Capture::text`].
    Str,
    Composite,
}

/// Per-slot scratch: what a path resolved to in the current document.
#[derive(Debug, Default)]
pub(crate) struct Capture {
    state: State,
    text: String,
}

impl Capture {
    /// Forget the resolution; the string buffer is kept for reuse.
    pub(crate) fn clear(&mut self) {
        self.state = State::Pending;
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.state != State::Pending
    }

    pub(crate) fn value(&self) -> Value<'_> {
        match self.state {
            State::Pending | State::Missing => Value::Missing,
            State::Null => Value::Null,
            State::Bool(b) => Value::Bool(b),
            State::Number(n) => Value::Number(n),
            State::Str => Value::Str(&self.text),
            State::Composite => Value::Composite,
        }
    }
}

/// Resolve `steps` in `document` into `capture`.
pub(crate) fn resolve(document: &[u8], steps: &[Step], capture: &mut Capture) -> serde_json::Result<()> {
    capture.state = State::Missing;
    let mut de = serde_json::Deserializer::from_slice(document);
    PathSeed { steps, capture }.deserialize(&mut de)?;
    de.end()
}

/// Reject documents that are not UTF-8 anywhere. Strings skipped with
/// [`IgnoredAny`] are not checked by the JSON reader.
pub(crate) fn check_utf8(document: &[u8]) -> Result<(), FilterError> {
    std::str::from_utf8(document).map(|_| ()).map_err(|err| {
        FilterError::Decode(format!("invalid UTF-8 at byte {}", err.valid_up_to()))
    })
}

/// Check that `document` is well-formed without capturing anything.
pub(crate) fn validate(document: &[u8]) -> serde_json::Result<()> {
    let mut de = serde_json::Deserializer::from_slice(document);
    IgnoredAny::deserialize(&mut de)?;
    de.end()
}

struct PathSeed<'s> {
    steps: &'s [Step],
    capture: &'s mut Capture,
}

impl<'de> DeserializeSeed<'de> for PathSeed<'_> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl PathSeed<'_> {
    /// Scalars only count when the path ends here; otherwise the path
    /// descends through a scalar and stays missing.
    fn scalar(self, state: State) {
        if self.steps.is_empty() {
            self.capture.state = state;
        }
    }
}

impl<'de> Visitor<'de> for PathSeed<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<(), E>
    where
        E: de::Error,
    {
        self.scalar(State::Bool(v));
        Ok(())
    }

    fn visit_i64<E>(self, v: i64) -> Result<(), E>
    where
        E: de::Error,
    {
        self.scalar(State::Number(Number::Int(v)));
        Ok(())
    }

    fn visit_u64<E>(self, v: u64) -> Result<(), E>
    where
        E: de::Error,
    {
        let number = match i64::try_from(v) {
            Ok(n) => Number::Int(n),
            Err(_) => Number::Float(v as f64),
        };
        self.scalar(State::Number(number));
        Ok(())
    }

    fn visit_f64<E>(self, v: f64) -> Result<(), E>
    where
        E: de::Error,
    {
        self.scalar(State::Number(Number::Float(v)));
        Ok(())
    }

    fn visit_str<E>(self, v: &str) -> Result<(), E>
    where
        E: de::Error,
    {
        if self.steps.is_empty() {
            self.capture.text.clear();
            self.capture.text.push_str(v);
            self.capture.state = State::Str;
        }
        Ok(())
    }

    fn visit_unit<E>(self) -> Result<(), E>
    where
        E: de::Error,
    {
        self.scalar(State::Null);
        Ok(())
    }

    fn visit_map<M>(self, mut map: M) -> Result<(), M::Error>
    where
        M: MapAccess<'de>,
    {
        let PathSeed { steps, capture } = self;
        let key = match steps.split_first() {
            None => {
                capture.state = State::Composite;
                None
            }
            Some((Step::Key(key), _)) => Some(&**key),
            Some((Step::Index(_), _)) => None,
        };

        let mut found = false;
        while let Some(matched) = map.next_key_seed(KeyEq(key))? {
            if matched && !found {
                found = true;
                map.next_value_seed(PathSeed {
                    steps: &steps[1..],
                    capture: &mut *capture,
                })?;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        let PathSeed { steps, capture } = self;
        let index = match steps.split_first() {
            None => {
                capture.state = State::Composite;
                None
            }
            Some((Step::Index(index), _)) => Some(*index),
            Some((Step::Key(_), _)) => None,
        };

        let mut position = 0;
        loop {
            let more = if Some(position) == index {
                seq.next_element_seed(PathSeed {
                    steps: &steps[1..],
                    capture: &mut *capture,
                })?
                .is_some()
            } else {
                seq.next_element::<IgnoredAny>()?.is_some()
            };
            if !more {
                return Ok(());
            }
            position += 1;
        }
    }
}

/// Map key seed: compares the key against the wanted name without
/// allocating. `None` never matches.
struct KeyEq<'k>(Option<&'k str>);

impl<'de> DeserializeSeed<'de> for KeyEq<'_> {
    type Value = bool;

    fn deserialize<D>(self, deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(self)
    }
}

impl<'de> Visitor<'de> for KeyEq<'_> {
    type Value = bool;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string key")
    }

    fn visit_str<E>(self, v: &str) -> Result<bool, E>
    where
        E: de::Error,
    {
        Ok(self.0 == Some(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<Step> {
        names.iter().map(|n| Step::Key((*n).into())).collect()
    }

    fn read<'c>(document: &str, steps: &[Step], capture: &'c mut Capture) -> Value<'c> {
        resolve(document.as_bytes(), steps, capture).unwrap();
        capture.value()
    }

    #[test]
    fn nested_scalars() {
        let doc = r#"{"a": {"b": 10, "c": "text", "d": null, "e": true, "f": 2.5}}"#;
        let mut capture = Capture::default();
        assert_eq!(read(doc, &keys(&["a", "b"]), &mut capture), Value::Number(Number::Int(10)));
        assert_eq!(read(doc, &keys(&["a", "c"]), &mut capture), Value::Str("text"));
        assert_eq!(read(doc, &keys(&["a", "d"]), &mut capture), Value::Null);
        assert_eq!(read(doc, &keys(&["a", "e"]), &mut capture), Value::Bool(true));
        assert_eq!(read(doc, &keys(&["a", "f"]), &mut capture), Value::Number(Number::Float(2.5)));
        assert_eq!(read(doc, &keys(&["a"]), &mut capture), Value::Composite);
    }

    #[test]
    fn absent_paths() {
        let doc = r#"{"a": {"b": 1}, "s": "x", "arr": [1, 2]}"#;
        let mut capture = Capture::default();
        assert_eq!(read(doc, &keys(&["z"]), &mut capture), Value::Missing);
        assert_eq!(read(doc, &keys(&["a", "z"]), &mut capture), Value::Missing);
        assert_eq!(read(doc, &keys(&["s", "x"]), &mut capture), Value::Missing);
        assert_eq!(read(doc, &keys(&["arr", "x"]), &mut capture), Value::Missing);
        let steps = vec![Step::Key("arr".into()), Step::Index(5)];
        assert_eq!(read(doc, &steps, &mut capture), Value::Missing);
        let steps = vec![Step::Key("a".into()), Step::Index(0)];
        assert_eq!(read(doc, &steps, &mut capture), Value::Missing);
    }

    #[test]
    fn array_indices() {
        let doc = r#"{"m": [[1, 2], [3, {"k": "deep"}]], "1DarrayPath": ["arrayVal0", "arrayVal1"]}"#;
        let mut capture = Capture::default();
        let steps = vec![Step::Key("m".into()), Step::Index(1), Step::Index(1), Step::Key("k".into())];
        assert_eq!(read(doc, &steps, &mut capture), Value::Str("deep"));
        let steps = vec![Step::Key("1DarrayPath".into()), Step::Index(1)];
        assert_eq!(read(doc, &steps, &mut capture), Value::Str("arrayVal1"));
    }

    #[test]
    fn dotted_key_is_one_step() {
        let doc = r#"{"onePath": {"Only": 1}, "onePath.Only": -2}"#;
        let mut capture = Capture::default();
        assert_eq!(read(doc, &keys(&["onePath.Only"]), &mut capture), Value::Number(Number::Int(-2)));
    }

    #[test]
    fn escaped_strings_and_keys() {
        let doc = r#"{"k\"ey": "a\nbA"}"#;
        let mut capture = Capture::default();
        assert_eq!(read(doc, &keys(&["k\"ey"]), &mut capture), Value::Str("a\nbA"));
    }

    #[test]
    fn first_duplicate_wins() {
        let doc = r#"{"a": 1, "a": 2}"#;
        let mut capture = Capture::default();
        assert_eq!(read(doc, &keys(&["a"]), &mut capture), Value::Number(Number::Int(1)));
    }

    #[test]
    fn huge_unsigned_becomes_float() {
        let doc = r#"{"n": 18446744073709551615}"#;
        let mut capture = Capture::default();
        assert_eq!(
            read(doc, &keys(&["n"]), &mut capture),
            Value::Number(Number::Float(u64::MAX as f64))
        );
    }

    #[test]
    fn malformed_documents_fail() {
        let mut capture = Capture::default();
        for doc in [r#"{"a": 1"#, r#"{"a": 1} x"#, r#"{"b": [1,}"#, "", "{'a': 1}"] {
            assert!(resolve(doc.as_bytes(), &keys(&["a"]), &mut capture).is_err(), "{doc}");
            assert!(validate(doc.as_bytes()).is_err(), "{doc}");
        }
    }

    #[test]
    fn malformed_tail_after_match_fails() {
        let mut capture = Capture::default();
        assert!(resolve(br#"{"a": 1, "b": [}"#, &keys(&["a"]), &mut capture).is_err());
    }

    #[test]
    fn clear_keeps_buffer() {
        let mut capture = Capture::default();
        resolve(br#"{"a": "some text"}"#, &keys(&["a"]), &mut capture).unwrap();
        let cap = capture.text.capacity();
        capture.clear();
        assert!(!capture.is_resolved());
        assert_eq!(capture.value(), Value::Missing);
        assert_eq!(capture.text.capacity(), cap);
    }
}
