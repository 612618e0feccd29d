//! Structural equality over JSON-like values.
//!
//! Derived `PartialEq` is stricter than what the diff needs: `1` and `1.0`
//! are different `serde_json::Number`s but the same JSON number, and `NaN`
//! never equals itself. [`DeepEq`] compares by value with numeric
//! coercion and treats two `NaN`s as equal.

use std::collections::BTreeMap;

use blockpatch_types::{RunKind, StyledRun, TextStyles};
use serde_json::{Map, Number, Value};

/// Structural equality.
pub trait DeepEq {
    fn deep_eq(&self, other: &Self) -> bool;
}

/// Compare two values structurally, short-circuiting on identity.
pub fn deep_equal<T: DeepEq + ?Sized>(a: &T, b: &T) -> bool {
    std::ptr::eq(a, b) || a.deep_eq(b)
}

macro_rules! exact_deep_eq {
    ($($t:ty),* $(,)?) => {
        $(
            impl DeepEq for $t {
                fn deep_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

exact_deep_eq!(bool, str, String, i64, u64, usize, RunKind);

impl DeepEq for f64 {
    fn deep_eq(&self, other: &Self) -> bool {
        self == other || (self.is_nan() && other.is_nan())
    }
}

impl DeepEq for Number {
    fn deep_eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.as_i64(), other.as_i64()) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (self.as_u64(), other.as_u64()) {
            return a == b;
        }
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a.deep_eq(&b),
            _ => false,
        }
    }
}

impl<T: DeepEq> DeepEq for Option<T> {
    fn deep_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => deep_equal(a, b),
            _ => false,
        }
    }
}

impl<T: DeepEq> DeepEq for [T] {
    fn deep_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| deep_equal(a, b))
    }
}

impl<T: DeepEq> DeepEq for Vec<T> {
    fn deep_eq(&self, other: &Self) -> bool {
        self.as_slice().deep_eq(other.as_slice())
    }
}

/// Keyed collections compared key by key.
trait Keyed {
    type Item: DeepEq;

    fn size(&self) -> usize;
    fn key_list(&self) -> Vec<&str>;
    fn lookup(&self, key: &str) -> Option<&Self::Item>;
}

impl<V: DeepEq> Keyed for BTreeMap<String, V> {
    type Item = V;

    fn size(&self) -> usize {
        self.len()
    }

    fn key_list(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }

    fn lookup(&self, key: &str) -> Option<&V> {
        self.get(key)
    }
}

impl Keyed for Map<String, Value> {
    type Item = Value;

    fn size(&self) -> usize {
        self.len()
    }

    fn key_list(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

/// When the key counts differ, every key of either side is compared, with
/// a missing key standing for an absent value.
fn keyed_eq<M: Keyed>(a: &M, b: &M) -> bool {
    if a.size() == b.size() {
        return a
            .key_list()
            .into_iter()
            .all(|k| a.lookup(k).deep_eq(&b.lookup(k)));
    }

    let mut keys = a.key_list();
    keys.extend(b.key_list());
    keys.sort_unstable();
    keys.dedup();
    keys.into_iter()
        .all(|k| a.lookup(k).deep_eq(&b.lookup(k)))
}

impl<T: DeepEq + ?Sized> DeepEq for &T {
    fn deep_eq(&self, other: &Self) -> bool {
        deep_equal(*self, *other)
    }
}

impl<V: DeepEq> DeepEq for BTreeMap<String, V> {
    fn deep_eq(&self, other: &Self) -> bool {
        keyed_eq(self, other)
    }
}

impl DeepEq for Map<String, Value> {
    fn deep_eq(&self, other: &Self) -> bool {
        keyed_eq(self, other)
    }
}

impl DeepEq for Value {
    fn deep_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => a.deep_eq(b),
            (Value::Array(_), _) | (_, Value::Array(_)) => false,
            (Value::Object(a), Value::Object(b)) => a.deep_eq(b),
            (Value::Number(a), Value::Number(b)) => a.deep_eq(b),
            (a, b) => a == b,
        }
    }
}

impl DeepEq for TextStyles {
    fn deep_eq(&self, other: &Self) -> bool {
        self.bold.deep_eq(&other.bold)
            && self.italic.deep_eq(&other.italic)
            && self.underline.deep_eq(&other.underline)
            && self.strikethrough.deep_eq(&other.strikethrough)
            && self.code.deep_eq(&other.code)
            && self.color.deep_eq(&other.color)
            && self.extra.deep_eq(&other.extra)
    }
}

impl DeepEq for StyledRun {
    fn deep_eq(&self, other: &Self) -> bool {
        self.kind.deep_eq(&other.kind)
            && self.text.deep_eq(&other.text)
            && deep_equal(&self.styles, &other.styles)
    }
}
