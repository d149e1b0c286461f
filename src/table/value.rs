//! Cell values

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDateTime;

/// A single cell of a table.
///
/// Equality, hashing and ordering treat `Null == Null` and all NaN floats as
/// the same value, so rows can be compared for duplicates and columns counted
/// for distinct values.
#[derive(Debug, Clone)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view of the cell, if it holds a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CellValue::Null => 0,
            CellValue::Bool(_) => 1,
            CellValue::Integer(_) | CellValue::Float(_) => 2,
            CellValue::DateTime(_) => 3,
            CellValue::Text(_) => 4,
        }
    }
}

/// Canonical bit pattern for a float: one NaN, and -0.0 folded into 0.0.
fn float_key(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0.0f64.to_bits()
    } else {
        f.to_bits()
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            CellValue::Null => 0u8.hash(state),
            CellValue::Bool(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            // Integers and floats that compare equal must hash equal
            CellValue::Integer(i) => {
                2u8.hash(state);
                float_key(*i as f64).hash(state);
            }
            CellValue::Float(f) => {
                2u8.hash(state);
                float_key(*f).hash(state);
            }
            CellValue::DateTime(dt) => {
                3u8.hash(state);
                dt.hash(state);
            }
            CellValue::Text(s) => {
                4u8.hash(state);
                s.hash(state);
            }
        }
    }
}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => Ordering::Equal,
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Integer(a), CellValue::Integer(b)) => a.cmp(b),
            (CellValue::Float(a), CellValue::Float(b)) => cmp_floats(*a, *b),
            (CellValue::Integer(i), CellValue::Float(f)) => cmp_int_float(*i, *f),
            (CellValue::Float(f), CellValue::Integer(i)) => cmp_int_float(*i, *f).reverse(),
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a.cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

/// Total order over canonical floats: zeros are equal and NaN sorts last
fn cmp_floats(a: f64, b: f64) -> Ordering {
    f64::from_bits(float_key(a)).total_cmp(&f64::from_bits(float_key(b)))
}

/// Exact integer-to-float comparison. Converting the integer to `f64` would
/// round above 2^53 and make distinct integers equal to the same float.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    // 2^63, the first float past i64::MAX
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    if f.is_nan() {
        return Ordering::Less;
    }
    if f >= LIMIT {
        return Ordering::Less;
    }
    if f < -LIMIT {
        return Ordering::Greater;
    }

    let floor = f.floor();
    // In range, so the cast is exact
    let whole = floor as i64;
    if floor == f {
        i.cmp(&whole)
    } else if i <= whole {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

/// Format a float the way it is written to output files: shortest
/// round-trip digits, always with a fractional part when finite.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return String::new();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    let s = f.to_string();
    if s.contains('.') {
        s
    } else {
        format!("{}.0", s)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(true) => write!(f, "True"),
            CellValue::Bool(false) => write!(f, "False"),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(x) => write!(f, "{}", format_float(*x)),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}
