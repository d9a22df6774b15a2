//! Call arguments and cache key derivation.
//!
//! A memoized call is described by a [`CallArgs`]: an ordered list of
//! positional [`ArgValue`]s plus a name-ordered map of keyword values. Two
//! keys are derived from it:
//!
//! - the [`PrimaryKey`]: the value passed under the designated keyword, made
//!   hashable if needed, or [`PrimaryKey::NoKey`] when that keyword is absent
//! - the [`SecondaryKey`]: a SHA-224 digest over the canonical text of the
//!   whole call
//!
//! # Canonical text
//!
//! Values render as fixed literal text, independent of hasher state, so
//! digests are stable across runs and platforms:
//!
//! ```text
//! None  True  False  42  1.5  1e+16  inf  nan  'text'  '\x85'  (1,)  [1, 2]  {'k': 1}
//! ```
//!
//! Floats use the shortest round-tripping digits, in positional form for
//! decimal exponents in `-4..16` and scientific form with a signed two-digit
//! exponent otherwise. Control, format, separator and private-use characters
//! inside strings are written as `\xhh`, `\uhhhh` or `\Uhhhhhhhh` escapes.
//!
//! The call text is the positional tuple followed by the keyword map, for
//! example `(){'n': 10}` for a call passing only `n=10`.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt::{self, Write};
use sha2::digest::Output;
use sha2::{Digest, Sha224};

/// A dynamically typed argument value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ArgValue {
    /// Absence of a value.
    None,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    Str(String),
    /// An immutable sequence. Hashable when all its members are.
    Tuple(Vec<ArgValue>),
    /// A mutable sequence. Not hashable.
    List(Vec<ArgValue>),
    /// A string-keyed mapping. Not hashable.
    Map(BTreeMap<String, ArgValue>),
}

impl ArgValue {
    /// Probes whether the value can be used directly as a map key.
    ///
    /// Returns `None` for lists, maps and tuples containing either. A float
    /// with an integral value in `i64` range keys like that integer, so `2.0`
    /// and `2` share a key.
    pub fn to_hash_key(&self) -> Option<HashKey> {
        Some(match self {
            ArgValue::None => HashKey::None,
            ArgValue::Bool(b) => HashKey::Bool(*b),
            ArgValue::Int(i) => HashKey::Int(*i),
            ArgValue::Str(s) => HashKey::Str(s.clone()),
            ArgValue::Tuple(items) => HashKey::Tuple(
                items
                    .iter()
                    .map(ArgValue::to_hash_key)
                    .collect::<Option<Vec<_>>>()?,
            ),
            ArgValue::Float(x) => HashKey::from_float(*x),
            ArgValue::List(_) | ArgValue::Map(_) => return None,
        })
    }

    /// The integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The string payload, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The float payload, if this is a `Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ArgValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::None => f.write_str("None"),
            ArgValue::Bool(b) => write_bool(f, *b),
            ArgValue::Int(i) => write!(f, "{i}"),
            ArgValue::Float(x) => write_float(f, *x),
            ArgValue::Str(s) => write_str_literal(f, s),
            ArgValue::Tuple(items) => write_tuple(f, items.as_slice()),
            ArgValue::List(items) => write_seq(f, '[', items.as_slice(), ']'),
            ArgValue::Map(entries) => write_map(f, entries),
        }
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        ArgValue::Int(i64::from(v))
    }
}

impl From<u32> for ArgValue {
    fn from(v: u32) -> Self {
        ArgValue::Int(i64::from(v))
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Bool(v)
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Float(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::Str(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::Str(v)
    }
}

impl From<Vec<ArgValue>> for ArgValue {
    fn from(v: Vec<ArgValue>) -> Self {
        ArgValue::List(v)
    }
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(ArgValue::None, Into::into)
    }
}

/// A hashable argument value, usable as a primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum HashKey {
    /// Absence of a value.
    None,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// Bit pattern of a non-integral float, with every NaN folded into one.
    Float(u64),
    /// A string, or the canonical text of an unhashable value.
    Str(String),
    /// A tuple of hashable values.
    Tuple(Vec<HashKey>),
}

impl HashKey {
    /// Keys a float: integral values in `i64` range become [`HashKey::Int`].
    pub fn from_float(x: f64) -> Self {
        // 2^63 is the first integral float past i64::MAX
        const LIMIT: f64 = 9_223_372_036_854_775_808.0;
        if x.is_nan() {
            HashKey::Float(f64::NAN.to_bits())
        } else if x >= -LIMIT && x < LIMIT && (x as i64) as f64 == x {
            // also folds -0.0 into 0
            HashKey::Int(x as i64)
        } else {
            HashKey::Float(x.to_bits())
        }
    }

    /// Uses `value` directly when hashable, else its canonical text.
    pub fn from_arg(value: &ArgValue) -> Self {
        value
            .to_hash_key()
            .unwrap_or_else(|| HashKey::Str(value.to_string()))
    }
}

impl fmt::Display for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashKey::None => f.write_str("None"),
            HashKey::Bool(b) => write_bool(f, *b),
            HashKey::Int(i) => write!(f, "{i}"),
            HashKey::Float(bits) => write_float(f, f64::from_bits(*bits)),
            HashKey::Str(s) => write_str_literal(f, s),
            HashKey::Tuple(items) => write_tuple(f, items.as_slice()),
        }
    }
}

/// Selects the inner cache a call belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimaryKey {
    /// The designated keyword was not passed.
    NoKey,
    /// The (possibly stringified) value of the designated keyword.
    Value(HashKey),
}

impl PrimaryKey {
    /// The primary key a call passing `v` under the designated keyword gets.
    ///
    /// ```
    /// use cache_by_key::{CallArgs, PrimaryKey};
    ///
    /// let args = CallArgs::new().kwarg("n", 3);
    /// assert_eq!(PrimaryKey::for_call(&args, "n"), PrimaryKey::value(3));
    /// ```
    pub fn value(v: impl Into<ArgValue>) -> Self {
        PrimaryKey::Value(HashKey::from_arg(&v.into()))
    }

    /// Derives the primary key of `args` for the keyword `hash_arg`.
    ///
    /// Only keyword arguments are consulted; a value passed positionally is
    /// invisible here and the call falls back to [`PrimaryKey::NoKey`].
    pub fn for_call(args: &CallArgs, hash_arg: &str) -> Self {
        args.get_kwarg(hash_arg)
            .map_or(PrimaryKey::NoKey, |v| PrimaryKey::Value(HashKey::from_arg(v)))
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKey::NoKey => f.write_str("<no-key>"),
            PrimaryKey::Value(v) => v.fmt(f),
        }
    }
}

/// SHA-224 digest of a call's canonical text.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SecondaryKey(Output<Sha224>);

impl SecondaryKey {
    /// Digests the canonical text of `args`.
    pub fn for_call(args: &CallArgs) -> Self {
        Self::digest(args.canonical_text().as_bytes())
    }

    /// Digests arbitrary bytes.
    pub fn digest(bytes: &[u8]) -> Self {
        SecondaryKey(Sha224::digest(bytes))
    }

    /// Raw digest bytes (28 of them).
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Lowercase hex rendering of the digest.
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SecondaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl fmt::Debug for SecondaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecondaryKey({self})")
    }
}

/// The full argument set of one call.
///
/// # Examples
///
/// ```
/// use cache_by_key::CallArgs;
///
/// let args = CallArgs::new().arg(1).arg("a").kwarg("limit", 10);
/// assert_eq!(args.canonical_text(), "(1, 'a'){'limit': 10}");
/// assert_eq!(args.get_kwarg("limit").and_then(|v| v.as_int()), Some(10));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CallArgs {
    positional: Vec<ArgValue>,
    keyword: BTreeMap<String, ArgValue>,
}

impl CallArgs {
    /// An empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<ArgValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a keyword argument, replacing an earlier one of the same name.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    /// Positional arguments in call order.
    pub fn positional(&self) -> &[ArgValue] {
        &self.positional
    }

    /// Keyword arguments ordered by name.
    pub fn keyword(&self) -> &BTreeMap<String, ArgValue> {
        &self.keyword
    }

    /// The keyword argument `name`, if passed.
    pub fn get_kwarg(&self, name: &str) -> Option<&ArgValue> {
        self.keyword.get(name)
    }

    /// Renders the call as the positional tuple followed by the keyword map.
    pub fn canonical_text(&self) -> String {
        format!("{}{}", TupleText(&self.positional), MapText(&self.keyword))
    }
}

struct TupleText<'a>(&'a [ArgValue]);

impl fmt::Display for TupleText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tuple(f, self.0)
    }
}

struct MapText<'a>(&'a BTreeMap<String, ArgValue>);

impl fmt::Display for MapText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_map(f, self.0)
    }
}

fn write_bool(f: &mut fmt::Formatter<'_>, b: bool) -> fmt::Result {
    f.write_str(if b { "True" } else { "False" })
}

fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        return f.write_str("nan");
    }
    if x.is_infinite() {
        return f.write_str(if x > 0.0 { "inf" } else { "-inf" });
    }
    // LowerExp yields the shortest digits as "<mantissa>e<exponent>"
    let sci = format!("{x:e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    if (-4..16).contains(&exp) {
        let fixed = format!("{x}");
        f.write_str(&fixed)?;
        if !fixed.contains('.') {
            f.write_str(".0")?;
        }
        Ok(())
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        write!(f, "{mantissa}e{sign}{:02}", exp.unsigned_abs())
    }
}

/// Code point ranges written as escapes inside string literals.
const NON_PRINTABLE: &[(u32, u32)] = &[
    (0x0000, 0x001f),
    (0x007f, 0x00a0),
    (0x00ad, 0x00ad),
    (0x0600, 0x0605),
    (0x061c, 0x061c),
    (0x06dd, 0x06dd),
    (0x070f, 0x070f),
    (0x0890, 0x0891),
    (0x08e2, 0x08e2),
    (0x1680, 0x1680),
    (0x180e, 0x180e),
    (0x2000, 0x200f),
    (0x2028, 0x202f),
    (0x205f, 0x2064),
    (0x2066, 0x206f),
    (0x3000, 0x3000),
    (0xe000, 0xf8ff),
    (0xfeff, 0xfeff),
    (0xfff9, 0xfffb),
    (0x110bd, 0x110bd),
    (0x110cd, 0x110cd),
    (0x13430, 0x13438),
    (0x1bca0, 0x1bca3),
    (0x1d173, 0x1d17a),
    (0xe0001, 0xe0001),
    (0xe0020, 0xe007f),
    (0xf0000, 0xffffd),
    (0x100000, 0x10fffd),
];

fn is_printable(c: char) -> bool {
    let cp = c as u32;
    NON_PRINTABLE
        .binary_search_by(|&(lo, hi)| {
            if hi < cp {
                core::cmp::Ordering::Less
            } else if lo > cp {
                core::cmp::Ordering::Greater
            } else {
                core::cmp::Ordering::Equal
            }
        })
        .is_err()
}

fn write_str_literal(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    f.write_char(quote)?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => {
                f.write_char('\\')?;
                f.write_char(c)?;
            }
            c if is_printable(c) => f.write_char(c)?,
            c if (c as u32) < 0x100 => write!(f, "\\x{:02x}", c as u32)?,
            c if (c as u32) < 0x10000 => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "\\U{:08x}", c as u32)?,
        }
    }
    f.write_char(quote)
}

fn write_tuple<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    if let [only] = items {
        return write!(f, "({only},)");
    }
    write_seq(f, '(', items, ')')
}

fn write_seq<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    open: char,
    items: &[T],
    close: char,
) -> fmt::Result {
    f.write_char(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_char(close)
}

fn write_map(f: &mut fmt::Formatter<'_>, entries: &BTreeMap<String, ArgValue>) -> fmt::Result {
    f.write_char('{')?;
    for (i, (k, v)) in entries.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_str_literal(f, k)?;
        write!(f, ": {v}")?;
    }
    f.write_char('}')
}
