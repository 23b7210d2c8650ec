//! # Account and Action Names
//!
//! A [`Name`] packs up to 12 characters from `[.1-5a-z]` into a `u64`, five
//! bits per character starting at the most significant bit. Numeric order of
//! the packed value equals lexicographic order of the text, so sorted lock
//! lists and `BTreeMap<Name, _>` iterate in the order a reader expects.
//!
//! Binary encodings carry the `u64`; human-readable encodings (JSON config)
//! carry the text.

use crate::errors::TypeError;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";
const MAX_LEN: usize = 12;

/// Compact account/action/table name.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(u64);

fn char_to_symbol(c: u8) -> Option<u64> {
    match c {
        b'a'..=b'z' => Some((c - b'a') as u64 + 6),
        b'1'..=b'5' => Some((c - b'1') as u64 + 1),
        b'.' => Some(0),
        _ => None,
    }
}

impl Name {
    /// Parse a textual name.
    pub fn new(text: &str) -> Result<Self, TypeError> {
        if text.len() > MAX_LEN {
            return Err(TypeError::InvalidName(text.to_string()));
        }

        let mut value = 0u64;
        for (i, c) in text.bytes().enumerate() {
            let symbol =
                char_to_symbol(c).ok_or_else(|| TypeError::InvalidName(text.to_string()))?;
            value |= (symbol & 0x1f) << (64 - 5 * (i + 1));
        }
        Ok(Self(value))
    }

    /// Parse a name at compile time; an invalid literal fails the build.
    pub const fn constant(text: &str) -> Self {
        let bytes = text.as_bytes();
        assert!(bytes.len() <= MAX_LEN, "name longer than 12 characters");

        let mut value = 0u64;
        let mut i = 0;
        while i < bytes.len() {
            let c = bytes[i];
            let symbol = match c {
                b'a'..=b'z' => (c - b'a') as u64 + 6,
                b'1'..=b'5' => (c - b'1') as u64 + 1,
                b'.' => 0,
                _ => panic!("invalid name character"),
            };
            value |= symbol << (64 - 5 * (i + 1));
            i += 1;
        }
        Self(value)
    }

    /// Wrap an already-packed value.
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    /// Packed value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Whether this is the empty name.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl FromStr for Name {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 12 five-bit symbols occupy the top 60 bits; the low 4 bits are unused.
        let mut text = [b'.'; MAX_LEN];
        let mut tmp = self.0 >> 4;
        for slot in text.iter_mut().rev() {
            *slot = CHARMAP[(tmp & 0x1f) as usize];
            tmp >>= 5;
        }

        let end = text.iter().rposition(|c| *c != b'.').map_or(0, |p| p + 1);
        for c in &text[..end] {
            write!(f, "{}", *c as char)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self)
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_u64(self.0)
        }
    }
}

struct NameVisitor;

impl<'de> Visitor<'de> for NameVisitor {
    type Value = Name;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a name of at most 12 characters from [a-z1-5.]")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Name, E> {
        Name::new(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Name, E> {
        Ok(Name(v))
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(NameVisitor)
        } else {
            deserializer.deserialize_u64(NameVisitor)
        }
    }
}
