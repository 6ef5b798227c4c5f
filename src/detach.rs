//! Detach-key sequences for attach and exec sessions.
//!
//! A sequence is one or more keys separated by commas. Each key is either a
//! single ASCII letter or `ctrl-<value>` where `<value>` is one of `a-z`,
//! `@`, `^`, `[`, `,` or `_`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// The engine's default when no override is given.
pub const DEFAULT_DETACH_KEYS: &str = "ctrl-p,ctrl-q";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetachKey {
    Char(char),
    Ctrl(char),
}

impl DetachKey {
    /// Byte the terminal sends for this key.
    pub fn to_byte(self) -> u8 {
        match self {
            DetachKey::Char(c) => c as u8,
            DetachKey::Ctrl(c) => (c as u8) & 0x1f,
        }
    }
}

impl fmt::Display for DetachKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetachKey::Char(c) => write!(f, "{c}"),
            DetachKey::Ctrl(c) => write!(f, "ctrl-{c}"),
        }
    }
}

/// A validated detach-key override.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DetachKeys {
    raw: String,
    keys: Vec<DetachKey>,
}

impl DetachKeys {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let fail = |reason: &str| ValidationError::InvalidDetachKeys {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        if value.is_empty() {
            return Err(fail("empty key sequence"));
        }

        let mut keys = Vec::new();
        let mut rest = value;
        loop {
            let (key, tail) = if let Some(after) = rest.strip_prefix("ctrl-") {
                let mut chars = after.chars();
                let c = chars
                    .next()
                    .ok_or_else(|| fail("ctrl- must be followed by a key"))?;
                if !(c.is_ascii_lowercase() || matches!(c, '@' | '^' | '[' | ',' | '_')) {
                    return Err(fail(&format!("'{c}' cannot follow ctrl-")));
                }
                (DetachKey::Ctrl(c), chars.as_str())
            } else {
                let mut chars = rest.chars();
                let c = chars.next().ok_or_else(|| fail("empty key in sequence"))?;
                if !c.is_ascii_alphabetic() {
                    return Err(fail(&format!("'{c}' is not a letter")));
                }
                (DetachKey::Char(c), chars.as_str())
            };

            keys.push(key);

            if tail.is_empty() {
                break;
            }
            rest = tail
                .strip_prefix(',')
                .ok_or_else(|| fail("keys must be separated by commas"))?;
        }

        Ok(Self {
            raw: value.to_string(),
            keys,
        })
    }

    pub fn keys(&self) -> &[DetachKey] {
        &self.keys
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Byte sequence the engine matches against the input stream.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.keys.iter().map(|k| k.to_byte()).collect()
    }
}

/// Validates a detach-key override without keeping the parsed form.
pub fn validate_detach_keys(value: &str) -> Result<(), ValidationError> {
    DetachKeys::parse(value).map(|_| ())
}

impl Default for DetachKeys {
    fn default() -> Self {
        Self {
            raw: DEFAULT_DETACH_KEYS.to_string(),
            keys: vec![DetachKey::Ctrl('p'), DetachKey::Ctrl('q')],
        }
    }
}

impl FromStr for DetachKeys {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DetachKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for DetachKeys {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for DetachKeys {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("a" ; "single lowercase letter")]
    #[test_case("Z" ; "single uppercase letter")]
    #[test_case("ctrl-c" ; "ctrl letter")]
    #[test_case("ctrl-@" ; "ctrl at")]
    #[test_case("ctrl-^" ; "ctrl caret")]
    #[test_case("ctrl-[" ; "ctrl bracket")]
    #[test_case("ctrl-," ; "ctrl comma")]
    #[test_case("ctrl-_" ; "ctrl underscore")]
    #[test_case("ctrl-p,ctrl-q" ; "default sequence")]
    #[test_case("ctrl-,,q" ; "ctrl comma followed by key")]
    fn test_accepts(value: &str) {
        assert!(validate_detach_keys(value).is_ok(), "{value} should be accepted");
    }

    #[test_case("" ; "empty")]
    #[test_case("ab" ; "two letters without separator")]
    #[test_case("ctrl-1" ; "ctrl digit")]
    #[test_case("ctrl-" ; "ctrl without key")]
    #[test_case("ctrl-A" ; "ctrl uppercase")]
    #[test_case("1" ; "digit")]
    #[test_case("a," ; "trailing comma")]
    #[test_case(",a" ; "leading comma")]
    #[test_case("é" ; "non ascii")]
    fn test_rejects(value: &str) {
        assert!(matches!(
            validate_detach_keys(value),
            Err(ValidationError::InvalidDetachKeys { .. })
        ));
    }

    #[test]
    fn test_to_bytes() {
        assert_eq!(DetachKeys::default().to_bytes(), vec![16, 17]);
        assert_eq!(DetachKeys::parse("ctrl-@").unwrap().to_bytes(), vec![0]);
        assert_eq!(DetachKeys::parse("ctrl-[,x").unwrap().to_bytes(), vec![27, b'x']);
    }

    #[test]
    fn test_default_matches_constant() {
        assert_eq!(DetachKeys::default(), DetachKeys::parse(DEFAULT_DETACH_KEYS).unwrap());
    }
}
