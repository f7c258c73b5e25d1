use std::fmt::{Display, Formatter};
use std::str::FromStr;

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::{Error, Result};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
pub enum IdKind {
    User,
    Server,
    Peer,
}

/// Public identity of an entity: its kind and its store id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Id {
    pub kind: IdKind,
    pub value: String,
}

impl Id {
    pub fn new(kind: IdKind, value: impl Into<String>) -> Self {
        Self { kind, value: value.into() }
    }

    fn raw(&self) -> String {
        format!("{}:{}", self.kind, self.value)
    }

    /// Standard base64 of `Kind:value`, as exposed to API clients.
    pub fn encode(&self) -> String {
        STANDARD.encode(self.raw())
    }

    pub fn decode(encoded: &str) -> Result<Self> {
        let invalid = || Error::InvalidId(encoded.to_string());

        let bytes = STANDARD.decode(encoded).map_err(|_| invalid())?;
        let raw = String::from_utf8(bytes).map_err(|_| invalid())?;
        let parts: Vec<&str> = raw.split(':').collect();
        let [kind, value] = parts.as_slice() else {
            return Err(invalid());
        };
        let kind = IdKind::from_str(kind).map_err(|_| invalid())?;

        Ok(Self::new(kind, *value))
    }

    /// Returns the store id if this is an id of `kind`.
    pub fn value_of(&self, kind: IdKind) -> Result<&str> {
        self.validate(kind)?;
        Ok(&self.value)
    }

    pub fn validate(&self, kind: IdKind) -> Result<()> {
        if self.kind != kind {
            return Err(Error::IdKindMismatch {
                expected: kind,
                id: self.encode(),
                actual: self.kind,
            });
        }
        Ok(())
    }

    /// Identity used as the last segment of an entity channel. URL-safe so
    /// it never contains a path separator.
    pub fn channel_segment(&self) -> String {
        URL_SAFE.encode(self.raw())
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Id::decode(&encoded).map_err(serde::de::Error::custom)
    }
}
