//! Tri-state signaling options
//!
//! Feature toggles sent to the signaling server have three values. `Unset`
//! means "let the server decide" and is not the same as an explicit `false`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ClientError;

/// A boolean with a distinguished "unset" state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OptionalBool {
    True,
    False,
    #[default]
    Unset,
}

impl OptionalBool {
    /// The explicit value, if any
    pub fn get(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::Unset => None,
        }
    }

    pub fn is_set(self) -> bool {
        self != Self::Unset
    }

    /// Command-line token for this value
    pub fn as_str(self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
            Self::Unset => "none",
        }
    }
}

impl From<Option<bool>> for OptionalBool {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::True,
            Some(false) => Self::False,
            None => Self::Unset,
        }
    }
}

impl From<bool> for OptionalBool {
    fn from(value: bool) -> Self {
        Some(value).into()
    }
}

impl From<OptionalBool> for Option<bool> {
    fn from(value: OptionalBool) -> Self {
        value.get()
    }
}

impl FromStr for OptionalBool {
    type Err = ClientError;

    /// Accepts exactly `true`, `false` and `none`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "true" => Ok(Self::True),
            "false" => Ok(Self::False),
            "none" => Ok(Self::Unset),
            other => Err(ClientError::config(format!(
                "invalid value '{}': expected one of true, false, none",
                other
            ))),
        }
    }
}

impl fmt::Display for OptionalBool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OptionalBool {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.get().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OptionalBool {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<bool>::deserialize(deserializer).map(Self::from)
    }
}
