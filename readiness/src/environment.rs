//! Promotion environments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the four promotion stages, ordered dev → sit → uat → prod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Sit,
    Uat,
    Prod,
}

impl Environment {
    /// All environments in promotion order.
    pub const ALL: [Environment; 4] = [
        Environment::Dev,
        Environment::Sit,
        Environment::Uat,
        Environment::Prod,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Sit => "sit",
            Self::Uat => "uat",
            Self::Prod => "prod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a token does not name a supported environment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported environment: {0}")]
pub struct UnknownEnvironment(pub String);

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "sit" => Ok(Self::Sit),
            "uat" => Ok(Self::Uat),
            "prod" => Ok(Self::Prod),
            _ => Err(UnknownEnvironment(s.to_string())),
        }
    }
}
