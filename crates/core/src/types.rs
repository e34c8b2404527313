//! Identity types shared across the workspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Opaque numeric identity of a principal (a chat user id in practice).
///
/// Always strictly positive; construct through [`PrincipalId::new`] or
/// [`str::parse`] so malformed identities never enter the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct PrincipalId(i64);

impl PrincipalId {
    /// Validate a raw numeric id.
    pub fn new(raw: i64) -> Result<Self, CoreError> {
        if raw <= 0 {
            return Err(CoreError::Validation(format!(
                "Principal id must be a positive integer, got {raw}"
            )));
        }
        Ok(Self(raw))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PrincipalId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: i64 = s.trim().parse().map_err(|_| {
            CoreError::Validation(format!("Principal id must be numeric, got '{s}'"))
        })?;
        Self::new(raw)
    }
}

impl TryFrom<i64> for PrincipalId {
    type Error = CoreError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<PrincipalId> for i64 {
    fn from(id: PrincipalId) -> Self {
        id.0
    }
}
