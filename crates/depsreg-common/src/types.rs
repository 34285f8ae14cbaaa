//! Domain primitive types used across the depsreg workspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Storage subtree a package lives in. Scripts and dependencies share
/// one data model and differ only by where they are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemType {
    /// Reusable libraries other packages `require`.
    Deps,
    /// End-user scripts.
    Scripts,
}

impl ItemType {
    /// Every item type, in processing order.
    pub const ALL: [Self; 2] = [Self::Deps, Self::Scripts];

    /// Directory name of this item type under the registry root and `dist/`.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Deps => "deps",
            Self::Scripts => "scripts",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for ItemType {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "deps" | "dep" | "dependencies" => Ok(Self::Deps),
            "scripts" | "script" => Ok(Self::Scripts),
            other => Err(RegistryError::Config {
                message: format!("unknown item type: {other}"),
            }),
        }
    }
}

/// SHA-256 hash digest used for content verification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Sha256Hash(String);

impl Sha256Hash {
    /// Creates a hash from a hex-encoded string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid 64-character hex string.
    pub fn from_hex(hex: impl Into<String>) -> Result<Self> {
        let hex = hex.into();
        if hex.len() != crate::constants::SHA256_HEX_LENGTH
            || !hex.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(RegistryError::Config {
                message: format!("invalid SHA-256 hex string: {hex}"),
            });
        }
        Ok(Self(hex.to_ascii_lowercase()))
    }

    /// Creates a hash from raw digest bytes.
    #[must_use]
    pub fn from_digest(bytes: &[u8]) -> Self {
        use fmt::Write as _;

        let mut hex = String::with_capacity(bytes.len() * 2);
        for b in bytes {
            let _ = write!(hex, "{b:02x}");
        }
        Self(hex)
    }

    /// Returns the hex-encoded hash string.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.0)
    }
}

/// Outcome of processing one item in a best-effort batch.
#[derive(Debug)]
pub struct ItemOutcome<T> {
    /// Human-readable item label, e.g. `deps/cjson/2.1.0`.
    pub item: String,
    /// What happened to the item.
    pub result: Result<T>,
}

/// Accumulated per-item outcomes of a batch operation.
///
/// Batch loops never abort on a single failure; they record it here and
/// move on, so callers can assert on aggregate counts.
#[derive(Debug)]
pub struct BatchReport<T> {
    /// Outcomes in processing order.
    pub outcomes: Vec<ItemOutcome<T>>,
}

impl<T> BatchReport<T> {
    /// Creates an empty report.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            outcomes: Vec::new(),
        }
    }

    /// Records the outcome of one item, logging failures.
    pub fn record(&mut self, item: impl Into<String>, result: Result<T>) {
        let item = item.into();
        if let Err(e) = &result {
            tracing::warn!(item = %item, error = %e, "batch item failed");
        }
        self.outcomes.push(ItemOutcome { item, result });
    }

    /// Number of items that completed successfully.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Number of items that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Returns `true` when no item failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Iterates over successful items and their values.
    pub fn successes(&self) -> impl Iterator<Item = (&str, &T)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|v| (o.item.as_str(), v)))
    }

    /// Iterates over failed items and their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &RegistryError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.item.as_str(), e)))
    }
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self::new()
    }
}
