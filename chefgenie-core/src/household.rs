//! Household codes: the shared secret naming a synced document.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

const CODE_PREFIX: &str = "CHEF-";
const CODE_SUFFIX_LEN: usize = 7;
const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A normalized household code: trimmed and upper-case, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HouseholdCode(String);

impl HouseholdCode {
    /// Normalizes user input. Returns `None` for blank input.
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().to_uppercase();
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    /// A fresh random code such as `CHEF-K3Q9ZP1`.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let suffix: String = (0..CODE_SUFFIX_LEN)
            .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        Self(format!("{}{}", CODE_PREFIX, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HouseholdCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for HouseholdCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| "household code cannot be blank".to_string())
    }
}

impl From<HouseholdCode> for String {
    fn from(code: HouseholdCode) -> Self {
        code.0
    }
}
