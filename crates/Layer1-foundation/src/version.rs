//! Engine version parsing and comparison
//!
//! Signatures declare minimum/maximum compatible engine versions in dotted
//! numeric form. Development builds carry suffixes such as "2.0-dev" which
//! are stripped before parsing. Comparison zero-extends the shorter form,
//! so "3.0" and "3.0.0" are equal.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A dotted numeric engine version such as "2.0" or "2.1.3".
#[derive(Debug, Clone, Default)]
pub struct EngineVersion {
    components: Vec<u32>,
}

impl EngineVersion {
    /// Build from explicit components.
    pub fn new(components: Vec<u32>) -> Self {
        Self { components }
    }

    /// Numeric components after suffix stripping.
    pub fn components(&self) -> &[u32] {
        &self.components
    }
}

impl FromStr for EngineVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Strip pre-release / build suffixes: "2.0-dev" -> "2.0".
        let numeric = s.split(['-', '+']).next().unwrap_or("").trim();
        if numeric.is_empty() {
            return Err(Error::Version(s.to_string()));
        }

        let components = numeric
            .split('.')
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| Error::Version(s.to_string()))
            })
            .collect::<Result<Vec<u32>>>()?;

        Ok(Self { components })
    }
}

impl PartialEq for EngineVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EngineVersion {}

impl Ord for EngineVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            let a = self.components.get(i).copied().unwrap_or(0);
            let b = other.components.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for EngineVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(u32::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> EngineVersion {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(v("2.0").components(), &[2, 0]);
        assert_eq!(v("2.1.3").components(), &[2, 1, 3]);
    }

    #[test]
    fn test_parse_strips_suffix() {
        assert_eq!(v("2.0-dev").components(), &[2, 0]);
        assert_eq!(v("1.2+build5").components(), &[1, 2]);
    }

    #[test]
    fn test_parse_invalid() {
        assert!("".parse::<EngineVersion>().is_err());
        assert!("banana".parse::<EngineVersion>().is_err());
        assert!("1.x".parse::<EngineVersion>().is_err());
        assert!("-dev".parse::<EngineVersion>().is_err());
    }

    #[test]
    fn test_ordering() {
        assert!(v("2.9") < v("3.0"));
        assert!(v("2.1") > v("2.0"));
        assert!(v("2.10") > v("2.9"));
        assert!(v("2.0.1") > v("2.0"));
    }

    #[test]
    fn test_zero_extension_equality() {
        assert_eq!(v("3.0"), v("3.0.0"));
        assert!(!(v("3.0") < v("3.0.0")));
    }

    #[test]
    fn test_display() {
        assert_eq!(v("2.0-dev").to_string(), "2.0");
    }
}
