//! # Versión HTTP
//! src/http/version.rs

use std::fmt;

/// Versión del protocolo: `HTTP/{major}.{minor}`
///
/// La gramática solo acepta un dígito por componente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const HTTP_1_0: Version = Version { major: 1, minor: 0 };
    pub const HTTP_1_1: Version = Version { major: 1, minor: 1 };

    pub fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::HTTP_1_1
    }
}

impl fmt::Display for Version {
    /// Formato: "HTTP/1.1"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Version::HTTP_1_1.to_string(), "HTTP/1.1");
        assert_eq!(Version::new(2, 0).to_string(), "HTTP/2.0");
    }

    #[test]
    fn test_default_is_1_1() {
        assert_eq!(Version::default(), Version::new(1, 1));
    }
}
