use crate::error::RegisterError;
use serde::Serialize;
use std::fmt;

/// Access right bitmask
///
/// Bit values match the stored grants of the ACL tables and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Permission(u32);

impl Permission {
    pub const READ: Permission = Permission(1 << 0);
    pub const WRITE: Permission = Permission(1 << 1);
    pub const CREATE: Permission = Permission(1 << 2);
    pub const DELETE: Permission = Permission(1 << 3);
    pub const ADMINISTRATION: Permission = Permission(1 << 4);

    pub const fn from_mask(mask: u32) -> Self {
        Permission(mask)
    }

    pub const fn mask(&self) -> u32 {
        self.0
    }

    /// Parse a permission name (case-insensitive) or a numeric mask
    pub fn parse(s: &str) -> Result<Self, RegisterError> {
        match s.to_ascii_lowercase().as_str() {
            "read" => Ok(Self::READ),
            "write" => Ok(Self::WRITE),
            "create" => Ok(Self::CREATE),
            "delete" => Ok(Self::DELETE),
            "administration" | "admin" => Ok(Self::ADMINISTRATION),
            other => other
                .parse::<u32>()
                .ok()
                .filter(|m| *m != 0)
                .map(Permission)
                .ok_or_else(|| RegisterError::UnknownPermission(s.to_string())),
        }
    }

    pub fn name(&self) -> Option<&'static str> {
        match *self {
            Self::READ => Some("READ"),
            Self::WRITE => Some("WRITE"),
            Self::CREATE => Some("CREATE"),
            Self::DELETE => Some("DELETE"),
            Self::ADMINISTRATION => Some("ADMINISTRATION"),
            _ => None,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "mask {}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_values() {
        assert_eq!(Permission::READ.mask(), 1);
        assert_eq!(Permission::WRITE.mask(), 2);
        assert_eq!(Permission::CREATE.mask(), 4);
        assert_eq!(Permission::DELETE.mask(), 8);
        assert_eq!(Permission::ADMINISTRATION.mask(), 16);
    }

    #[test]
    fn test_parse() {
        assert_eq!(Permission::parse("read").unwrap(), Permission::READ);
        assert_eq!(Permission::parse("ADMIN").unwrap(), Permission::ADMINISTRATION);
        assert_eq!(Permission::parse("2").unwrap(), Permission::WRITE);
        assert_eq!(Permission::parse("3").unwrap().mask(), 3);
        assert!(Permission::parse("0").is_err());
        assert!(Permission::parse("fly").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Permission::DELETE.to_string(), "DELETE");
        assert_eq!(Permission::from_mask(6).to_string(), "mask 6");
    }
}
