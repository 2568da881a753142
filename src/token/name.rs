//! Bounded resource names.

use crate::error::{Error, ErrorKind, Result};
use core::fmt;
use serde::Serialize;

/// Maximum resource name length in bytes.
pub const MAX_RESOURCE_NAME_LEN: usize = 63;

/// A bounded UTF-8 resource identifier (at most 63 bytes).
///
/// The default value is the empty name, used for available token slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceName(String);

impl ResourceName {
    /// Creates a resource name, rejecting names longer than the bound.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.len() > MAX_RESOURCE_NAME_LEN {
            return Err(Error::new(ErrorKind::InvalidName).with_context(format!(
                "resource name is {} bytes, limit is {MAX_RESOURCE_NAME_LEN}",
                name.len()
            )));
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for ResourceName {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}
