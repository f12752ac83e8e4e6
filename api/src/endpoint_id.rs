//! Names of endpoints registered in bulk.

use std::fmt;

use thiserror::Error;

/// A validated endpoint name.
///
/// Any non-empty string is a valid name, so keys such as `find-all`,
/// `$load` or `_private` work. Names index the [`Endpoints`](crate::Endpoints)
/// returned by [`ApiClient::registry_all`](crate::ApiClient::registry_all).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointId(String);

/// Why a name was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointIdError {
    /// The name is empty.
    #[error("endpoint name cannot be empty")]
    Empty,
}

impl EndpointId {
    /// Validates `name`.
    ///
    /// ## Errors
    ///
    /// Returns [`EndpointIdError::Empty`] for an empty name.
    pub fn new<S: Into<String>>(name: S) -> Result<Self, EndpointIdError> {
        let name = name.into();
        if name.is_empty() {
            return Err(EndpointIdError::Empty);
        }
        Ok(Self(name))
    }

    /// Returns the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EndpointId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<EndpointId> for String {
    fn from(id: EndpointId) -> Self {
        id.0
    }
}

impl TryFrom<&str> for EndpointId {
    type Error = EndpointIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_non_empty_name_is_valid() {
        for name in ["findAll", "save_user", "v2", "find-all", "$load", "_private", "2fa"] {
            assert_eq!(EndpointId::new(name).unwrap().as_str(), name);
        }
    }

    #[test]
    fn test_empty() {
        assert_eq!(EndpointId::new(""), Err(EndpointIdError::Empty));
    }

    #[test]
    fn test_conversions() {
        let id: EndpointId = "update".try_into().unwrap();
        assert_eq!(id.to_string(), "update");
        let name: String = id.into();
        assert_eq!(name, "update");
    }
}
