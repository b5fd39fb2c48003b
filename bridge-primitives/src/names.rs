//! Validated names for tools and resources.

use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// URI scheme shared by every resource.
pub const RESOURCE_SCHEME: &str = "data://";

const MAX_TOOL_NAME_LEN: usize = 64;
const MAX_URI_LEN: usize = 256;

/// Unique, stable name of a remotely invocable tool.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToolName(String);

impl ToolName {
    /// Creates a tool name after validating its format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidToolName`] if the name is empty, too long, or
    /// contains characters outside `[A-Za-z0-9_.-]`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidToolName {
                name,
                reason: "name cannot be empty".into(),
            });
        }

        if name.len() > MAX_TOOL_NAME_LEN {
            return Err(Error::InvalidToolName {
                name,
                reason: format!("name length must be <= {MAX_TOOL_NAME_LEN}"),
            });
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(Error::InvalidToolName {
                name,
                reason: "name must contain alphanumeric, dash, underscore, or dot".into(),
            });
        }

        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ToolName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ToolName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ToolName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ToolName> for String {
    fn from(value: ToolName) -> Self {
        value.0
    }
}

/// Address of a read-only resource, always under the `data://` scheme.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceUri(String);

impl ResourceUri {
    /// Parses a full `data://...` URI.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidResourceUri`] when the scheme is missing, the
    /// path is empty, or the URI contains whitespace.
    pub fn new(uri: impl Into<String>) -> Result<Self> {
        let uri = uri.into();
        let Some(path) = uri.strip_prefix(RESOURCE_SCHEME) else {
            return Err(Error::InvalidResourceUri {
                uri,
                reason: format!("uri must start with {RESOURCE_SCHEME}"),
            });
        };

        if path.is_empty() {
            return Err(Error::InvalidResourceUri {
                uri,
                reason: "resource path cannot be empty".into(),
            });
        }

        if uri.len() > MAX_URI_LEN {
            return Err(Error::InvalidResourceUri {
                uri,
                reason: format!("uri length must be <= {MAX_URI_LEN}"),
            });
        }

        if uri.chars().any(char::is_whitespace) {
            return Err(Error::InvalidResourceUri {
                uri,
                reason: "uri cannot contain whitespace".into(),
            });
        }

        Ok(Self(uri))
    }

    /// Builds a URI from the path portion, e.g. `users/list`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ResourceUri::new`].
    pub fn from_path(path: &str) -> Result<Self> {
        Self::new(format!("{RESOURCE_SCHEME}{path}"))
    }

    /// Returns the full URI.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the portion after `data://`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.0[RESOURCE_SCHEME.len()..]
    }
}

impl Display for ResourceUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ResourceUri {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ResourceUri {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ResourceUri> for String {
    fn from(value: ResourceUri) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_snake_case_tool_names() {
        let name = ToolName::new("add_numbers").expect("valid");
        assert_eq!(name.as_str(), "add_numbers");
    }

    #[test]
    fn rejects_bad_tool_names() {
        assert!(matches!(
            ToolName::new(""),
            Err(Error::InvalidToolName { .. })
        ));
        assert!(matches!(
            ToolName::new("has/slash"),
            Err(Error::InvalidToolName { .. })
        ));
        assert!(matches!(
            ToolName::new("x".repeat(65)),
            Err(Error::InvalidToolName { .. })
        ));
    }

    #[test]
    fn resource_uri_exposes_path() {
        let uri = ResourceUri::from_path("users/list").expect("valid");
        assert_eq!(uri.as_str(), "data://users/list");
        assert_eq!(uri.path(), "users/list");
    }

    #[test]
    fn resource_uri_requires_scheme_and_path() {
        assert!(ResourceUri::new("http://config").is_err());
        assert!(ResourceUri::new("data://").is_err());
        assert!(ResourceUri::new("data://has space").is_err());
    }

    #[test]
    fn deserialization_validates() {
        let ok: ResourceUri = serde_json::from_str("\"data://config\"").expect("valid");
        assert_eq!(ok.path(), "config");
        assert!(serde_json::from_str::<ToolName>("\"\"").is_err());
    }
}
