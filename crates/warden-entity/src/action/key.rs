//! Normalized `(resource, action_code)` identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use warden_core::error::AppError;
use warden_core::types::ActionId;

/// The two-part identity of a protectable operation.
///
/// The resource is trimmed and lower-cased, the action code trimmed and
/// upper-cased, so `Activity:approve` and `activity:APPROVE` are the same
/// key. Every constructor normalizes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "ActionKeyRepr")]
pub struct ActionKey {
    resource: String,
    action_code: String,
}

impl ActionKey {
    /// Build a key from its parts, normalizing casing.
    pub fn new(resource: &str, action_code: &str) -> Result<Self, AppError> {
        let resource = normalize_resource(resource);
        let action_code = normalize_action_code(action_code);

        if resource.is_empty() || action_code.is_empty() {
            return Err(AppError::validation(
                "Action identity requires a non-empty resource and action code",
            ));
        }
        if resource.contains(':') || action_code.contains(':') {
            return Err(AppError::validation(format!(
                "Invalid action identity '{resource}:{action_code}'"
            )));
        }

        Ok(Self {
            resource,
            action_code,
        })
    }

    /// Rebuild the key of a stored row. Rows are normalized on write, so
    /// this only re-applies casing and skips validation.
    pub(crate) fn from_row(resource: &str, action_code: &str) -> Self {
        Self {
            resource: normalize_resource(resource),
            action_code: normalize_action_code(action_code),
        }
    }

    /// The lower-cased resource.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The upper-cased action code.
    pub fn action_code(&self) -> &str {
        &self.action_code
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action_code)
    }
}

impl FromStr for ActionKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (resource, action_code) = s.split_once(':').ok_or_else(|| {
            AppError::validation(format!(
                "Invalid action identity '{s}'. Expected 'resource:ACTION'"
            ))
        })?;
        Self::new(resource, action_code)
    }
}

/// Accepted wire shapes for an [`ActionKey`].
#[derive(Deserialize)]
#[serde(untagged)]
enum ActionKeyRepr {
    Text(String),
    Parts {
        resource: String,
        action_code: String,
    },
}

impl TryFrom<ActionKeyRepr> for ActionKey {
    type Error = AppError;

    fn try_from(repr: ActionKeyRepr) -> Result<Self, Self::Error> {
        match repr {
            ActionKeyRepr::Text(text) => text.parse(),
            ActionKeyRepr::Parts {
                resource,
                action_code,
            } => Self::new(&resource, &action_code),
        }
    }
}

/// Lower-case and trim a resource name.
pub fn normalize_resource(resource: &str) -> String {
    resource.trim().to_lowercase()
}

/// Upper-case and trim an action code.
pub fn normalize_action_code(action_code: &str) -> String {
    action_code.trim().to_uppercase()
}

/// A reference to a catalog action, either by id or by identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionRef {
    /// Reference by catalog id.
    Id(ActionId),
    /// Reference by `(resource, action_code)`.
    Key(ActionKey),
}

impl fmt::Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Key(key) => write!(f, "{key}"),
        }
    }
}

impl FromStr for ActionRef {
    type Err = AppError;

    /// Accepts a catalog UUID or `resource:ACTION`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<ActionId>() {
            Ok(id) => Ok(Self::Id(id)),
            Err(_) => s.parse().map(Self::Key),
        }
    }
}

impl From<ActionId> for ActionRef {
    fn from(id: ActionId) -> Self {
        Self::Id(id)
    }
}

impl From<ActionKey> for ActionRef {
    fn from(key: ActionKey) -> Self {
        Self::Key(key)
    }
}
