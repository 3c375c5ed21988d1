// SPDX-License-Identifier: MIT

//! Connection rules: per-node constraints on the edges it originates

use std::fmt;
use std::sync::Arc;

/// Result of a connection check.
///
/// Rules may answer with a bare boolean or with a verdict carrying its own
/// message.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionVerdict {
    Allowed(bool),
    Checked {
        valid: bool,
        message: Option<String>,
    },
}

impl ConnectionVerdict {
    /// A rejection carrying a message
    pub fn reject(message: impl Into<String>) -> Self {
        Self::Checked {
            valid: false,
            message: Some(message.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            Self::Allowed(ok) => *ok,
            Self::Checked { valid, .. } => *valid,
        }
    }

    /// The verdict's own message, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Allowed(_) => None,
            Self::Checked { message, .. } => message.as_deref().filter(|m| !m.is_empty()),
        }
    }
}

impl From<bool> for ConnectionVerdict {
    fn from(ok: bool) -> Self {
        Self::Allowed(ok)
    }
}

/// A constraint a node imposes on edges touching it
pub trait ConnectionRule: Send + Sync {
    /// Stable rule id, used in error ids
    fn id(&self) -> &str;

    /// Fallback message when the verdict carries none
    fn description(&self) -> Option<&str> {
        None
    }

    fn validate(
        &self,
        source: &str,
        target: &str,
        source_handle: Option<&str>,
        target_handle: Option<&str>,
    ) -> ConnectionVerdict;
}

/// Ordered set of connection rules attached to a node
#[derive(Clone, Default)]
pub struct ConnectionRules(Vec<Arc<dyn ConnectionRule>>);

impl ConnectionRules {
    pub fn push(&mut self, rule: Arc<dyn ConnectionRule>) {
        self.0.push(rule);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ConnectionRule>> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Debug for ConnectionRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.0.iter().map(|rule| rule.id()))
            .finish()
    }
}

/// Rejects edges whose source and target are the same node
pub struct NoSelfLoop;

impl ConnectionRule for NoSelfLoop {
    fn id(&self) -> &str {
        "no-self-loop"
    }

    fn description(&self) -> Option<&str> {
        Some("A node cannot connect to itself")
    }

    fn validate(
        &self,
        source: &str,
        target: &str,
        _source_handle: Option<&str>,
        _target_handle: Option<&str>,
    ) -> ConnectionVerdict {
        ConnectionVerdict::Allowed(source != target)
    }
}

type ConnectionCheck =
    dyn Fn(&str, &str, Option<&str>, Option<&str>) -> ConnectionVerdict + Send + Sync;

/// Connection rule backed by a closure
pub struct FnConnectionRule {
    id: String,
    description: Option<String>,
    check: Arc<ConnectionCheck>,
}

impl FnConnectionRule {
    pub fn new<F>(id: impl Into<String>, check: F) -> Self
    where
        F: Fn(&str, &str, Option<&str>, Option<&str>) -> ConnectionVerdict + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            description: None,
            check: Arc::new(check),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl ConnectionRule for FnConnectionRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn validate(
        &self,
        source: &str,
        target: &str,
        source_handle: Option<&str>,
        target_handle: Option<&str>,
    ) -> ConnectionVerdict {
        (self.check)(source, target, source_handle, target_handle)
    }
}
