//! Subscription targets.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::channel::Channels;
use crate::error::Result;

/// Which running strategy to observe: a transport endpoint plus the
/// strategy's logical instance name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// Connection endpoint, e.g. `redis://127.0.0.1:6379` or
    /// `http://localhost:8000`.
    pub host: String,
    /// Logical strategy identifier, e.g. `swap-mm-ethusd`.
    pub instance: String,
}

impl Target {
    pub fn new(host: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            instance: instance.into(),
        }
    }

    /// A target with an empty instance selects nothing.
    pub fn is_selected(&self) -> bool {
        !self.instance.is_empty()
    }

    /// Channel names of this target's instance.
    pub fn channels(&self) -> Result<Channels> {
        Channels::for_instance(&self.instance)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.instance, self.host)
    }
}
