//! Channel naming.
//!
//! Every strategy instance owns three pub/sub channels:
//!
//! ```text
//! StrategyStates:{instance}   strategy -> operator   reported state snapshots
//! StrategyParams:{instance}   strategy -> operator   parameter snapshots
//! UpdateParam:{instance}      operator -> strategy   single-entry edits
//! ```

use std::fmt;

use crate::entry::Group;
use crate::error::{Error, Result};

/// The three channel families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    StrategyStates,
    StrategyParams,
    UpdateParam,
}

impl ChannelKind {
    /// Channel name prefix, before the `:`.
    pub fn prefix(&self) -> &'static str {
        match self {
            ChannelKind::StrategyStates => "StrategyStates",
            ChannelKind::StrategyParams => "StrategyParams",
            ChannelKind::UpdateParam => "UpdateParam",
        }
    }

    /// Group of the snapshots delivered on this channel.
    ///
    /// `None` for the publish-only update channel.
    pub fn group(&self) -> Option<Group> {
        match self {
            ChannelKind::StrategyStates => Some(Group::State),
            ChannelKind::StrategyParams => Some(Group::Param),
            ChannelKind::UpdateParam => None,
        }
    }

    /// The subscribe channel for a group.
    pub fn for_group(group: Group) -> Self {
        match group {
            Group::State => ChannelKind::StrategyStates,
            Group::Param => ChannelKind::StrategyParams,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A fully qualified channel name, e.g. `StrategyParams:swap-mm-ethusd`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelName {
    kind: ChannelKind,
    instance: String,
}

impl ChannelName {
    /// Build a channel name. The instance must not be empty.
    pub fn new(kind: ChannelKind, instance: impl Into<String>) -> Result<Self> {
        let instance = instance.into();
        if instance.is_empty() {
            return Err(Error::EmptyInstance);
        }
        Ok(Self { kind, instance })
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.instance)
    }
}

/// The channel triple of one strategy instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channels {
    pub states: ChannelName,
    pub params: ChannelName,
    pub update: ChannelName,
}

impl Channels {
    /// Derive all three channel names for `instance`.
    ///
    /// An empty instance means no target is selected and yields
    /// [`Error::EmptyInstance`] before any name is built.
    pub fn for_instance(instance: &str) -> Result<Self> {
        if instance.is_empty() {
            return Err(Error::EmptyInstance);
        }
        Ok(Self {
            states: ChannelName::new(ChannelKind::StrategyStates, instance)?,
            params: ChannelName::new(ChannelKind::StrategyParams, instance)?,
            update: ChannelName::new(ChannelKind::UpdateParam, instance)?,
        })
    }

    pub fn instance(&self) -> &str {
        self.update.instance()
    }

    /// The subscribe channel carrying snapshots of `group`.
    pub fn for_group(&self, group: Group) -> &ChannelName {
        match group {
            Group::State => &self.states,
            Group::Param => &self.params,
        }
    }
}
