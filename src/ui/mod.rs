//! Control bindings for the dashboard page.
//!
//! Maps each clickable element id to the session operation it triggers.
//! Two controls read a text input alongside the click; its value is used as
//! a cluster id verbatim.

use std::fmt;

use crate::cluster::ClusterHandle;

/// A clickable control on the dashboard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Bake,
    Pull,
    AlreadyBakingCheck,
    Terminate,
    TerminateOther,
}

impl Control {
    pub const ALL: [Control; 5] = [
        Control::Bake,
        Control::Pull,
        Control::AlreadyBakingCheck,
        Control::Terminate,
        Control::TerminateOther,
    ];

    pub fn element_id(self) -> &'static str {
        match self {
            Self::Bake => "bake",
            Self::Pull => "pull",
            Self::AlreadyBakingCheck => "already-baking-check",
            Self::Terminate => "terminate",
            Self::TerminateOther => "terminate-other",
        }
    }

    /// The text input this control reads, if any.
    pub fn input_element_id(self) -> Option<&'static str> {
        match self {
            Self::AlreadyBakingCheck => Some("cid"),
            Self::TerminateOther => Some("terminate-cid"),
            _ => None,
        }
    }

    pub fn from_element_id(id: &str) -> Option<Self> {
        let id = id.trim_start_matches('#');
        Self::ALL.into_iter().find(|c| c.element_id() == id)
    }

    /// Resolve a click into an action. A missing input counts as empty.
    pub fn bind(self, input: Option<&str>) -> Action {
        let supplied = || ClusterHandle::new(input.unwrap_or_default());
        match self {
            Self::Bake => Action::Bake,
            Self::Pull => Action::Pull,
            Self::AlreadyBakingCheck => Action::Check(supplied()),
            Self::Terminate => Action::TerminateCurrent,
            Self::TerminateOther => Action::Terminate(supplied()),
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_id())
    }
}

/// A session operation requested from the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Create a cluster and poll it.
    Bake,
    /// Pull the configured tables.
    Pull,
    /// Poll a cluster that was started elsewhere.
    Check(ClusterHandle),
    /// Terminate the session's active cluster.
    TerminateCurrent,
    /// Terminate a specific cluster; it becomes the active one.
    Terminate(ClusterHandle),
}
