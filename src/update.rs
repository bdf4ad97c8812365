//! Interface update types flowing through the filter.
//!
//! Link and address notifications arrive on separate streams but share a
//! per-interface queue once deferred, so they are unified under [`Update`].

use std::fmt;
use std::time::Duration;

use ipnet::IpNet;

/// Kernel interface index.
pub type InterfaceIndex = u32;

/// Operational state of a link, as reported by the kernel (RFC 2863).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OperState {
    /// State could not be determined.
    #[default]
    Unknown,
    /// Some component is missing.
    NotPresent,
    /// Interface is down.
    Down,
    /// A lower-layer interface is down.
    LowerLayerDown,
    /// Interface is in test mode.
    Testing,
    /// Interface is waiting for an external event.
    Dormant,
    /// Interface is operational.
    Up,
}

impl fmt::Display for OperState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unknown => "unknown",
            Self::NotPresent => "not-present",
            Self::Down => "down",
            Self::LowerLayerDown => "lower-layer-down",
            Self::Testing => "testing",
            Self::Dormant => "dormant",
            Self::Up => "up",
        };
        f.write_str(label)
    }
}

/// Link attributes carried by a [`LinkUpdate`].
///
/// The filter never inspects these; they are passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkState {
    /// Interface name (e.g. `eth0`).
    pub name: String,
    /// Operational state.
    pub oper_state: OperState,
    /// Raw interface flags (`IFF_*`).
    pub flags: u32,
}

impl LinkState {
    /// Creates link state with no flags set.
    #[must_use]
    pub fn new(name: impl Into<String>, oper_state: OperState) -> Self {
        Self {
            name: name.into(),
            oper_state,
            flags: 0,
        }
    }

    /// Sets the raw interface flags.
    #[must_use]
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }
}

/// A link state change for one interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkUpdate {
    /// Index of the interface the update applies to.
    pub index: InterfaceIndex,
    /// New link state.
    pub state: LinkState,
}

impl LinkUpdate {
    /// Creates a link update.
    #[must_use]
    pub const fn new(index: InterfaceIndex, state: LinkState) -> Self {
        Self { index, state }
    }
}

/// An address being added to or removed from an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddrUpdate {
    /// Index of the interface the address belongs to.
    pub index: InterfaceIndex,
    /// Address and prefix length.
    pub prefix: IpNet,
    /// `true` if the address was added, `false` if removed.
    pub is_add: bool,
    /// Raw address flags (`IFA_F_*`).
    pub flags: u32,
    /// Address scope.
    pub scope: u8,
    /// Preferred lifetime, `None` for forever.
    pub preferred_lifetime: Option<Duration>,
    /// Valid lifetime, `None` for forever.
    pub valid_lifetime: Option<Duration>,
}

impl AddrUpdate {
    /// Creates an address update with default attributes.
    #[must_use]
    pub const fn new(index: InterfaceIndex, prefix: IpNet, is_add: bool) -> Self {
        Self {
            index,
            prefix,
            is_add,
            flags: 0,
            scope: 0,
            preferred_lifetime: None,
            valid_lifetime: None,
        }
    }

    /// Creates an "added" address update.
    #[must_use]
    pub const fn added(index: InterfaceIndex, prefix: IpNet) -> Self {
        Self::new(index, prefix, true)
    }

    /// Creates a "removed" address update.
    #[must_use]
    pub const fn removed(index: InterfaceIndex, prefix: IpNet) -> Self {
        Self::new(index, prefix, false)
    }

    /// Sets the raw address flags.
    #[must_use]
    pub const fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the address scope.
    #[must_use]
    pub const fn with_scope(mut self, scope: u8) -> Self {
        self.scope = scope;
        self
    }

    /// Sets the preferred and valid lifetimes.
    #[must_use]
    pub const fn with_lifetimes(
        mut self,
        preferred: Option<Duration>,
        valid: Option<Duration>,
    ) -> Self {
        self.preferred_lifetime = preferred;
        self.valid_lifetime = valid;
        self
    }

    /// Returns true if `other` refers to the same prefix on any interface.
    ///
    /// See [`same_prefix`].
    #[must_use]
    pub fn same_prefix_as(&self, other: &Self) -> bool {
        same_prefix(&self.prefix, &other.prefix)
    }
}

/// Compares two prefixes structurally.
///
/// Address, prefix length and address width must all be equal, so an IPv4
/// `/24` never matches an IPv6 `/24` even when the address bits coincide.
/// The host part is significant: `10.0.0.5/24` and `10.0.0.6/24` differ.
#[must_use]
pub fn same_prefix(a: &IpNet, b: &IpNet) -> bool {
    a.addr() == b.addr()
        && a.prefix_len() == b.prefix_len()
        && a.max_prefix_len() == b.max_prefix_len()
}

/// Discriminant of an [`Update`], used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    /// Link state change.
    Link,
    /// Address added.
    AddrAdded,
    /// Address removed.
    AddrRemoved,
}

/// Either kind of interface update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// A link update.
    Link(LinkUpdate),
    /// An address update.
    Addr(AddrUpdate),
}

impl Update {
    /// Returns the interface index the update applies to.
    #[must_use]
    pub const fn index(&self) -> InterfaceIndex {
        match self {
            Self::Link(link) => link.index,
            Self::Addr(addr) => addr.index,
        }
    }

    /// Returns the kind of update.
    #[must_use]
    pub const fn kind(&self) -> UpdateKind {
        match self {
            Self::Link(_) => UpdateKind::Link,
            Self::Addr(addr) if addr.is_add => UpdateKind::AddrAdded,
            Self::Addr(_) => UpdateKind::AddrRemoved,
        }
    }

    /// Returns the address update, if this is one.
    #[must_use]
    pub const fn as_addr(&self) -> Option<&AddrUpdate> {
        match self {
            Self::Addr(addr) => Some(addr),
            Self::Link(_) => None,
        }
    }

    /// Returns the link update, if this is one.
    #[must_use]
    pub const fn as_link(&self) -> Option<&LinkUpdate> {
        match self {
            Self::Link(link) => Some(link),
            Self::Addr(_) => None,
        }
    }
}

impl From<LinkUpdate> for Update {
    fn from(update: LinkUpdate) -> Self {
        Self::Link(update)
    }
}

impl From<AddrUpdate> for Update {
    fn from(update: AddrUpdate) -> Self {
        Self::Addr(update)
    }
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(link) => write!(
                f,
                "link if={} name={} state={}",
                link.index, link.state.name, link.state.oper_state
            ),
            Self::Addr(addr) => {
                let op = if addr.is_add { "add" } else { "del" };
                write!(f, "addr {op} if={} {}", addr.index, addr.prefix)
            }
        }
    }
}

#[cfg(test)]
#[path = "update_tests.rs"]
mod tests;
