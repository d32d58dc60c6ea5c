//! Runtime state store interface (consumed, not implemented by init itself).
//!
//! The real service-state store -- which services are currently started,
//! stopping, coldplugged, or members of a runlevel -- lives outside this
//! crate. `StateStore` is the seam: the resolver and ordering engine only
//! ever observe state through it, and tests drive an in-memory
//! implementation instead of a live system.

use std::collections::{HashMap, HashSet};

use bitflags::bitflags;

use crate::tree::ServiceName;

bitflags! {
    /// Mirrors the source's `RC_SERVICE_*` state bits. A service may be in
    /// more than one at once (e.g. `STARTING | COLDPLUGGED`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ServiceState: u16 {
        const STARTED     = 0b0000_0001;
        const STARTING    = 0b0000_0010;
        const STOPPING    = 0b0000_0100;
        const INACTIVE    = 0b0000_1000;
        const STOPPED     = 0b0001_0000;
        const COLDPLUGGED = 0b0010_0000;
        const FAILED      = 0b0100_0000;
    }
}

/// Consumed interface onto the external service-state store.
pub trait StateStore {
    fn state(&self, service: &str) -> ServiceState;
    fn in_runlevel(&self, service: &str, level: &str) -> bool;
    fn services_in_runlevel(&self, level: &str) -> Vec<ServiceName>;
    fn services_in_state(&self, state: ServiceState) -> Vec<ServiceName>;
}

/// In-memory `StateStore` for tests and demonstration use. Not part of the
/// production deployment -- the real store lives in the init daemon.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    states: HashMap<ServiceName, ServiceState>,
    runlevels: HashMap<String, HashSet<ServiceName>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_state(&mut self, service: impl Into<ServiceName>, state: ServiceState) -> &mut Self {
        self.states.insert(service.into(), state);
        self
    }

    pub fn add_to_runlevel(&mut self, level: impl Into<String>, service: impl Into<ServiceName>) -> &mut Self {
        self.runlevels.entry(level.into()).or_default().insert(service.into());
        self
    }
}

impl StateStore for MemoryStateStore {
    fn state(&self, service: &str) -> ServiceState {
        self.states.get(service).copied().unwrap_or(ServiceState::empty())
    }

    fn in_runlevel(&self, service: &str, level: &str) -> bool {
        self.runlevels.get(level).is_some_and(|members| members.contains(service))
    }

    fn services_in_runlevel(&self, level: &str) -> Vec<ServiceName> {
        self.runlevels
            .get(level)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn services_in_state(&self, state: ServiceState) -> Vec<ServiceName> {
        self.states
            .iter()
            .filter(|(_, &s)| s.intersects(state))
            .map(|(name, _)| name.clone())
            .collect()
    }
}
