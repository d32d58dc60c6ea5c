//! Runlevel roster assembly and the "valid in runlevel" predicate.
//!
//! Ported from the `rc_deptree_order` list-building preamble and
//! `valid_service`. The original concatenates the `STARTING` list twice for
//! shutdown-style transitions; here each state is folded in exactly once.

use crate::context::Context;
use crate::state::{ServiceState, StateStore};
use crate::tree::ServiceName;

/// The initial service set for an action against `ctx.runlevel`.
///
/// For `single`/`shutdown`/`reboot`, the roster is "everything currently
/// running" -- started, inactive, and starting services, each contributed
/// exactly once. Otherwise it's runlevel membership, plus coldplugged
/// services, plus boot-level membership if the boot level differs from
/// the active runlevel.
pub fn roster(ctx: &Context, state_store: &dyn StateStore) -> Vec<ServiceName> {
    if Context::is_transitional_level(&ctx.runlevel) {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for state in [ServiceState::STARTED, ServiceState::INACTIVE, ServiceState::STARTING] {
            for svc in state_store.services_in_state(state) {
                if seen.insert(svc.clone()) {
                    out.push(svc);
                }
            }
        }
        return out;
    }

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for svc in state_store.services_in_runlevel(&ctx.runlevel) {
        if seen.insert(svc.clone()) {
            out.push(svc);
        }
    }
    for svc in state_store.services_in_state(ServiceState::COLDPLUGGED) {
        if seen.insert(svc.clone()) {
            out.push(svc);
        }
    }
    if !ctx.is_boot_level() {
        for svc in state_store.services_in_runlevel(&ctx.bootlevel) {
            if seen.insert(svc.clone()) {
                out.push(svc);
            }
        }
    }

    out
}

/// A service is "valid in runlevel" if it's a member of the active
/// runlevel, a member of the boot level (when that differs from the
/// active runlevel), currently coldplugged, or currently started.
pub fn valid_in_runlevel(service: &str, ctx: &Context, state_store: &dyn StateStore) -> bool {
    if !ctx.is_boot_level() && state_store.in_runlevel(service, &ctx.bootlevel) {
        return true;
    }
    if state_store.in_runlevel(service, &ctx.runlevel) {
        return true;
    }
    let state = state_store.state(service);
    state.contains(ServiceState::COLDPLUGGED) || state.contains(ServiceState::STARTED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryStateStore;

    #[test]
    fn transitional_roster_folds_each_state_once() {
        let ctx = Context::new("shutdown");
        let mut store = MemoryStateStore::new();
        store.set_state("a", ServiceState::STARTED);
        store.set_state("b", ServiceState::INACTIVE);
        store.set_state("c", ServiceState::STARTING);

        let list = roster(&ctx, &store);
        assert_eq!(list.len(), 3);
        assert_eq!(list.iter().filter(|s| *s == "c").count(), 1);
    }

    #[test]
    fn normal_roster_unions_runlevel_coldplug_and_bootlevel() {
        let mut ctx = Context::new("default");
        ctx.bootlevel = "boot".to_string();
        let mut store = MemoryStateStore::new();
        store.add_to_runlevel("default", "sshd");
        store.set_state("udev", ServiceState::COLDPLUGGED);
        store.add_to_runlevel("boot", "mount-root");

        let list = roster(&ctx, &store);
        assert!(list.contains(&"sshd".to_string()));
        assert!(list.contains(&"udev".to_string()));
        assert!(list.contains(&"mount-root".to_string()));
    }

    #[test]
    fn boot_level_roster_does_not_duplicate_itself() {
        let ctx = Context::new("boot");
        let mut store = MemoryStateStore::new();
        store.add_to_runlevel("boot", "mount-root");

        let list = roster(&ctx, &store);
        assert_eq!(list.iter().filter(|s| *s == "mount-root").count(), 1);
    }

    #[test]
    fn valid_in_runlevel_accepts_coldplugged_and_started() {
        let ctx = Context::new("default");
        let mut store = MemoryStateStore::new();
        store.set_state("a", ServiceState::COLDPLUGGED);
        store.set_state("b", ServiceState::STARTED);
        assert!(valid_in_runlevel("a", &ctx, &store));
        assert!(valid_in_runlevel("b", &ctx, &store));
        assert!(!valid_in_runlevel("c", &ctx, &store));
    }

    #[test]
    fn valid_in_runlevel_accepts_bootlevel_membership_when_different() {
        let ctx = Context::new("default");
        let mut store = MemoryStateStore::new();
        store.add_to_runlevel("boot", "mount-root");
        assert!(valid_in_runlevel("mount-root", &ctx, &store));
    }
}
