//! Integration tests: builder output fed straight into roster assembly and
//! the ordering engine, exercising the full pipeline a caller would drive.

use rc_depend::context::Context;
use rc_depend::options::DepOptions;
use rc_depend::state::{MemoryStateStore, ServiceState};
use rc_depend::{build, order, roster, StaticSource};

fn build_tree(lines: &[&str]) -> rc_depend::DepTree {
    let mut source = StaticSource(lines.iter().map(|s| s.to_string()).collect());
    build(&mut source, None).unwrap().tree
}

#[test]
fn default_runlevel_start_order_respects_needs_and_uses() {
    let tree = build_tree(&[
        "net ineed dns",
        "dns ineed lo",
        "sshd iuse net",
        "lo",
    ]);

    let ctx = Context::new("default");
    let mut store = MemoryStateStore::new();
    store.add_to_runlevel("default", "sshd");
    store.add_to_runlevel("default", "net");
    store.add_to_runlevel("default", "dns");
    store.add_to_runlevel("default", "lo");

    let seeds = roster::roster(&ctx, &store);
    let order = order::order_for_runlevel(&tree, &seeds, &ctx, DepOptions::empty(), &store);

    let pos = |name: &str| order.iter().position(|s| s == name).unwrap();
    assert!(pos("lo") < pos("dns"));
    assert!(pos("dns") < pos("net"));
    assert!(pos("net") < pos("sshd"));
}

#[test]
fn provider_ambiguity_resolves_through_runlevel_membership_during_ordering() {
    let tree = build_tree(&["dhcp ineed net", "dhcpcd iprovide net", "wicd iprovide net"]);

    let ctx = Context::new("default");
    let mut store = MemoryStateStore::new();
    store.add_to_runlevel("default", "dhcp");
    store.add_to_runlevel("default", "dhcpcd");
    store.set_state("dhcpcd", ServiceState::STARTED);

    let seeds = vec!["dhcp".to_string()];
    let order = order::order_for_runlevel(&tree, &seeds, &ctx, DepOptions::empty(), &store);

    assert!(order.contains(&"dhcpcd".to_string()));
    assert!(!order.contains(&"net".to_string()));
    assert!(!order.contains(&"wicd".to_string()));
}

#[test]
fn shutdown_roster_orders_started_services_for_stop() {
    let tree = build_tree(&["net ineed dns", "dns"]);

    let ctx = Context::new("shutdown");
    let mut store = MemoryStateStore::new();
    store.set_state("net", ServiceState::STARTED);
    store.set_state("dns", ServiceState::STARTED);

    let seeds = roster::roster(&ctx, &store);
    assert_eq!(seeds.len(), 2);

    let order = order::order_for_runlevel(&tree, &seeds, &ctx, DepOptions::STOP, &store);
    assert!(order.contains(&"net".to_string()));
    assert!(order.contains(&"dns".to_string()));
}

#[test]
fn self_service_excluded_even_when_seeded_directly() {
    let tree = build_tree(&["a ineed b", "b"]);
    let mut ctx = Context::new("default");
    ctx.self_service = Some("a".to_string());
    let store = MemoryStateStore::new();

    let order = order::order_for_runlevel(&tree, &["a".to_string()], &ctx, DepOptions::empty(), &store);
    assert!(!order.contains(&"a".to_string()));
    assert!(order.contains(&"b".to_string()));
}
