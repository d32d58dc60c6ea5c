//! Provider resolver: disambiguates a virtual service's `providedby` set
//! using live runtime state.
//!
//! Ported from `get_provided`/`get_provided1`. The layered fallback is
//! encoded as a `const` table of `(Scope, StateFilter, collapse_on_multiple)`
//! tuples evaluated in order by [`resolve`] -- auditable and testable layer
//! by layer instead of a single long function.

use crate::context::Context;
use crate::options::DepOptions;
use crate::state::{ServiceState, StateStore};
use crate::tag::TypeTag;
use crate::tree::{DepInfo, ServiceName};

/// Which services a layer considers before applying its state filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Members of the active runlevel.
    Runlevel,
    /// Coldplugged and not already covered by runlevel or boot-level scope.
    ColdplugElsewhere,
    /// Members of the boot level (only meaningful when it differs from
    /// the active runlevel).
    BootLevel,
    /// No scope restriction.
    Any,
}

/// Which live states a layer accepts, mirroring `get_provided1`'s
/// three-way `switch` on `RC_SERVICE_STARTED` / `_STARTING` / `_STOPPED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StateFilter {
    Started,
    /// `STARTING | STOPPING | INACTIVE` -- "in flux".
    InFlux,
    /// Matches any in-scope service regardless of its actual state bits --
    /// the source's `switch` falls `RC_SERVICE_STOPPED` into `default:
    /// break`, which applies no further state filtering at all.
    Stopped,
}

/// Whether a layer return is grouped under the "DO" ambiguity-collapse
/// macro, or returns unconditionally with whatever it collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// Collapse to empty if more than one candidate; otherwise keep going
    /// to the next layer if the layer collected nothing.
    Do,
    /// Return immediately with whatever this layer collected (possibly
    /// empty), no ambiguity collapse.
    Return,
}

const LAYERS: &[(Scope, StateFilter, Outcome)] = &[
    (Scope::Runlevel, StateFilter::Started, Outcome::Do),
    (Scope::Runlevel, StateFilter::InFlux, Outcome::Return),
    (Scope::Runlevel, StateFilter::Stopped, Outcome::Return),
    (Scope::ColdplugElsewhere, StateFilter::Started, Outcome::Do),
    (Scope::ColdplugElsewhere, StateFilter::InFlux, Outcome::Return),
    (Scope::BootLevel, StateFilter::Started, Outcome::Do),
    (Scope::BootLevel, StateFilter::InFlux, Outcome::Return),
    (Scope::ColdplugElsewhere, StateFilter::Stopped, Outcome::Do),
    (Scope::Any, StateFilter::Started, Outcome::Do),
    (Scope::Any, StateFilter::InFlux, Outcome::Return),
    (Scope::Runlevel, StateFilter::Stopped, Outcome::Return),
    (Scope::BootLevel, StateFilter::Stopped, Outcome::Return),
];

/// Select the concrete service(s) that satisfy `depinfo`'s `providedby`
/// set. Empty is a valid result.
pub fn resolve(
    depinfo: &DepInfo,
    ctx: &Context,
    options: DepOptions,
    state_store: &dyn StateStore,
) -> Vec<ServiceName> {
    let Some(providedby) = depinfo.get(TypeTag::ProvidedBy) else {
        return Vec::new();
    };
    let providers = providedby.services();

    if options.contains(DepOptions::STOP) {
        return providers.to_vec();
    }

    if options.contains(DepOptions::STRICT) || options.contains(DepOptions::START) {
        let selected: Vec<ServiceName> = providers
            .iter()
            .filter(|svc| {
                ctx_membership(ctx, state_store, svc, options.contains(DepOptions::START))
            })
            .cloned()
            .collect();
        if !selected.is_empty() {
            return selected;
        }
    }

    for &(scope, filter, outcome) in LAYERS {
        if scope == Scope::BootLevel && ctx.is_boot_level() {
            // only if boot level differs from the active runlevel.
            continue;
        }

        let collected = collect_layer(providers, ctx, state_store, scope, filter);

        match outcome {
            Outcome::Do => {
                if collected.len() == 1 {
                    return collected;
                }
                if collected.len() > 1 {
                    return Vec::new();
                }
                // zero: fall through to the next layer
            }
            Outcome::Return => {
                if !collected.is_empty() {
                    return collected;
                }
                // zero: fall through to the next layer (the source only
                // short-circuits a `Return` layer when it found something;
                // an empty `InFlux`/`Stopped` layer falls through too)
            }
        }
    }

    providers.to_vec()
}

fn ctx_membership(ctx: &Context, store: &dyn StateStore, svc: &str, include_coldplugged: bool) -> bool {
    store.in_runlevel(svc, &ctx.runlevel)
        || store.in_runlevel(svc, &ctx.bootlevel)
        || (include_coldplugged && store.state(svc).contains(ServiceState::COLDPLUGGED))
}

fn collect_layer(
    providers: &[ServiceName],
    ctx: &Context,
    store: &dyn StateStore,
    scope: Scope,
    filter: StateFilter,
) -> Vec<ServiceName> {
    providers
        .iter()
        .filter(|svc| in_scope(svc, ctx, store, scope) && matches_filter(store.state(svc), filter))
        .cloned()
        .collect()
}

fn in_scope(svc: &str, ctx: &Context, store: &dyn StateStore, scope: Scope) -> bool {
    match scope {
        Scope::Runlevel => store.in_runlevel(svc, &ctx.runlevel),
        Scope::BootLevel => store.in_runlevel(svc, &ctx.bootlevel),
        Scope::ColdplugElsewhere => {
            store.state(svc).contains(ServiceState::COLDPLUGGED)
                && !store.in_runlevel(svc, &ctx.runlevel)
                && !store.in_runlevel(svc, &ctx.bootlevel)
        }
        Scope::Any => true,
    }
}

fn matches_filter(state: ServiceState, filter: StateFilter) -> bool {
    match filter {
        StateFilter::Started => state.contains(ServiceState::STARTED),
        StateFilter::InFlux => {
            state.intersects(ServiceState::STARTING | ServiceState::STOPPING | ServiceState::INACTIVE)
        }
        // No state bit required: a "stopped" layer accepts any in-scope
        // service, matching, e.g., a freshly unset `MemoryStateStore` entry
        // that carries no state bits at all.
        StateFilter::Stopped => true,
    }
}
