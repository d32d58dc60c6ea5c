//! rc-depend - service dependency resolver and ordering engine
//!
//! A library that:
//! - Builds a multi-relation dependency tree from a streamed producer
//!   description (needs, uses, before, after, provides)
//! - Disambiguates virtual "provider" services against live runtime state
//! - Produces a deterministic, post-order traversal for starting, stopping,
//!   or otherwise acting on a runlevel's services
//! - Persists the tree to a human-readable, shell-sourceable cache
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      rc-depend                           │
//! ├───────────────┬───────────────┬──────────────┬───────────┤
//! │    Builder     │   Cache codec │   Provider   │  Ordering │
//! │  (5 phases)     │  (load/save)  │   resolver   │   engine │
//! ├───────────────┴───────────────┴──────────────┴───────────┤
//! │                    DepTree / DepInfo / DepType            │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The service-state store, the producer's shell helper, and process
//! invocation itself live outside this crate -- they're consumed through the
//! [`state::StateStore`] and [`builder::ProducerSource`] traits.

pub mod builder;
pub mod cache;
pub mod context;
pub mod error;
pub mod freshness;
pub mod options;
pub mod order;
pub mod provider;
pub mod query;
pub mod roster;
pub mod state;
pub mod tag;
pub mod tree;

pub use builder::{build, build_and_persist, BuildOutcome, CommandSource, ProducerSource, StaticSource};
pub use context::Context;
pub use error::{DepError, Result};
pub use options::DepOptions;
pub use state::{MemoryStateStore, ServiceState, StateStore};
pub use tag::TypeTag;
pub use tree::{DepInfo, DepTree, DepType, ServiceName};
