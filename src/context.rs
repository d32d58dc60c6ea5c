//! Query-session context: the active runlevel, boot level, and self-service
//! name, read once from the environment and threaded explicitly through
//! every query function.
//!
//! The source reads `RC_BOOTLEVEL` into a process-wide global on every
//! entry point. That's modeled here as an explicit, caller-owned struct
//! instead -- set once at session start, passed by reference, never hidden
//! behind a `static`.

use std::env;

/// Boot level used when `RC_BOOTLEVEL` is unset in the environment.
pub const DEFAULT_BOOTLEVEL: &str = "boot";

/// Library directory exported to the producer when `RC_LIBDIR` is unset.
pub const DEFAULT_LIBDIR: &str = "/lib/rc";

/// Synchronization runlevels that list "everything currently running"
/// rather than a fixed membership set.
pub const LEVEL_SINGLE: &str = "single";
pub const LEVEL_SHUTDOWN: &str = "shutdown";
pub const LEVEL_REBOOT: &str = "reboot";

#[derive(Debug, Clone)]
pub struct Context {
    /// The runlevel this session is acting against.
    pub runlevel: String,
    /// The runlevel entered at boot; a fallback membership scope.
    pub bootlevel: String,
    /// `RC_SVCNAME`, when set: the service that must never appear in its
    /// own ordering output.
    pub self_service: Option<String>,
}

impl Context {
    pub fn new(runlevel: impl Into<String>) -> Self {
        Self {
            runlevel: runlevel.into(),
            bootlevel: DEFAULT_BOOTLEVEL.to_string(),
            self_service: None,
        }
    }

    /// Build a context for `runlevel`, reading `RC_BOOTLEVEL` and
    /// `RC_SVCNAME` from the process environment.
    pub fn from_env(runlevel: impl Into<String>) -> Self {
        Self {
            runlevel: runlevel.into(),
            bootlevel: env::var("RC_BOOTLEVEL").unwrap_or_else(|_| DEFAULT_BOOTLEVEL.to_string()),
            self_service: env::var("RC_SVCNAME").ok(),
        }
    }

    pub fn is_boot_level(&self) -> bool {
        self.runlevel == self.bootlevel
    }

    /// Whether `service` is the session's own self-excluded service.
    pub fn is_self(&self, service: &str) -> bool {
        self.self_service.as_deref() == Some(service)
    }

    /// Whether `runlevel` is one of the "act on whatever's running" levels
    /// used by shutdown/reboot/single-user transitions.
    pub fn is_transitional_level(runlevel: &str) -> bool {
        matches!(runlevel, LEVEL_SINGLE | LEVEL_SHUTDOWN | LEVEL_REBOOT)
    }
}

/// `RC_LIBDIR`, exported to the producer subprocess if the caller's
/// environment doesn't already have it set.
pub fn libdir_for_producer() -> String {
    env::var("RC_LIBDIR").unwrap_or_else(|_| DEFAULT_LIBDIR.to_string())
}
