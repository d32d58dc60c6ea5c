//! Option bits passed to the provider resolver and ordering engine.

use bitflags::bitflags;

bitflags! {
    /// Mirrors the source's `RC_DEP_*` option bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DepOptions: u8 {
        /// We're tearing down; every provider candidate is relevant.
        const STOP   = 0b0001;
        /// We're starting; coldplugged providers count too.
        const START  = 0b0010;
        /// Restrict provider selection to declared-membership scopes.
        const STRICT = 0b0100;
        /// Recurse through dependencies instead of reporting only direct ones.
        const TRACE  = 0b1000;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_compose_independently() {
        let opts = DepOptions::STRICT | DepOptions::TRACE;
        assert!(opts.contains(DepOptions::STRICT));
        assert!(opts.contains(DepOptions::TRACE));
        assert!(!opts.contains(DepOptions::STOP));
    }
}
