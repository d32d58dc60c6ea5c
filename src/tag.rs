//! Closed edge-kind enumeration for the dependency tree.
//!
//! The original shell/C implementation compares type tags as strings.
//! Here the five forward kinds, their inferred reverses, and the two
//! non-edge tags (`keyword`, `config`) are a closed enum with a single
//! string conversion at the cache boundary.

use std::fmt;
use std::str::FromStr;

/// One edge kind (or non-edge annotation) attached to a [`crate::tree::DepInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Hard requirement: must be up before self; failure is fatal.
    INeed,
    /// Inferred reverse of `INeed`.
    NeedsMe,
    /// Soft requirement: start before self if available; absence is non-fatal.
    IUse,
    /// Inferred reverse of `IUse`.
    UsesMe,
    /// Ordering only: order after the named service if present.
    IAfter,
    /// Inferred reverse of `IAfter`.
    IBefore,
    /// Virtual service: this service satisfies the named virtual name.
    IProvide,
    /// Inferred reverse of `IProvide`.
    ProvidedBy,
    /// Platform tag such as `nolinux`.
    Keyword,
    /// External config file path whose mtime affects freshness.
    Config,
}

impl TypeTag {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::INeed => "ineed",
            TypeTag::NeedsMe => "needsme",
            TypeTag::IUse => "iuse",
            TypeTag::UsesMe => "usesme",
            TypeTag::IAfter => "iafter",
            TypeTag::IBefore => "ibefore",
            TypeTag::IProvide => "iprovide",
            TypeTag::ProvidedBy => "providedby",
            TypeTag::Keyword => "keyword",
            TypeTag::Config => "config",
        }
    }

    /// The inferred reverse of a forward edge kind, if any.
    ///
    /// `keyword` and `config` are not edges and have no reverse.
    pub fn reverse(self) -> Option<TypeTag> {
        for (fwd, rev) in DEP_PAIRS {
            if *fwd == self {
                return Some(*rev);
            }
            if *rev == self {
                return Some(*fwd);
            }
        }
        None
    }

    /// True for the five declared (forward) kinds that a producer line can carry.
    pub fn is_forward(self) -> bool {
        DEP_PAIRS.iter().any(|(fwd, _)| *fwd == self)
    }
}

/// `(declared, inferred)` pairs used by Phase 4 back-edge inference.
pub const DEP_PAIRS: &[(TypeTag, TypeTag)] = &[
    (TypeTag::INeed, TypeTag::NeedsMe),
    (TypeTag::IUse, TypeTag::UsesMe),
    (TypeTag::IAfter, TypeTag::IBefore),
    (TypeTag::IBefore, TypeTag::IAfter),
    (TypeTag::IProvide, TypeTag::ProvidedBy),
];

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTypeTag(pub String);

impl fmt::Display for UnknownTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown dependency type tag: {}", self.0)
    }
}

impl std::error::Error for UnknownTypeTag {}

impl FromStr for TypeTag {
    type Err = UnknownTypeTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ineed" => TypeTag::INeed,
            "needsme" => TypeTag::NeedsMe,
            "iuse" => TypeTag::IUse,
            "usesme" => TypeTag::UsesMe,
            "iafter" => TypeTag::IAfter,
            "ibefore" => TypeTag::IBefore,
            "iprovide" => TypeTag::IProvide,
            "providedby" => TypeTag::ProvidedBy,
            "keyword" => TypeTag::Keyword,
            "config" => TypeTag::Config,
            _ => return Err(UnknownTypeTag(s.to_string())),
        })
    }
}
