//! In-memory dependency tree: services and their typed edge sets.
//!
//! `DepTree` owns everything. Cross-references between entries are plain
//! service-name lookups performed at traversal time (see [`DepTree::get`]),
//! never back-pointers -- this keeps teardown a trivial recursive `Drop`
//! and matches the shape of the on-disk cache.

use std::collections::HashMap;

use crate::tag::TypeTag;

/// A service name. A plain alias over `String`, not a distinct type --
/// there's no confusable raw-string argument elsewhere in this crate's API
/// that a newtype would need to guard against.
pub type ServiceName = String;

/// One `type = [services...]` edge set belonging to a [`DepInfo`].
///
/// Insertion order is preserved; duplicate targets are silently suppressed.
#[derive(Debug, Clone, Default)]
pub struct DepType {
    pub tag: TypeTagHolder,
    services: Vec<ServiceName>,
}

/// `TypeTag` wrapped so `DepType` can derive `Default` for table-driven
/// construction; always overwritten immediately after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeTagHolder(pub TypeTag);

impl Default for TypeTagHolder {
    fn default() -> Self {
        TypeTagHolder(TypeTag::Keyword)
    }
}

impl DepType {
    pub fn new(tag: TypeTag) -> Self {
        Self {
            tag: TypeTagHolder(tag),
            services: Vec::new(),
        }
    }

    pub fn tag(&self) -> TypeTag {
        self.tag.0
    }

    pub fn services(&self) -> &[ServiceName] {
        &self.services
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.iter().any(|s| s == name)
    }

    /// Insert `name`, deduplicating. Returns `true` if it was newly added.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.services.push(name.to_string());
        true
    }

    /// Remove `name` if present. Returns `true` if it was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.services.len();
        self.services.retain(|s| s != name);
        self.services.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// A single service's full set of typed dependencies.
#[derive(Debug, Clone)]
pub struct DepInfo {
    pub service: ServiceName,
    depends: Vec<DepType>,
}

impl DepInfo {
    pub fn new(service: impl Into<ServiceName>) -> Self {
        Self {
            service: service.into(),
            depends: Vec::new(),
        }
    }

    pub fn depends(&self) -> &[DepType] {
        &self.depends
    }

    pub fn get(&self, tag: TypeTag) -> Option<&DepType> {
        self.depends.iter().find(|dt| dt.tag() == tag)
    }

    pub fn get_mut(&mut self, tag: TypeTag) -> Option<&mut DepType> {
        self.depends.iter_mut().find(|dt| dt.tag() == tag)
    }

    /// Get the edge set for `tag`, creating an empty one if absent.
    pub fn entry(&mut self, tag: TypeTag) -> &mut DepType {
        if self.get(tag).is_none() {
            self.depends.push(DepType::new(tag));
        }
        self.get_mut(tag).expect("just inserted")
    }

    /// Insert `target` into this DepInfo's `tag` edge set, then enforce the
    /// `ibefore`/`iafter` mutual-exclusion invariant: inserting into
    /// `ibefore` removes `target` from `iafter` and vice versa for
    /// `iafter`/`ineed`/`iuse`.
    pub fn link(&mut self, tag: TypeTag, target: &str) {
        self.entry(tag).insert(target);

        match tag {
            TypeTag::IBefore => {
                if let Some(dt) = self.get_mut(TypeTag::IAfter) {
                    dt.remove(target);
                }
            }
            TypeTag::IAfter | TypeTag::INeed | TypeTag::IUse => {
                if let Some(dt) = self.get_mut(TypeTag::IBefore) {
                    dt.remove(target);
                }
            }
            _ => {}
        }
    }

    /// Remove `target` from this DepInfo's `tag` edge set, if present.
    pub fn unlink(&mut self, tag: TypeTag, target: &str) {
        if let Some(dt) = self.get_mut(tag) {
            dt.remove(target);
        }
    }

    /// Remove `target` from every edge set this DepInfo owns, dropping any
    /// edge set left empty (there is no "free as a raw block" shortcut here;
    /// the `Vec<DepType>` entry is simply removed and its `Drop` runs).
    pub fn scrub(&mut self, target: &str) {
        for dt in &mut self.depends {
            dt.remove(target);
        }
        self.depends.retain(|dt| !dt.is_empty());
    }
}

/// An ordered sequence of [`DepInfo`] entries, indexed by name for O(1) lookup.
///
/// Insertion order is observable: it drives cache write order and
/// traversal tie-breaking.
#[derive(Debug, Clone, Default)]
pub struct DepTree {
    entries: Vec<DepInfo>,
    index: HashMap<ServiceName, usize>,
}

impl DepTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DepInfo> {
        self.entries.iter()
    }

    pub fn contains(&self, service: &str) -> bool {
        self.index.contains_key(service)
    }

    pub fn get(&self, service: &str) -> Option<&DepInfo> {
        self.index.get(service).map(|&i| &self.entries[i])
    }

    pub fn get_mut(&mut self, service: &str) -> Option<&mut DepInfo> {
        let i = *self.index.get(service)?;
        Some(&mut self.entries[i])
    }

    /// Append a new, empty `DepInfo` for `service` at the tail and return
    /// a mutable reference to it. Panics if `service` already exists --
    /// callers must check [`DepTree::contains`] first via [`DepTree::entry`].
    fn push_new(&mut self, service: &str) -> &mut DepInfo {
        debug_assert!(!self.contains(service));
        self.index.insert(service.to_string(), self.entries.len());
        self.entries.push(DepInfo::new(service));
        self.entries.last_mut().expect("just pushed")
    }

    /// Get the `DepInfo` for `service`, creating an empty one at the tree
    /// tail if it doesn't exist yet.
    pub fn entry(&mut self, service: &str) -> &mut DepInfo {
        if !self.contains(service) {
            return self.push_new(service);
        }
        self.get_mut(service).expect("just checked contains")
    }

    /// Remove the `DepInfo` for `service`, if present, and reindex.
    pub fn remove(&mut self, service: &str) -> Option<DepInfo> {
        let i = self.index.remove(service)?;
        let removed = self.entries.remove(i);
        self.reindex_from(i);
        Some(removed)
    }

    fn reindex_from(&mut self, from: usize) {
        for (i, di) in self.entries.iter().enumerate().skip(from) {
            self.index.insert(di.service.clone(), i);
        }
    }

    /// Remove `name` from every `DepInfo`'s edge sets in the tree.
    pub fn scrub_everywhere(&mut self, name: &str) {
        for di in &mut self.entries {
            di.scrub(name);
        }
    }
}

impl FromIterator<DepInfo> for DepTree {
    fn from_iter<I: IntoIterator<Item = DepInfo>>(iter: I) -> Self {
        let mut tree = DepTree::new();
        for di in iter {
            if !tree.contains(&di.service) {
                tree.index.insert(di.service.clone(), tree.entries.len());
                tree.entries.push(di);
            }
        }
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutual_exclusion_ibefore_wins_then_iafter() {
        let mut di = DepInfo::new("a");
        di.link(TypeTag::IBefore, "b");
        assert!(di.get(TypeTag::IBefore).unwrap().contains("b"));

        di.link(TypeTag::IAfter, "b");
        assert!(di.get(TypeTag::IAfter).unwrap().contains("b"));
        assert!(!di.get(TypeTag::IBefore).unwrap().contains("b"));
    }

    #[test]
    fn scrub_drops_emptied_edge_sets() {
        let mut di = DepInfo::new("a");
        di.link(TypeTag::INeed, "b");
        di.scrub("b");
        assert!(di.get(TypeTag::INeed).is_none());
    }

    #[test]
    fn tree_entry_creates_at_tail_once() {
        let mut tree = DepTree::new();
        tree.entry("a").link(TypeTag::INeed, "b");
        tree.entry("a").link(TypeTag::INeed, "c");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get("a").unwrap().get(TypeTag::INeed).unwrap().services(), &["b", "c"]);
    }

    #[test]
    fn remove_reindexes_remaining_entries() {
        let mut tree = DepTree::new();
        tree.entry("a");
        tree.entry("b");
        tree.entry("c");
        tree.remove("a");
        assert!(tree.get("b").is_some());
        assert!(tree.get("c").is_some());
        assert!(tree.get("a").is_none());
    }
}
