//! Human-readable, shell-sourceable cache codec.
//!
//! ```text
//! depinfo_<i>_service='<name>'
//! depinfo_<i>_<type>_<k>='<dep>'
//! ```
//!
//! `<i>` is the DepInfo's index in tree order, `<type>` the edge kind,
//! `<k>` the index of the dependency within its edge set. Both indices are
//! re-synthesized on save, so a tree that was mutated after a prior load
//! still serializes densely.

use std::fs;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::DepError;
use crate::tag::TypeTag;
use crate::tree::{DepInfo, DepTree};

/// Load a tree from `path`. Returns `Ok(None)` if the file doesn't exist --
/// that's the normal "no cache yet" case, not an error. Lines that don't
/// match the `depinfo_<i>_...` grammar, or whose numeric fields don't
/// parse, are skipped silently: a torn or partially-written cache degrades
/// to a partial tree rather than a load failure.
pub fn load(path: &Path) -> io::Result<Option<DepTree>> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut tree = DepTree::new();

    for line in BufReader::new(file).lines() {
        let line = line?;
        let Some(parsed) = parse_line(&line) else {
            continue;
        };

        match parsed {
            ParsedLine::Service { index, name } => {
                if index != tree.len() {
                    // Out-of-order or duplicated index in a torn file: skip.
                    continue;
                }
                tree.entry(&name);
            }
            ParsedLine::Dep { index, tag, value, .. } => {
                if index >= tree.len() {
                    continue;
                }
                let service_name = tree.iter().nth(index).map(|di| di.service.clone());
                let Some(service_name) = service_name else { continue };
                let di = tree.get_mut(&service_name).expect("index valid");
                di.entry(tag).insert(&value);
            }
        }
    }

    Ok(Some(tree))
}

/// Like [`load`], but wraps a genuine I/O failure (not "file doesn't exist")
/// in [`DepError::CacheRead`] for callers that want a single error type
/// instead of a bare `io::Error`.
pub fn load_checked(path: &Path) -> crate::error::Result<Option<DepTree>> {
    load(path).map_err(|source| DepError::CacheRead { path: path.to_path_buf(), source })
}

/// Save `tree` to `path`, inverse of [`load`].
pub fn save(tree: &DepTree, path: &Path) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut out = BufWriter::new(file);

    for (i, di) in tree.iter().enumerate() {
        writeln!(out, "depinfo_{}_service='{}'", i, di.service)?;
        for dt in di.depends() {
            for (k, svc) in dt.services().iter().enumerate() {
                writeln!(out, "depinfo_{}_{}_{}='{}'", i, dt.tag(), k, svc)?;
            }
        }
    }

    out.flush()
}

/// Write `configs` to `path` if non-empty, one path per line, no quoting.
/// Deletes `path` if `configs` is empty.
pub fn save_configs(configs: &[String], path: &Path) -> io::Result<()> {
    if configs.is_empty() {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    } else {
        let file = fs::File::create(path)?;
        let mut out = BufWriter::new(file);
        for c in configs {
            writeln!(out, "{}", c)?;
        }
        out.flush()
    }
}

/// Read back the external-config side file written by [`save_configs`].
/// A missing file is treated as an empty list, not an error.
pub fn load_configs(path: &Path) -> io::Result<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents.lines().map(str::to_string).collect()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

enum ParsedLine {
    Service { index: usize, name: String },
    Dep { index: usize, tag: TypeTag, k: usize, value: String },
}

/// Parse one cache line, returning `None` for anything that doesn't match
/// the `depinfo_<i>_...` grammar.
fn parse_line(line: &str) -> Option<ParsedLine> {
    let rest = line.strip_prefix("depinfo_")?;
    let (index_str, rest) = rest.split_once('_')?;
    let index: usize = index_str.parse().ok()?;

    let (key, value) = rest.split_once('=')?;
    let value = unquote(value)?;

    if key == "service" {
        if value.is_empty() {
            return None;
        }
        return Some(ParsedLine::Service { index, name: value });
    }

    let (type_str, k_str) = key.rsplit_once('_')?;
    let k: usize = k_str.parse().ok()?;
    let tag: TypeTag = type_str.parse().ok()?;
    if value.is_empty() {
        return None;
    }
    Some(ParsedLine::Dep { index, tag, k, value })
}

/// Strip the single-quote wrapping around a cache value.
fn unquote(raw: &str) -> Option<String> {
    let trimmed = raw.trim_end_matches(['\n', '\r']);
    let inner = trimmed.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::TypeTag;
    use tempfile::tempdir;

    fn sample_tree() -> DepTree {
        let mut tree = DepTree::new();
        tree.entry("a").link(TypeTag::INeed, "b");
        tree.entry("a").link(TypeTag::IUse, "c");
        tree.entry("b");
        tree.entry("c");
        tree
    }

    #[test]
    fn round_trip_preserves_order_and_edges() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deptree");
        let tree = sample_tree();

        save(&tree, &path).unwrap();
        let loaded = load(&path).unwrap().unwrap();

        assert_eq!(loaded.len(), tree.len());
        let names: Vec<_> = loaded.iter().map(|di| di.service.clone()).collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string(), "c".to_string()]);

        let a = loaded.get("a").unwrap();
        assert_eq!(a.get(TypeTag::INeed).unwrap().services(), &["b"]);
        assert_eq!(a.get(TypeTag::IUse).unwrap().services(), &["c"]);
    }

    #[test]
    fn missing_file_returns_none_not_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no-such-cache");
        assert!(load(&path).unwrap().is_none());
    }

    #[test]
    fn load_checked_also_treats_missing_file_as_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no-such-cache");
        assert!(load_checked(&path).unwrap().is_none());
    }

    #[test]
    fn malformed_lines_are_skipped_silently() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deptree");
        fs::write(
            &path,
            "depinfo_0_service='a'\n\
             garbage line\n\
             depinfo_0_ineed_0='b'\n\
             depinfo_notanumber_service='x'\n",
        )
        .unwrap();

        let tree = load(&path).unwrap().unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get("a").unwrap().get(TypeTag::INeed).unwrap().services(), &["b"]);
    }

    #[test]
    fn configs_written_only_when_nonempty_and_removed_when_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("depconfig");

        save_configs(&["/etc/syslog-ng/syslog-ng.conf".to_string()], &path).unwrap();
        assert!(path.exists());
        assert_eq!(load_configs(&path).unwrap(), vec!["/etc/syslog-ng/syslog-ng.conf".to_string()]);

        save_configs(&[], &path).unwrap();
        assert!(!path.exists());
        assert_eq!(load_configs(&path).unwrap(), Vec::<String>::new());
    }
}
