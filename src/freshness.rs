//! mtime-based freshness check deciding whether the cache must be rebuilt.
//! Ported from `rc_newer_than`/`rc_deptree_update_needed`.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// True if `source` is newer than (or as new as) `target`, recursing into
/// `target` if it's a directory and comparing against every non-dotfile
/// entry within it.
///
/// If `source` can't be stat'd, it doesn't exist, so it's never "newer" --
/// returns `false`. If `target` can't be stat'd (broken symlink, raced
/// deletion), `source` is trivially newer than something that isn't
/// there -- returns `true`, and the stat failure on `target` is not
/// propagated as an error (the caller's errno state, in C terms, is left
/// alone; in Rust terms we simply never construct an `io::Error` for it).
pub fn newer_than(source: &Path, target: &Path) -> bool {
    let Ok(source_meta) = fs::metadata(source) else {
        return false;
    };
    let Ok(source_mtime) = source_meta.modified() else {
        return false;
    };

    let Ok(target_meta) = fs::metadata(target) else {
        return true;
    };
    let Ok(target_mtime) = target_meta.modified() else {
        return true;
    };

    if source_mtime < target_mtime {
        return false;
    }

    if !target_meta.is_dir() {
        return true;
    }

    let Ok(entries) = fs::read_dir(target) else {
        return true;
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        if !newer_than(source, &entry.path()) {
            return false;
        }
    }

    true
}

/// Paths the freshness check considers on top of the cache file itself.
#[derive(Debug, Clone, Default)]
pub struct FreshnessInputs {
    pub init_dir: Option<std::path::PathBuf>,
    pub conf_dir: Option<std::path::PathBuf>,
    pub pkg_init_dir: Option<std::path::PathBuf>,
    pub pkg_conf_dir: Option<std::path::PathBuf>,
    pub local_init_dir: Option<std::path::PathBuf>,
    pub local_conf_dir: Option<std::path::PathBuf>,
    pub global_conf_file: Option<std::path::PathBuf>,
    /// Extra file paths from the persisted external-config list.
    pub external_configs: Vec<std::path::PathBuf>,
}

/// Returns `true` (rebuild required) if the cache is absent or older than
/// any of `inputs`.
pub fn rebuild_needed(cache_path: &Path, inputs: &FreshnessInputs) -> bool {
    if !cache_path.exists() {
        return true;
    }

    let candidates = [
        &inputs.init_dir,
        &inputs.conf_dir,
        &inputs.pkg_init_dir,
        &inputs.pkg_conf_dir,
        &inputs.local_init_dir,
        &inputs.local_conf_dir,
        &inputs.global_conf_file,
    ];

    for candidate in candidates.into_iter().flatten() {
        if !newer_than(cache_path, candidate) {
            return true;
        }
    }

    for config in &inputs.external_configs {
        if !newer_than(cache_path, config) {
            return true;
        }
    }

    false
}

/// The cache file's last-modified time, for diagnostics (e.g. the CLI's
/// `list` command logs how old the loaded cache is). `None` if the path
/// doesn't exist or its mtime can't be read.
pub fn cache_age(cache_path: &Path) -> Option<SystemTime> {
    fs::metadata(cache_path).ok()?.modified().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::thread::sleep;
    use std::time::Duration;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        File::create(path).unwrap();
    }

    #[test]
    fn missing_cache_forces_rebuild() {
        let dir = tempdir().unwrap();
        let cache = dir.path().join("deptree");
        assert!(rebuild_needed(&cache, &FreshnessInputs::default()));
    }

    #[test]
    fn newer_cache_than_target_is_fresh() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("init.d");
        fs::create_dir(&target).unwrap();
        touch(&target.join("a.sh"));

        sleep(Duration::from_millis(20));
        let cache = dir.path().join("deptree");
        touch(&cache);

        assert!(newer_than(&cache, &target));
        let inputs = FreshnessInputs {
            init_dir: Some(target),
            ..Default::default()
        };
        assert!(!rebuild_needed(&cache, &inputs));
    }

    #[test]
    fn touching_a_file_inside_dir_after_cache_forces_rebuild() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("init.d");
        fs::create_dir(&target).unwrap();
        touch(&target.join("a.sh"));

        let cache = dir.path().join("deptree");
        touch(&cache);

        sleep(Duration::from_millis(20));
        touch(&target.join("b.sh"));

        let inputs = FreshnessInputs {
            init_dir: Some(target),
            ..Default::default()
        };
        assert!(rebuild_needed(&cache, &inputs));
    }

    #[test]
    fn dotfiles_inside_target_dir_are_ignored() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("init.d");
        fs::create_dir(&target).unwrap();
        touch(&target.join("a.sh"));

        let cache = dir.path().join("deptree");
        touch(&cache);

        sleep(Duration::from_millis(20));
        touch(&target.join(".hidden"));

        assert!(newer_than(&cache, &target));
    }

    #[test]
    fn missing_target_is_always_older() {
        let dir = tempdir().unwrap();
        let cache = dir.path().join("deptree");
        touch(&cache);
        let missing = dir.path().join("does-not-exist");
        assert!(newer_than(&cache, &missing));
    }

    #[test]
    fn missing_source_is_never_newer() {
        let dir = tempdir().unwrap();
        let missing_source = dir.path().join("does-not-exist");
        let target = dir.path().join("target");
        touch(&target);
        assert!(!newer_than(&missing_source, &target));
    }

    #[test]
    fn cache_age_reads_mtime_and_is_none_when_missing() {
        let dir = tempdir().unwrap();
        let cache = dir.path().join("deptree");
        assert!(cache_age(&cache).is_none());

        touch(&cache);
        assert!(cache_age(&cache).is_some());
    }
}
