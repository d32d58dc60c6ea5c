//! Builder: the five-phase construction of a `DepTree` from a producer
//! stream.
//!
//! Phase 1 parse & merge, Phase 2 platform filter, Phase 3 provider
//! synthesis, Phase 4 back-edge inference, Phase 5 persist.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::cache;
use crate::context::libdir_for_producer;
use crate::error::{DepError, Result};
use crate::tag::{TypeTag, DEP_PAIRS};
use crate::tree::DepTree;

/// A lazy source of producer lines. The real producer is a shell script
/// that sources every init script and config in turn and echoes its
/// dependency info to stdout (out of scope here); this trait is the seam
/// so the builder never depends on a subprocess directly.
pub trait ProducerSource {
    /// Yield every line the producer emits, in order.
    fn lines(&mut self) -> Result<Vec<String>>;
}

/// A fixed, in-memory producer source -- used by tests and by any caller
/// that already has the raw stream (e.g. read from a file).
pub struct StaticSource(pub Vec<String>);

impl ProducerSource for StaticSource {
    fn lines(&mut self) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

/// Invokes a shell helper via `popen`-equivalent `Command` and reads its
/// stdout line by line, exactly as `rc_deptree_update`'s `popen(GENDEP, "r")`
/// does. Exports `RC_LIBDIR` into the child's environment if the parent
/// doesn't already have it set.
pub struct CommandSource {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CommandSource {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }
}

impl ProducerSource for CommandSource {
    fn lines(&mut self) -> Result<Vec<String>> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if std::env::var_os("RC_LIBDIR").is_none() {
            cmd.env("RC_LIBDIR", libdir_for_producer());
        }

        let output = cmd
            .output()
            .map_err(|e| DepError::Producer(format!("failed to launch {}: {}", self.program.display(), e)))?;

        if !output.status.success() {
            return Err(DepError::Producer(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).lines().map(str::to_string).collect())
    }
}

/// A non-fatal diagnostic collected during a build, in addition to being
/// logged through `log::warn!` as it's discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepWarning {
    /// An `ineed` edge named a service with no matching `DepInfo`.
    DanglingNeed { service: String, target: String },
}

/// Result of a successful (or partially successful) build.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub tree: DepTree,
    pub configs: Vec<String>,
    pub warnings: Vec<DepWarning>,
}

/// Run phases 1-4 of the build against the lines yielded by `source`, with
/// optional per-platform filtering (`sys`). Does not touch disk -- see
/// [`build_and_persist`] for Phase 5.
pub fn build(source: &mut dyn ProducerSource, sys: Option<&str>) -> Result<BuildOutcome> {
    let lines = source.lines()?;

    let (mut tree, configs) = phase1_parse_and_merge(&lines);
    if let Some(sys) = sys {
        phase2_platform_filter(&mut tree, sys);
    }
    phase3_provider_synthesis(&mut tree);
    let warnings = phase4_back_edge_inference(&mut tree);

    Ok(BuildOutcome { tree, configs, warnings })
}

/// Run the full five-phase build and persist the result to `cache_path`
/// (with the external-config side file at `configs_path`). On a cache
/// write failure, the error still carries the built `BuildOutcome` so the
/// caller isn't left without a usable tree.
pub fn build_and_persist(
    source: &mut dyn ProducerSource,
    sys: Option<&str>,
    cache_path: &Path,
    configs_path: &Path,
) -> Result<BuildOutcome> {
    let outcome = build(source, sys)?;

    if let Err(e) = cache::save(&outcome.tree, cache_path) {
        log::error!("failed to write cache {}: {}", cache_path.display(), e);
        return Err(DepError::CacheWrite {
            path: cache_path.to_path_buf(),
            source: e,
            outcome: Box::new(outcome),
        });
    }

    if let Err(e) = cache::save_configs(&outcome.configs, configs_path) {
        log::error!("failed to write config list {}: {}", configs_path.display(), e);
        return Err(DepError::CacheWrite {
            path: configs_path.to_path_buf(),
            source: e,
            outcome: Box::new(outcome),
        });
    }

    Ok(outcome)
}

/// Phase 1: parse `SERVICE TYPE DEP1 DEP2 ...` lines, merging edges into a
/// fresh tree and enforcing `ibefore`/`iafter` mutual exclusion as each
/// token is inserted. `config` lines feed a side list instead of the tree.
fn phase1_parse_and_merge(lines: &[String]) -> (DepTree, Vec<String>) {
    let mut tree = DepTree::new();
    let mut configs = Vec::new();

    for line in lines {
        let mut tokens = line.split_whitespace();
        let Some(service) = tokens.next() else { continue };

        // Touch the DepInfo even if this line turns out to carry no
        // recognized tag, so a bare `SERVICE` mention still materializes it.
        tree.entry(service);

        let Some(type_str) = tokens.next() else { continue };

        if type_str == "config" {
            configs.extend(tokens.map(str::to_string));
            continue;
        }

        let Ok(tag) = type_str.parse::<TypeTag>() else {
            continue;
        };

        for token in tokens {
            if token.is_empty() {
                continue;
            }
            if token.ends_with(".sh") {
                continue;
            }
            if let Some(target) = token.strip_prefix('!') {
                tree.entry(service).unlink(tag, target);
                continue;
            }
            tree.entry(service).link(tag, token);
        }
    }

    (tree, configs)
}

/// Phase 2: if `sys` is set, compute `nosys = "no" + lowercase(sys)` and
/// remove every DepInfo whose `keyword` set contains it, scrubbing it (and
/// its `iprovide` names) from every remaining DepInfo's edge sets.
fn phase2_platform_filter(tree: &mut DepTree, sys: &str) {
    let nosys = format!("no{}", sys.to_lowercase());

    let doomed: Vec<String> = tree
        .iter()
        .filter(|di| di.get(TypeTag::Keyword).is_some_and(|dt| dt.contains(&nosys)))
        .map(|di| di.service.clone())
        .collect();

    for name in doomed {
        let provided: Vec<String> = tree
            .get(&name)
            .and_then(|di| di.get(TypeTag::IProvide))
            .map(|dt| dt.services().to_vec())
            .unwrap_or_default();

        tree.remove(&name);
        tree.scrub_everywhere(&name);
        for provided_name in &provided {
            tree.scrub_everywhere(provided_name);
        }
    }
}

/// Phase 3: materialize an empty DepInfo for every virtual name mentioned
/// in an `iprovide` set that isn't already a tree entry. Providers are
/// appended after the real services, in first-encounter order.
fn phase3_provider_synthesis(tree: &mut DepTree) {
    let mut to_create = Vec::new();
    for di in tree.iter() {
        if let Some(dt) = di.get(TypeTag::IProvide) {
            for name in dt.services() {
                if !tree.contains(name) && !to_create.contains(name) {
                    to_create.push(name.clone());
                }
            }
        }
    }
    for name in to_create {
        tree.entry(&name);
    }
}

/// Phase 4: for every forward edge `A --t--> B`, append `A` to `B`'s
/// inferred-reverse edge set, creating it if absent. Dangling `ineed`
/// targets are logged and collected as warnings but otherwise skipped.
fn phase4_back_edge_inference(tree: &mut DepTree) -> Vec<DepWarning> {
    let mut warnings = Vec::new();

    // Collect `(from, tag, to)` triples first: the inference can't mutate
    // the target's DepInfo while holding a borrow of the source's.
    let mut edges = Vec::new();
    for di in tree.iter() {
        for &(fwd, rev) in DEP_PAIRS {
            if let Some(dt) = di.get(fwd) {
                for target in dt.services() {
                    edges.push((di.service.clone(), fwd, rev, target.clone()));
                }
            }
        }
    }

    for (from, fwd, rev, to) in edges {
        if !tree.contains(&to) {
            if fwd == TypeTag::INeed {
                log::warn!("service `{}' needs non existant service `{}'", from, to);
                warnings.push(DepWarning::DanglingNeed { service: from, target: to });
            }
            continue;
        }
        tree.entry(&to).entry(rev).insert(&from);
    }

    warnings
}
