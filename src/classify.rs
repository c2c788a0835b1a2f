//! Directory classification for the recursive installer
//!
//! Every directory in the project tree is classified once, by prefix-matching
//! its root-relative path against three ordered pattern lists: exclusions,
//! function-package prefixes, and shared-layer prefixes.
//!
//! Matching is a plain string-prefix test on the normalized relative path.
//! This is intentionally loose: an `experiments` rule also matches a
//! directory named `experiments-old`. Both the bare relative spelling and
//! the `./`-prefixed spelling are handled by a single normalization step.

use camino::Utf8Path;

/// Prefix rules driving directory classification
#[derive(Debug, Clone)]
pub struct MatchRules {
    /// Path prefixes that exclude a directory and its entire subtree
    pub exclude: Vec<String>,
    /// Path prefixes marking function-package directories
    pub function_prefixes: Vec<String>,
    /// Path prefixes marking shared-layer directories
    pub layer_prefixes: Vec<String>,
}

/// Classification of a single directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirClass {
    /// Directory (and everything beneath it) is skipped
    Excluded,
    /// Directory is visited; staging targets it matched, if any
    Retained(Targets),
}

/// Staging targets a retained directory matched.
///
/// The two flags are independent: a directory may match zero, one, or both
/// patterns, and both staging installs run when both match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Targets {
    /// Matched a function-package prefix: stage into `<dir>/packages`
    pub function: bool,
    /// Matched a shared-layer prefix: stage into `<dir>/lib/python<ver>/site-packages`
    pub layer: bool,
}

impl DirClass {
    /// Whether the directory is excluded from traversal
    pub fn is_excluded(&self) -> bool {
        matches!(self, DirClass::Excluded)
    }

    /// Staging targets, if the directory is retained
    pub fn targets(&self) -> Targets {
        match self {
            DirClass::Excluded => Targets::default(),
            DirClass::Retained(targets) => *targets,
        }
    }
}

/// Normalize a root-relative path to its bare spelling.
///
/// The shell-era matcher tested prefixes against both `lambda/fn` and
/// `./lambda/fn`; stripping the `./` up front makes one test cover both.
pub fn normalize_rel(rel: &Utf8Path) -> &str {
    let s = rel.as_str();
    s.strip_prefix("./").unwrap_or(s)
}

/// Classify a directory by its root-relative path
pub fn classify(rel: &Utf8Path, rules: &MatchRules) -> DirClass {
    let rel = normalize_rel(rel);

    if rules.exclude.iter().any(|p| rel.starts_with(p.as_str())) {
        return DirClass::Excluded;
    }

    DirClass::Retained(Targets {
        function: rules
            .function_prefixes
            .iter()
            .any(|p| rel.starts_with(p.as_str())),
        layer: rules
            .layer_prefixes
            .iter()
            .any(|p| rel.starts_with(p.as_str())),
    })
}
