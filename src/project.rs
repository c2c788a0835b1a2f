//! Project analysis and manifest discovery
//!
//! This module handles:
//! - Project root resolution and configuration loading
//! - Pruned directory traversal (an excluded directory's subtree is never
//!   entered)
//! - Discovery of dependency manifests and their staging classification

use camino::{Utf8Path, Utf8PathBuf};
use walkdir::WalkDir;

use crate::classify::{classify, MatchRules, Targets};
use crate::config::Config;
use crate::{Error, Result};

/// Represents a devlam project tree
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project
    pub root: Utf8PathBuf,

    /// Configuration
    pub config: Config,
}

/// A non-excluded directory containing a dependency manifest
#[derive(Debug, Clone)]
pub struct ManifestDir {
    /// Absolute directory path
    pub dir: Utf8PathBuf,

    /// Path relative to the project root (empty for the root itself)
    pub rel: Utf8PathBuf,

    /// Absolute path of the manifest file
    pub manifest: Utf8PathBuf,

    /// Staging targets this directory matched
    pub targets: Targets,
}

impl ManifestDir {
    /// Relative path for display ("." for the project root)
    pub fn display_rel(&self) -> &str {
        if self.rel.as_str().is_empty() {
            "."
        } else {
            self.rel.as_str()
        }
    }

    /// Staging directory for a function-package bundle
    pub fn function_bundle_dir(&self) -> Utf8PathBuf {
        self.dir.join("packages")
    }

    /// Staging directory for a shared-layer bundle
    pub fn layer_bundle_dir(&self, site_packages: &Utf8Path) -> Utf8PathBuf {
        self.dir.join(site_packages)
    }
}

impl Project {
    /// Discover a project rooted at the given directory
    pub fn discover(root: &Utf8Path) -> Result<Self> {
        let config = Config::load(root)?;
        Self::with_config(root, config)
    }

    /// Discover a project with a specific configuration
    pub fn with_config(root: &Utf8Path, config: Config) -> Result<Self> {
        let root = root.canonicalize_utf8().map_err(|e| {
            Error::project(
                format!("Failed to canonicalize project root: {}", e),
                "Ensure the path exists and is accessible",
            )
        })?;

        Ok(Project { root, config })
    }

    /// Absolute path of the project virtual environment directory
    pub fn venv_dir(&self) -> Utf8PathBuf {
        self.root.join(&self.config.project.venv_dir)
    }

    /// Find every non-excluded directory containing a dependency manifest.
    ///
    /// The whole tree is walked, root included. Exclusions prune the walk,
    /// so nothing beneath an excluded directory is ever inspected. The
    /// result is sorted by relative path for stable reporting.
    pub fn manifest_dirs(&self) -> Result<Vec<ManifestDir>> {
        let rules = self.config.match_rules();
        let manifest_name = &self.config.project.manifest;
        let mut found = Vec::new();

        let walker = WalkDir::new(&self.root).follow_links(true);

        for entry in walker
            .into_iter()
            .filter_entry(|e| should_visit(e, &self.root, &rules))
        {
            let entry = entry.map_err(|e| {
                Error::project(
                    format!("Failed to read directory entry: {}", e),
                    "Check directory permissions",
                )
            })?;

            if !entry.file_type().is_dir() {
                continue;
            }

            let Some(dir) = Utf8Path::from_path(entry.path()) else {
                return Err(Error::project(
                    format!("Path is not valid UTF-8: {:?}", entry.path()),
                    "Ensure all paths are valid UTF-8",
                ));
            };

            let rel = dir.strip_prefix(&self.root).unwrap_or(Utf8Path::new(""));
            let manifest = dir.join(manifest_name);
            if !manifest.is_file() {
                continue;
            }

            let targets = classify(rel, &rules).targets();
            tracing::debug!(dir = %dir, ?targets, "Discovered manifest");

            found.push(ManifestDir {
                dir: dir.to_path_buf(),
                rel: rel.to_path_buf(),
                manifest,
                targets,
            });
        }

        found.sort_by(|a, b| a.rel.cmp(&b.rel));
        Ok(found)
    }
}

/// Check if a directory entry should be visited during traversal
fn should_visit(entry: &walkdir::DirEntry, project_root: &Utf8Path, rules: &MatchRules) -> bool {
    let path = entry.path();

    // Always visit files
    if !entry.file_type().is_dir() {
        return true;
    }

    let Some(utf8_path) = Utf8Path::from_path(path) else {
        return false;
    };

    let rel = utf8_path
        .strip_prefix(project_root)
        .unwrap_or(Utf8Path::new(""));

    !classify(rel, rules).is_excluded()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_manifest(dir: &std::path::Path, contents: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("requirements.txt"), contents).unwrap();
    }

    fn setup_test_project() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        write_manifest(root, "requests==2.0\n");
        write_manifest(&root.join("lambda/fn1"), "requests==2.0\n");
        write_manifest(&root.join("layers/shared"), "boto3==1.2\n");
        write_manifest(&root.join(".venv"), "ignored==9.9\n");
        write_manifest(&root.join("experiments/exp1"), "ignored==9.9\n");
        fs::create_dir_all(root.join("docs")).unwrap();

        temp_dir
    }

    #[test]
    fn test_discover_manifests() {
        let temp_dir = setup_test_project();
        let root = Utf8Path::from_path(temp_dir.path()).unwrap();

        let project = Project::discover(root).unwrap();
        let dirs = project.manifest_dirs().unwrap();

        let rels: Vec<&str> = dirs.iter().map(|d| d.display_rel()).collect();
        assert_eq!(rels, [".", "lambda/fn1", "layers/shared"]);
    }

    #[test]
    fn test_excluded_subtrees_never_inspected() {
        let temp_dir = setup_test_project();
        let root = Utf8Path::from_path(temp_dir.path()).unwrap();

        let project = Project::discover(root).unwrap();
        let dirs = project.manifest_dirs().unwrap();

        assert!(dirs.iter().all(|d| !d.rel.as_str().starts_with(".venv")));
        assert!(dirs
            .iter()
            .all(|d| !d.rel.as_str().starts_with("experiments")));
    }

    #[test]
    fn test_staging_targets_tagged() {
        let temp_dir = setup_test_project();
        let root = Utf8Path::from_path(temp_dir.path()).unwrap();

        let project = Project::discover(root).unwrap();
        let dirs = project.manifest_dirs().unwrap();

        let fn_dir = dirs.iter().find(|d| d.rel == "lambda/fn1").unwrap();
        assert!(fn_dir.targets.function);
        assert!(!fn_dir.targets.layer);
        assert_eq!(fn_dir.function_bundle_dir(), fn_dir.dir.join("packages"));

        let layer_dir = dirs.iter().find(|d| d.rel == "layers/shared").unwrap();
        assert!(layer_dir.targets.layer);
        assert!(!layer_dir.targets.function);
        assert_eq!(
            layer_dir.layer_bundle_dir(Utf8Path::new("lib/python3.11/site-packages")),
            layer_dir.dir.join("lib/python3.11/site-packages")
        );
    }

    #[test]
    fn test_root_manifest_is_plain() {
        let temp_dir = setup_test_project();
        let root = Utf8Path::from_path(temp_dir.path()).unwrap();

        let project = Project::discover(root).unwrap();
        let dirs = project.manifest_dirs().unwrap();

        let root_dir = dirs.iter().find(|d| d.rel.as_str().is_empty()).unwrap();
        assert_eq!(root_dir.display_rel(), ".");
        assert!(!root_dir.targets.function);
        assert!(!root_dir.targets.layer);
    }

    #[test]
    fn test_manifestless_dirs_not_listed() {
        let temp_dir = setup_test_project();
        let root = Utf8Path::from_path(temp_dir.path()).unwrap();

        let project = Project::discover(root).unwrap();
        let dirs = project.manifest_dirs().unwrap();

        assert!(dirs.iter().all(|d| d.rel != "docs"));
    }

    #[test]
    fn test_prefix_looseness_applies_to_siblings() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_manifest(&root.join("experiments-old"), "ignored==9.9\n");
        write_manifest(&root.join("lambda-utils"), "requests==2.0\n");

        let root = Utf8Path::from_path(root).unwrap();
        let project = Project::discover(root).unwrap();
        let dirs = project.manifest_dirs().unwrap();

        // experiments-old shares the `experiments` prefix and is excluded;
        // lambda-utils shares the `lambda` prefix and is a function target.
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].rel, "lambda-utils");
        assert!(dirs[0].targets.function);
    }

    #[test]
    fn test_custom_manifest_name() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("svc")).unwrap();
        fs::write(root.join("svc/deps.txt"), "requests==2.0\n").unwrap();

        fs::write(
            root.join("devlam.toml"),
            "[project]\nmanifest = \"deps.txt\"\n",
        )
        .unwrap();

        let root = Utf8Path::from_path(root).unwrap();
        let project = Project::discover(root).unwrap();
        let dirs = project.manifest_dirs().unwrap();

        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].rel, "svc");
    }
}
