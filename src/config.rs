//! Configuration file parsing and merging
//!
//! This module handles parsing of `devlam.toml` and `devlam.local.toml`
//! files. The local file overrides the base file: tables merge recursively,
//! arrays and primitives are replaced wholesale.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::classify::MatchRules;
use crate::Result;

/// Main configuration structure for devlam
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project settings
    pub project: ProjectConfig,

    /// Python environment settings
    pub python: PythonConfig,

    /// Install settings
    pub install: InstallConfig,

    /// Deploy settings
    pub deploy: DeployConfig,
}

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project root directory (default: ".")
    pub root: Utf8PathBuf,

    /// Dependency manifest filename (default: "requirements.txt")
    pub manifest: String,

    /// Virtual environment directory (default: ".venv")
    pub venv_dir: Utf8PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: Utf8PathBuf::from("."),
            manifest: "requirements.txt".to_string(),
            venv_dir: Utf8PathBuf::from(".venv"),
        }
    }
}

/// Python environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonConfig {
    /// Interpreter used outside any venv (default: "python3.11")
    pub interpreter: String,

    /// Python version used for site-packages layout (default: "3.11")
    pub version: String,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3.11".to_string(),
            version: "3.11".to_string(),
        }
    }
}

/// Install configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Path prefixes excluded from traversal
    pub exclude: Vec<String>,

    /// Path prefixes marking function-package directories
    pub function_prefixes: Vec<String>,

    /// Path prefixes marking shared-layer directories
    pub layer_prefixes: Vec<String>,

    /// Packages installed before the recursive manifest pass
    pub essential_packages: Vec<String>,

    /// Developer tool packages installed after the recursive manifest pass
    pub tool_packages: Vec<String>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            exclude: [
                ".aws-sam",
                ".venv",
                ".git",
                ".pytest",
                "lib/python",
                "tests/lib/python",
                "experiments",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            function_prefixes: vec!["lambda".to_string()],
            layer_prefixes: vec!["layers".to_string()],
            essential_packages: [
                "h5py",
                "typing-extensions",
                "wheel",
                "setuptools",
                "aws-sam-cli",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            tool_packages: ["pylint", "black", "isort"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Deploy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Immediate subdirectories never treated as stacks
    pub skip_dirs: Vec<String>,

    /// Branch updated before each stack deploy (default: "main")
    pub branch: String,

    /// Attempts per stack before giving up (default: 3)
    pub max_attempts: u32,

    /// Seconds between attempts (default: 5)
    pub retry_delay_secs: u64,

    /// Deploy command run inside each stack directory
    pub command: Vec<String>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            skip_dirs: vec!["aws-common".to_string()],
            branch: "main".to_string(),
            max_attempts: 3,
            retry_delay_secs: 5,
            command: vec!["cdk".to_string(), "deploy".to_string()],
        }
    }
}

impl Config {
    /// Load configuration from a project directory.
    ///
    /// This loads `devlam.toml` and optionally merges `devlam.local.toml`
    /// if it exists.
    pub fn load(project_root: &Utf8Path) -> Result<Self> {
        let config_path = project_root.join("devlam.toml");
        let local_config_path = project_root.join("devlam.local.toml");

        // Load base config if it exists
        let base_config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<toml::Value>(&content)?
        } else {
            toml::Value::Table(toml::map::Map::new())
        };

        // Load local config if it exists
        let local_config = if local_config_path.exists() {
            let content = std::fs::read_to_string(&local_config_path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        } else {
            None
        };

        // Merge configs
        let merged = if let Some(local) = local_config {
            merge_toml_values(base_config, local)
        } else {
            base_config
        };

        // Deserialize merged config
        let config: Config = merged.try_into()?;

        Ok(config)
    }

    /// Load configuration from a string (for testing)
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Classification rules derived from the install section
    pub fn match_rules(&self) -> MatchRules {
        MatchRules {
            exclude: self.install.exclude.clone(),
            function_prefixes: self.install.function_prefixes.clone(),
            layer_prefixes: self.install.layer_prefixes.clone(),
        }
    }
}

/// Merge two TOML values:
/// - Tables: recursively merged
/// - Arrays: local replaces base (not merged)
/// - Primitives: local overrides base
fn merge_toml_values(base: toml::Value, local: toml::Value) -> toml::Value {
    match (base, local) {
        (toml::Value::Table(mut base_table), toml::Value::Table(local_table)) => {
            for (key, local_value) in local_table {
                if let Some(base_value) = base_table.remove(&key) {
                    base_table.insert(key, merge_toml_values(base_value, local_value));
                } else {
                    base_table.insert(key, local_value);
                }
            }
            toml::Value::Table(base_table)
        }
        // For arrays and primitives, local completely overrides base
        (_, local) => local,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.project.root, Utf8PathBuf::from("."));
        assert_eq!(config.project.manifest, "requirements.txt");
        assert_eq!(config.project.venv_dir, Utf8PathBuf::from(".venv"));
        assert_eq!(config.python.interpreter, "python3.11");
        assert_eq!(config.python.version, "3.11");
        assert!(config.install.exclude.contains(&".venv".to_string()));
        assert_eq!(config.install.function_prefixes, vec!["lambda"]);
        assert_eq!(config.install.layer_prefixes, vec!["layers"]);
        assert_eq!(config.deploy.max_attempts, 3);
        assert_eq!(config.deploy.command, vec!["cdk", "deploy"]);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.project.manifest, "requirements.txt");
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
[project]
root = "."
manifest = "requirements.txt"
venv_dir = "venv"

[python]
interpreter = "python3.12"
version = "3.12"

[install]
exclude = [".git", "vendor"]
function_prefixes = ["functions"]
layer_prefixes = ["shared-layers"]
essential_packages = ["wheel"]
tool_packages = []

[deploy]
skip_dirs = ["common"]
branch = "master"
max_attempts = 5
retry_delay_secs = 1
command = ["sam", "deploy"]
"#;

        let config = Config::parse(content).unwrap();

        assert_eq!(config.project.venv_dir, Utf8PathBuf::from("venv"));
        assert_eq!(config.python.interpreter, "python3.12");
        assert_eq!(config.python.version, "3.12");
        assert_eq!(config.install.exclude, vec![".git", "vendor"]);
        assert_eq!(config.install.function_prefixes, vec!["functions"]);
        assert_eq!(config.install.essential_packages, vec!["wheel"]);
        assert!(config.install.tool_packages.is_empty());
        assert_eq!(config.deploy.branch, "master");
        assert_eq!(config.deploy.max_attempts, 5);
        assert_eq!(config.deploy.command, vec!["sam", "deploy"]);
    }

    #[test]
    fn test_merge_configs_via_toml_value() {
        let base = r#"
[python]
version = "3.11"

[install]
exclude = [".git", ".venv"]
essential_packages = ["wheel", "setuptools"]
"#;

        let local = r#"
[python]
version = "3.12"

[install]
essential_packages = ["wheel"]
"#;

        // Simulate what Config::load does
        let base_value: toml::Value = toml::from_str(base).unwrap();
        let local_value: toml::Value = toml::from_str(local).unwrap();
        let merged_value = merge_toml_values(base_value, local_value);
        let merged: Config = merged_value.try_into().unwrap();

        // version should be overridden by local
        assert_eq!(merged.python.version, "3.12");

        // exclude should be from base (local didn't define it)
        assert_eq!(merged.install.exclude, vec![".git", ".venv"]);

        // arrays are replaced, not merged
        assert_eq!(merged.install.essential_packages, vec!["wheel"]);
    }

    #[test]
    fn test_load_from_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_root = Utf8Path::from_path(temp_dir.path()).unwrap();

        let config_content = r#"
[deploy]
max_attempts = 4
skip_dirs = ["aws-common"]
"#;
        std::fs::write(project_root.join("devlam.toml"), config_content).unwrap();

        let local_content = r#"
[deploy]
max_attempts = 1
"#;
        std::fs::write(project_root.join("devlam.local.toml"), local_content).unwrap();

        let config = Config::load(project_root).unwrap();

        // Local should override base
        assert_eq!(config.deploy.max_attempts, 1);
        // Base value should be preserved for non-overridden fields
        assert_eq!(config.deploy.skip_dirs, vec!["aws-common"]);
    }

    #[test]
    fn test_load_missing_config_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project_root = Utf8Path::from_path(temp_dir.path()).unwrap();

        // Both files missing should return default config
        let config = Config::load(project_root).unwrap();

        assert_eq!(config.project.manifest, "requirements.txt");
        assert_eq!(config.install.function_prefixes, vec!["lambda"]);
    }
}
