//! Project and user configuration.
//!
//! Project settings live in `<root>/.metanet/config.toml`, user settings in
//! `<config_dir>/metanet/config.toml`. Missing files yield defaults; every
//! field is optional in the file.
//!
//! ```toml
//! [decomposition]
//! method = "schuster"
//! split_default = true
//! min_subsystem_size = 5
//!
//! [ora]
//! significance_level = 0.01
//! ```

use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Built-in decomposition strategies selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecompositionMethod {
    /// Reaction subsystem labels from the model (`sbml/subsystem`).
    #[default]
    Predefined,
    /// An arbitrary reaction attribute, see [`DecompositionConfig::attribute_key`].
    Attribute,
    /// Group reactions by compartment.
    Compartment,
    /// Connected components after removing currency metabolites.
    Schuster,
    /// Pathway of origin in a merged disease map.
    DiseaseMap,
}

impl DecompositionMethod {
    /// All methods, in documentation order.
    pub const ALL: [Self; 5] = [
        Self::Predefined,
        Self::Attribute,
        Self::Compartment,
        Self::Schuster,
        Self::DiseaseMap,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Predefined => "predefined",
            Self::Attribute => "attribute",
            Self::Compartment => "compartment",
            Self::Schuster => "schuster",
            Self::DiseaseMap => "disease-map",
        }
    }

    /// Parse a kebab-case method name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectConfig {
    #[serde(default)]
    pub decomposition: DecompositionConfig,
    #[serde(default)]
    pub ora: OraConfig,
    #[serde(default)]
    pub overview: OverviewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecompositionConfig {
    #[serde(default)]
    pub method: DecompositionMethod,
    #[serde(default = "default_attribute_namespace")]
    pub attribute_namespace: String,
    #[serde(default = "default_attribute_key")]
    pub attribute_key: String,
    #[serde(default)]
    pub attribute_separator: Option<String>,
    #[serde(default = "default_true")]
    pub add_transporter: bool,
    #[serde(default = "default_true")]
    pub add_default: bool,
    #[serde(default)]
    pub split_default: bool,
    #[serde(default = "default_min_subsystem_size")]
    pub min_subsystem_size: usize,
    #[serde(default = "default_schuster_degree_threshold")]
    pub schuster_degree_threshold: usize,
    #[serde(default)]
    pub clonable_species: Vec<String>,
    #[serde(default = "default_clone_threshold")]
    pub clone_threshold: usize,
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            method: DecompositionMethod::default(),
            attribute_namespace: default_attribute_namespace(),
            attribute_key: default_attribute_key(),
            attribute_separator: None,
            add_transporter: default_true(),
            add_default: default_true(),
            split_default: false,
            min_subsystem_size: default_min_subsystem_size(),
            schuster_degree_threshold: default_schuster_degree_threshold(),
            clonable_species: Vec::new(),
            clone_threshold: default_clone_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OraConfig {
    #[serde(default = "default_significance_level")]
    pub significance_level: f64,
}

impl Default for OraConfig {
    fn default() -> Self {
        Self {
            significance_level: default_significance_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewConfig {
    /// Clamp for the rendered edge thickness.
    #[serde(default = "default_max_edge_thickness")]
    pub max_edge_thickness: usize,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            max_edge_thickness: default_max_edge_thickness(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

/// Load `<root>/.metanet/config.toml`, or defaults if absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".metanet/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the per-user config, or defaults if absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("metanet/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Merge project config, user config and the `FORMAT` environment variable.
///
/// # Errors
///
/// Returns an error if either config file is malformed.
pub fn resolve_config(project_root: &Path, cli_json: bool) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.as_deref(), env_format.as_deref());

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

fn resolve_output(cli_json: bool, user_output: Option<&str>, env_format: Option<&str>) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    env_format
        .and_then(normalize_output_mode)
        .or_else(|| user_output.and_then(normalize_output_mode))
        .unwrap_or("pretty")
        .to_string()
}

const fn default_true() -> bool {
    true
}

fn default_attribute_namespace() -> String {
    "sbml".to_string()
}

fn default_attribute_key() -> String {
    "subsystem".to_string()
}

const fn default_min_subsystem_size() -> usize {
    3
}

const fn default_schuster_degree_threshold() -> usize {
    8
}

const fn default_clone_threshold() -> usize {
    8
}

const fn default_significance_level() -> f64 {
    0.05
}

const fn default_max_edge_thickness() -> usize {
    20
}
