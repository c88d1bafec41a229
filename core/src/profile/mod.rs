//! Static profile data
//!
//! The site owner's resume, loaded from TOML. A built-in profile ships with
//! the crate; a custom one can be pointed to from `folio.toml`. Nothing here
//! is mutated at runtime.

mod context;

pub use context::{ContactInfo, ProfileContext, ProjectSummary};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const BUILTIN_PROFILE: &str = include_str!("../../assets/profile.toml");

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("failed to read profile {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid profile data: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("profile is missing a {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillGroup {
    pub category: String,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub company: String,
    pub title: String,
    pub period: String,
    #[serde(default)]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub period: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// The owner's resume as authored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub role: String,
    pub location: String,
    pub personality: String,
    pub summary: String,
    #[serde(default)]
    pub goals: Option<String>,
    pub contact: Contact,
    #[serde(default)]
    pub skills: Vec<SkillGroup>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
}

impl Profile {
    /// The profile compiled into the crate
    pub fn builtin() -> Result<Self, ProfileError> {
        Self::parse(BUILTIN_PROFILE)
    }

    pub fn parse(content: &str) -> Result<Self, ProfileError> {
        let profile: Profile = toml::from_str(content)?;
        profile.check()?;
        Ok(profile)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ProfileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Load `path` if given, otherwise the built-in profile
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, ProfileError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    /// Fresh read-only projection used by templates and the system prompt
    pub fn context(&self) -> ProfileContext {
        ProfileContext::from_profile(self)
    }

    fn check(&self) -> Result<(), ProfileError> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::Missing("name"));
        }
        if self.contact.email.trim().is_empty() {
            return Err(ProfileError::Missing("contact email"));
        }
        Ok(())
    }
}
