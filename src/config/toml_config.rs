use crate::domain::model::Service;
use crate::utils::error::{FinderError, Result};
use crate::utils::validation::{
    parse_github_repository, validate_non_empty_string, validate_required_field,
    validate_resolved, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_PAGURE_URL: &str = "https://pagure.io/";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com/graphql";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FinderConfig {
    #[serde(rename = "General")]
    pub general: GeneralConfig,
    #[serde(rename = "Pagure", default)]
    pub pagure: PagureConfig,
    #[serde(rename = "GitHub", default)]
    pub github: GitHubConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    pub usernames: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PagureConfig {
    pub enable: bool,
    #[serde(default = "default_pagure_url")]
    pub pagure_url: String,
    #[serde(default)]
    pub excludes: Vec<String>,
    #[serde(default)]
    pub repositories: Vec<String>,
    #[serde(default)]
    pub usernames: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitHubConfig {
    pub enable: bool,
    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,
    pub github_api_token: Option<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
    #[serde(default)]
    pub repositories: Vec<String>,
    #[serde(default)]
    pub usernames: HashMap<String, String>,
}

/// The per-service part of the configuration the aggregator works from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceSettings {
    pub usernames: HashMap<String, String>,
    pub excludes: Vec<String>,
    pub repositories: Vec<String>,
}

fn default_pagure_url() -> String {
    DEFAULT_PAGURE_URL.to_string()
}

fn default_github_api_url() -> String {
    DEFAULT_GITHUB_API_URL.to_string()
}

impl Default for PagureConfig {
    fn default() -> Self {
        Self {
            enable: false,
            pagure_url: default_pagure_url(),
            excludes: Vec::new(),
            repositories: Vec::new(),
            usernames: HashMap::new(),
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            enable: false,
            github_api_url: default_github_api_url(),
            github_api_token: None,
            excludes: Vec::new(),
            repositories: Vec::new(),
            usernames: HashMap::new(),
        }
    }
}

impl FinderConfig {
    /// Loads, parses and validates the configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(FinderError::IoError)?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses without validating.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FinderError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR_NAME}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FinderError::ConfigError {
            message: format!("Invalid placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn is_enabled(&self, service: Service) -> bool {
        match service {
            Service::Pagure => self.pagure.enable,
            Service::GitHub => self.github.enable,
        }
    }

    /// Services in report order, enabled ones only.
    pub fn enabled_services(&self) -> Vec<Service> {
        [Service::Pagure, Service::GitHub]
            .into_iter()
            .filter(|service| self.is_enabled(*service))
            .collect()
    }

    pub fn settings(&self, service: Service) -> ServiceSettings {
        match service {
            Service::Pagure => ServiceSettings {
                usernames: self.pagure.usernames.clone(),
                excludes: self.pagure.excludes.clone(),
                repositories: self.pagure.repositories.clone(),
            },
            Service::GitHub => ServiceSettings {
                usernames: self.github.usernames.clone(),
                excludes: self.github.excludes.clone(),
                repositories: self.github.repositories.clone(),
            },
        }
    }

    /// Token of an enabled GitHub section; present once validation passed.
    pub fn github_token(&self) -> Result<&str> {
        validate_required_field("GitHub.github_api_token", &self.github.github_api_token)
            .map(String::as_str)
    }

    fn validate_usernames(&self, section: &str, usernames: &HashMap<String, String>) -> Result<()> {
        for user in &self.general.usernames {
            let mapped = usernames
                .get(user)
                .ok_or_else(|| FinderError::MissingConfigError {
                    field: format!("{}.usernames.{}", section, user),
                })?;
            validate_non_empty_string(&format!("{}.usernames.{}", section, user), mapped)?;
        }
        Ok(())
    }

    fn validate_repositories(section: &str, repositories: &[String]) -> Result<()> {
        for repository in repositories {
            validate_url(&format!("{}.repositories", section), repository)?;
        }
        Ok(())
    }

    pub fn validate_config(&self) -> Result<()> {
        for user in &self.general.usernames {
            validate_non_empty_string("General.usernames", user)?;
        }

        if self.pagure.enable {
            validate_url("Pagure.pagure_url", &self.pagure.pagure_url)?;
            self.validate_usernames("Pagure", &self.pagure.usernames)?;
            Self::validate_repositories("Pagure", &self.pagure.repositories)?;
        }

        if self.github.enable {
            validate_url("GitHub.github_api_url", &self.github.github_api_url)?;
            let token = self.github_token()?;
            validate_non_empty_string("GitHub.github_api_token", token)?;
            validate_resolved("GitHub.github_api_token", token)?;
            self.validate_usernames("GitHub", &self.github.usernames)?;
            Self::validate_repositories("GitHub", &self.github.repositories)?;
            for repository in &self.github.repositories {
                parse_github_repository(repository).map_err(|reason| {
                    FinderError::InvalidConfigValueError {
                        field: "GitHub.repositories".to_string(),
                        value: repository.clone(),
                        reason,
                    }
                })?;
            }
        }

        Ok(())
    }
}

impl Validate for FinderConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
