use crate::core::propagation::PropagationPolicy;
use crate::utils::error::{HarnessError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_REGION: &str = "us-west-2";
pub const DEFAULT_PROGRAM: &str = "sls";
pub const DEFAULT_TESTS_ROOT: &str = "test/integration-tests";

/// Harness settings. Every section and field is optional in TOML and falls back to the defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub aws: AwsSettings,
    pub shell: ShellSettings,
    pub http: HttpSettings,
    pub dns: DnsSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsSettings {
    pub region: String,
    pub profile: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellSettings {
    pub program: String,
    pub tests_root: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsSettings {
    pub retry_interval_seconds: u64,
    pub max_retries: u32,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            profile: None,
        }
    }
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            tests_root: DEFAULT_TESTS_ROOT.to_string(),
            timeout_seconds: 30 * 60,
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

impl Default for DnsSettings {
    fn default() -> Self {
        let policy = PropagationPolicy::default();
        Self {
            retry_interval_seconds: policy.interval.as_secs(),
            max_retries: policy.max_attempts,
        }
    }
}

impl HarnessConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(HarnessError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| HarnessError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| HarnessError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from defaults overridden by whatever `lookup` returns for the known keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(profile) = lookup("AWS_PROFILE").filter(|p| !p.trim().is_empty()) {
            self.aws.profile = Some(profile);
        }
        if let Some(region) = lookup("AWS_REGION") {
            self.aws.region = region;
        }
        if let Some(program) = lookup("SLS_PROGRAM") {
            self.shell.program = program;
        }
        if let Some(root) = lookup("TESTS_ROOT") {
            self.shell.tests_root = root;
        }
        if let Some(value) = lookup("DNS_RETRY_INTERVAL_SECONDS") {
            self.dns.retry_interval_seconds = parse_number("DNS_RETRY_INTERVAL_SECONDS", &value)?;
        }
        if let Some(value) = lookup("DNS_MAX_RETRIES") {
            self.dns.max_retries = parse_number("DNS_MAX_RETRIES", &value)?;
        }
        Ok(())
    }

    pub fn propagation_policy(&self) -> PropagationPolicy {
        PropagationPolicy::new(
            Duration::from_secs(self.dns.retry_interval_seconds),
            self.dns.max_retries,
        )
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.shell.timeout_seconds)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    pub fn tests_root(&self) -> PathBuf {
        PathBuf::from(&self.shell.tests_root)
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| HarnessError::InvalidConfigValueError {
            field: field.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

impl Validate for HarnessConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_aws_region("aws.region", &self.aws.region)?;
        if let Some(profile) = &self.aws.profile {
            validation::validate_non_empty_string("aws.profile", profile)?;
        }

        validation::validate_non_empty_string("shell.program", &self.shell.program)?;
        validation::validate_path("shell.tests_root", &self.shell.tests_root)?;
        validation::validate_range("shell.timeout_seconds", self.shell.timeout_seconds, 1, 24 * 3600)?;

        validation::validate_range("http.timeout_seconds", self.http.timeout_seconds, 1, 600)?;

        validation::validate_range("dns.max_retries", self.dns.max_retries, 1, 1000)?;
        validation::validate_range(
            "dns.retry_interval_seconds",
            self.dns.retry_interval_seconds,
            0,
            3600,
        )?;

        tracing::debug!("Harness configuration validation passed");
        Ok(())
    }
}
