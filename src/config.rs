// SPDX-FileCopyrightText: 2026 pmxdeploy contributors
// SPDX-License-Identifier: MIT

//! Deployment configuration layout.
//!
//! Specify the layout for the configuration file that pmxdeploy uses to
//! simplify the process of serialization and deserialization. The resulting
//! [`DeployConfig`] is constructed once at startup and passed explicitly into
//! every task, so no task reads shared global state. File I/O is left to the
//! caller to figure out.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Deployment configuration for one target host.
///
/// Carries everything the tasks need: the target host identity, the Python
/// runtime to install, the installation root for the bot's virtualenv, the
/// remote configuration and unit directories, and the pip requirement list.
///
/// The defaults reproduce the DCPython pmxbot deployment. A configuration
/// file only needs to override the fields that differ.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Short hostname of the target server.
    pub host: String,

    /// Domain appended to [`host`](Self::host) to form the FQDN.
    pub domain: String,

    /// User to connect as over SSH. Empty means the operator's login name.
    pub user: String,

    /// Python interpreter used to build the virtualenv.
    pub python: String,

    /// Remote directory holding the bot's virtualenv.
    pub install_root: PathBuf,

    /// Remote directory holding the bot's configuration files.
    pub conf_dir: PathBuf,

    /// Remote directory holding systemd unit files.
    pub unit_dir: PathBuf,

    /// Local directory holding the configuration and unit templates.
    pub template_dir: PathBuf,

    /// Pip requirement specifiers installed into the virtualenv.
    pub packages: Vec<String>,
}

impl DeployConfig {
    /// Fully qualified domain name of the target server.
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.host, self.domain)
    }

    /// User to connect as, falling back to the operator's login name.
    pub fn connection_user(&self) -> String {
        if self.user.is_empty() {
            whoami()
        } else {
            self.user.clone()
        }
    }

    /// Absolute path to a local template by file name.
    pub fn template_path(&self, name: &str) -> PathBuf {
        self.template_dir.join(name)
    }

    /// Remote path of a configuration file under [`conf_dir`](Self::conf_dir).
    pub fn conf_path(&self, name: &str) -> PathBuf {
        self.conf_dir.join(name)
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            host: "kafka2".into(),
            domain: "dcpython.org".into(),
            user: String::new(),
            python: "python3.7".into(),
            install_root: "/opt/pmxbot".into(),
            conf_dir: "/etc/pmxbot".into(),
            unit_dir: "/etc/systemd/system".into(),
            template_dir: "templates".into(),
            packages: [
                "pmxbot[irc,mongodb,viewer]",
                "excuses",
                "popquotes",
                "wolframalpha",
                "jaraco.pmxbot",
                "pmxbot.webhooks",
                "pmxbot.saysomething",
                "pymongo",
                "chucknorris",
                "pmxbot-haiku",
                "twilio",
                "motivation",
                "jaraco.translate",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

impl FromStr for DeployConfig {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: DeployConfig = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on local path fields.
        config.install_root = expand(&config.install_root)?;
        config.template_dir = expand(&config.template_dir)?;

        Ok(config)
    }
}

impl Display for DeployConfig {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

fn expand(path: &Path) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

fn whoami() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "root".into())
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[test]
    fn defaults_reproduce_original_deployment() {
        let config = DeployConfig::default();

        assert_eq!(config.fqdn(), "kafka2.dcpython.org");
        assert_eq!(config.install_root, PathBuf::from("/opt/pmxbot"));
        assert_eq!(
            config.conf_path("main.conf"),
            PathBuf::from("/etc/pmxbot/main.conf")
        );
        assert!(config.packages.iter().any(|p| p.starts_with("pmxbot[")));
    }

    #[test]
    fn parse_overrides_keep_unset_defaults() -> anyhow::Result<()> {
        let result: DeployConfig = indoc! {r#"
            host = "kafka3"
            python = "python3.12"
        "#}
        .parse()?;

        let expect = DeployConfig {
            host: "kafka3".into(),
            python: "python3.12".into(),
            ..Default::default()
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[sealed_test(env = [("BLAH", "/srv/pmxbot")])]
    fn parse_expands_local_paths() -> anyhow::Result<()> {
        let result: DeployConfig = indoc! {r#"
            install_root = "$BLAH"
            template_dir = "$BLAH/templates"
        "#}
        .parse()?;

        assert_eq!(result.install_root, PathBuf::from("/srv/pmxbot"));
        assert_eq!(result.template_dir, PathBuf::from("/srv/pmxbot/templates"));

        Ok(())
    }

    #[test]
    fn serialize_round_trips() -> anyhow::Result<()> {
        let config = DeployConfig::default();
        let parsed: DeployConfig = config.to_string().parse()?;

        assert_eq!(parsed, config);

        Ok(())
    }
}
