// SPDX-FileCopyrightText: 2026 pmxdeploy contributors
// SPDX-License-Identifier: MIT

use pmxdeploy::{tasks, DeployConfig, Remote, SecretTool, Secrets, SshRemote};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, process::exit};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  pmxdeploy [options] <task>",
    subcommand_help_heading = "Tasks",
    version
)]
struct Cli {
    /// Path to the deployment configuration file.
    #[arg(short, long, value_name = "path")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let config = load_config(self.config)?;
        let remote = SshRemote::connect(
            config.fqdn().as_str(),
            config.connection_user().as_str(),
        )?;

        self.command.run(&config, &remote)
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Provision a fresh server end to end.
    Bootstrap,

    /// Render and install every pmxbot configuration file.
    InstallConfig,

    /// Enable the deadsnakes PPA and install the Python runtime.
    InstallPython,

    /// Install pmxbot into a virtualenv at the install root.
    InstallBot,

    /// Install, restart, and enable the pmxbot service.
    InstallService,

    /// Install, restart, and enable the pmxbot.web service.
    InstallWebService,

    /// Reinstall the bot's packages and bounce both services.
    Update,

    /// Make sure `hostname -f` answers with a fully qualified name.
    EnsureFqdn,

    /// Put the journal on the large volume.
    ConfigureJournald,
}

impl Command {
    fn run(self, config: &DeployConfig, remote: &dyn Remote) -> Result<()> {
        match self {
            Self::Bootstrap => {
                let secrets = Secrets::fetch(&SecretTool);
                tasks::bootstrap(config, remote, &secrets)
            }
            Self::InstallConfig => {
                let secrets = Secrets::fetch(&SecretTool);
                tasks::install_config(config, remote, &secrets)
            }
            Self::InstallPython => tasks::install_python(config, remote),
            Self::InstallBot => tasks::install_bot(config, remote),
            Self::InstallService => tasks::install_service(config, remote),
            Self::InstallWebService => tasks::install_web_service(config, remote),
            Self::Update => tasks::update(config, remote),
            Self::EnsureFqdn => tasks::ensure_fqdn(config, remote),
            Self::ConfigureJournald => tasks::configure_journald(config, remote),
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<DeployConfig> {
    let path = match path {
        Some(path) => path,
        None => match dirs::config_dir() {
            Some(dir) => dir.join("pmxdeploy").join("config.toml"),
            None => return Ok(DeployConfig::default()),
        },
    };

    if !path.exists() {
        return Ok(DeployConfig::default());
    }

    let data = std::fs::read_to_string(&path)
        .with_context(|| format!("cannot read configuration {path:?}"))?;

    Ok(data
        .parse()
        .with_context(|| format!("cannot parse configuration {path:?}"))?)
}

fn main() {
    let layer = fmt::layer().compact();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry().with(layer).with(filter).init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}
