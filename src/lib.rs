// SPDX-FileCopyrightText: 2026 pmxdeploy contributors
// SPDX-License-Identifier: MIT

//! Provision a single server to run the pmxbot IRC bot.
//!
//! pmxdeploy connects to one target host over SSH and runs short, linear
//! provisioning tasks: install the Python runtime, build the bot's
//! virtualenv, render configuration templates with secrets from the local
//! credential store, and manage the systemd units. There is no orchestration
//! across hosts, no rollback, and no retry logic; every task is idempotent
//! by rerun.

pub mod config;
pub mod deploy;
pub mod remote;
pub mod secrets;
pub mod tasks;
pub mod template;

pub use config::DeployConfig;
pub use remote::{Remote, SshRemote};
pub use secrets::{SecretStore, SecretTool, Secrets};
