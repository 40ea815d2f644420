// SPDX-FileCopyrightText: 2026 pmxdeploy contributors
// SPDX-License-Identifier: MIT

//! Templated remote-file deployment.
//!
//! [`upload_template`] is the one piece of this tool with any moving parts:
//! render a local template against a substitution context, stage the result
//! at a unique temporary path on the remote host, resolve the final path
//! (directory destinations take the template's base name), move it into
//! place with sudo, and optionally chmod it.
//!
//! The staged-then-moved dance means no partial content is ever visible at
//! the final path. The directory check and the move are two separate remote
//! commands, so a concurrent actor could change the destination between
//! them; with one operator running one task at a time that race is accepted
//! rather than masked. On failure nothing is cleaned up. A stale file under
//! `/tmp` is harmless and tasks are idempotent by rerun.

use crate::{
    remote::{shell_quote, Remote, RemoteError},
    template::{self, Context, TemplateError},
};

use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Render a local template and install it at `destination` on the remote
/// host.
///
/// If `destination` is an existing remote directory, the file lands inside
/// it under the template's own file name; otherwise `destination` names the
/// file itself. Any existing file at the final path is replaced. `mode`, if
/// given, is applied with `chmod` after the move.
///
/// # Errors
///
/// - Return [`DeployError::ReadTemplate`] if the local template is missing
///   or unreadable.
/// - Return [`DeployError::Render`] if the template and context disagree.
/// - Return [`DeployError::Remote`] if any remote command fails.
pub fn upload_template(
    remote: &dyn Remote,
    local: &Path,
    destination: &Path,
    context: &Context,
    mode: Option<u32>,
) -> Result<()> {
    let text = std::fs::read_to_string(local).map_err(|err| DeployError::ReadTemplate {
        path: local.to_path_buf(),
        source: err,
    })?;
    let rendered = template::render(text.as_str(), context)?;

    // INVARIANT: Staging name must not collide across concurrent runs.
    let staged = PathBuf::from(format!("/tmp/pmxdeploy-{}", Uuid::new_v4()));
    remote.upload(rendered.as_bytes(), &staged)?;

    let final_path = resolve_destination(remote, local, destination);
    debug!("staged {} for {}", staged.display(), final_path.display());

    remote.sudo(
        format!(
            "mv {} {}",
            shell_quote(staged.to_string_lossy().as_ref()),
            shell_quote(final_path.to_string_lossy().as_ref())
        )
        .as_str(),
    )?;

    if let Some(mode) = mode {
        remote.run(
            format!(
                "chmod {mode:o} {}",
                shell_quote(final_path.to_string_lossy().as_ref())
            )
            .as_str(),
        )?;
    }

    info!("deployed {} -> {}", local.display(), final_path.display());

    Ok(())
}

/// Does `path` exist as a regular file on the remote host?
///
/// Warn-tolerant: a failing probe answers `false` instead of aborting.
pub fn exists(remote: &dyn Remote, path: &Path) -> bool {
    remote.probe(format!("test -f {}", shell_quote(path.to_string_lossy().as_ref())).as_str())
}

fn resolve_destination(remote: &dyn Remote, local: &Path, destination: &Path) -> PathBuf {
    let is_dir = remote.probe(
        format!(
            "test -d {}",
            shell_quote(destination.to_string_lossy().as_ref())
        )
        .as_str(),
    );

    match (is_dir, local.file_name()) {
        (true, Some(name)) => destination.join(name),
        _ => destination.to_path_buf(),
    }
}

/// Template deployment error types.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Failed to read the local template file.
    #[error("cannot read template {path:?}")]
    ReadTemplate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Template and substitution context disagree.
    #[error(transparent)]
    Render(#[from] TemplateError),

    /// A remote command or upload failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Friendly result alias :3
pub type Result<T, E = DeployError> = std::result::Result<T, E>;
