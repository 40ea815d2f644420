// SPDX-FileCopyrightText: 2026 pmxdeploy contributors
// SPDX-License-Identifier: MIT

//! Secret retrieval from the operator's credential store.
//!
//! Secrets live in the local keyring under service `pmxbot`, one entry per
//! account name. They are looked up at the moment of use and never cached or
//! written anywhere by this tool. A missing entry is not an error: the
//! conditional upload policy in [`crate::tasks`] decides what an absent
//! secret means for each file.
//!
//! To seed an entry:
//!
//! ```text
//! secret-tool store --label='pmxbot IRC password' service pmxbot username irc
//! ```

use std::process::Command;
use tracing::{debug, warn};

/// Keyring service identifier every pmxdeploy secret is stored under.
pub const SERVICE: &str = "pmxbot";

/// Source of secret values, keyed by account name.
pub trait SecretStore {
    /// Fetch the secret for `account`, or `None` if the store has no value.
    fn lookup(&self, account: &str) -> Option<String>;
}

/// [`SecretStore`] backed by the local `secret-tool` command.
#[derive(Default)]
pub struct SecretTool;

impl SecretStore for SecretTool {
    fn lookup(&self, account: &str) -> Option<String> {
        let output = Command::new("secret-tool")
            .args(["lookup", "service", SERVICE, "username", account])
            .output();

        let output = match output {
            Ok(output) => output,
            Err(error) => {
                warn!("secret-tool unavailable: {error}");
                return None;
            }
        };

        if !output.status.success() {
            debug!("no stored secret for account {account:?}");
            return None;
        }

        let value = String::from_utf8_lossy(output.stdout.as_slice())
            .trim_end_matches(['\r', '\n'])
            .to_string();

        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

/// The five secrets the deployment renders into configuration files.
///
/// Each field is `None` when the store has no value for the account.
#[derive(Debug, Default, Clone)]
pub struct Secrets {
    /// IRC nick password (account `irc`).
    pub bot_password: Option<String>,

    /// MongoDB password for pmxbot (account `mongodb`).
    pub db_password: Option<String>,

    /// Twilio API token (account `twilio`).
    pub twilio_token: Option<String>,

    /// Google Translate API key (account `google-translate`).
    pub google_translate_key: Option<String>,

    /// Wolfram|Alpha API key (account `wolframalpha`).
    pub wolframalpha_key: Option<String>,
}

impl Secrets {
    /// Fetch all deployment secrets from `store`.
    pub fn fetch(store: &dyn SecretStore) -> Self {
        Self {
            bot_password: store.lookup("irc"),
            db_password: store.lookup("mongodb"),
            twilio_token: store.lookup("twilio"),
            google_translate_key: store.lookup("google-translate"),
            wolframalpha_key: store.lookup("wolframalpha"),
        }
    }
}

#[cfg(test)]
pub mod mock {
    use super::SecretStore;
    use std::collections::HashMap;

    /// Fixed-answer [`SecretStore`] for task tests.
    #[derive(Default)]
    pub struct StaticSecrets(HashMap<String, String>);

    impl StaticSecrets {
        pub fn new<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
            Self(
                pairs
                    .into_iter()
                    .map(|(account, value)| (account.to_string(), value.to_string()))
                    .collect(),
            )
        }
    }

    impl SecretStore for StaticSecrets {
        fn lookup(&self, account: &str) -> Option<String> {
            self.0.get(account).cloned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{mock::StaticSecrets, Secrets};
    use pretty_assertions::assert_eq;

    #[test]
    fn fetch_maps_accounts_to_fields() {
        let store = StaticSecrets::new([("irc", "hunter2"), ("wolframalpha", "WA-KEY")]);
        let secrets = Secrets::fetch(&store);

        assert_eq!(secrets.bot_password.as_deref(), Some("hunter2"));
        assert_eq!(secrets.wolframalpha_key.as_deref(), Some("WA-KEY"));
        assert_eq!(secrets.db_password, None);
        assert_eq!(secrets.twilio_token, None);
        assert_eq!(secrets.google_translate_key, None);
    }
}
