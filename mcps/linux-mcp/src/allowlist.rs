//! The set of command names whitelisted mode will run

use std::collections::BTreeSet;
use std::sync::Arc;

/// Immutable allowed-command set, shared between server clones
#[derive(Debug, Clone, Default)]
pub struct AllowedCommands {
    names: Arc<BTreeSet<String>>,
}

impl AllowedCommands {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        Self {
            names: Arc::new(names),
        }
    }

    /// Membership test on the base name of `command`
    pub fn contains(&self, command: &str) -> bool {
        self.names.contains(base_name(command))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn to_set(&self) -> BTreeSet<String> {
        self.names.as_ref().clone()
    }
}

/// Final path component: `/usr/bin/ls` -> `ls`
pub fn base_name(command: &str) -> &str {
    command.rsplit('/').next().unwrap_or(command)
}
