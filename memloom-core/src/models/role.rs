use serde::{Deserialize, Serialize};

/// Canonical message role. Provider-native roles are mapped onto this set at
/// parse time; anything unrecognized defaults to `Assistant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Maps a provider-native role string through `synonyms`, falling back to
    /// `Assistant` for anything unrecognized. `synonyms` is checked
    /// case-insensitively.
    pub fn from_provider_str(raw: &str, synonyms: &[(&str, Role)]) -> Role {
        let lower = raw.trim().to_lowercase();
        synonyms
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(&lower))
            .map(|(_, role)| *role)
            .unwrap_or(Role::Assistant)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
