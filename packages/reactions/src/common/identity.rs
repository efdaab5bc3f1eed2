use std::fmt;

/// The resolved display name of the user publishing from this session.
///
/// Always non-empty. Construct through [`Identity::new`], which refuses blank
/// usernames, so every message built from an `Identity` carries a real name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    username: String,
}

impl Identity {
    /// Returns `None` when the username is empty or whitespace-only.
    pub fn new(username: impl Into<String>) -> Option<Self> {
        let username = username.into();
        if username.trim().is_empty() {
            return None;
        }
        Some(Self { username })
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

/// Path of the identity-acquisition page, returning to `route` afterwards.
///
/// Example: `/session42/react` -> `/profile?redirect=%2Fsession42%2Freact`
pub fn profile_redirect_path(route: &str) -> String {
    format!("/profile?redirect={}", urlencoding::encode(route))
}
