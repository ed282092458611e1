use serde::{Deserialize, Serialize};

/// Who is sitting the exam.
///
/// Built once by the host at its composition root and passed into each session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    user_id: Option<String>,
    display_name: String,
    is_guest: bool,
}

impl AuthContext {
    #[must_use]
    pub fn signed_in(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            display_name: display_name.into(),
            is_guest: false,
        }
    }

    #[must_use]
    pub fn guest() -> Self {
        Self {
            user_id: None,
            display_name: "Guest".to_string(),
            is_guest: true,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.is_guest
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::guest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_has_no_user_id() {
        let ctx = AuthContext::default();
        assert!(ctx.is_guest());
        assert_eq!(ctx.user_id(), None);
        assert_eq!(ctx.display_name(), "Guest");
    }

    #[test]
    fn serializes_flags() {
        let ctx = AuthContext::signed_in("u-17", "Mina");
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["user_id"], "u-17");
        assert_eq!(json["is_guest"], false);
    }
}
