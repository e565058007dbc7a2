//! Identity provider adapters

use social_state_domain::{IdentityProvider, UserId};

/// Identity fixed at construction, typically from configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticIdentity {
    viewer: Option<UserId>,
}

impl StaticIdentity {
    pub fn signed_in(viewer: UserId) -> Self {
        Self {
            viewer: Some(viewer),
        }
    }

    /// Nobody signed in; every mutation fails with `AuthRequired`
    pub fn anonymous() -> Self {
        Self { viewer: None }
    }

    pub fn from_config(viewer_id: Option<u64>) -> Self {
        Self {
            viewer: viewer_id.map(UserId),
        }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_viewer(&self) -> Option<UserId> {
        self.viewer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_identity() {
        assert_eq!(StaticIdentity::signed_in(UserId(7)).current_viewer(), Some(UserId(7)));
        assert_eq!(StaticIdentity::anonymous().current_viewer(), None);
        assert_eq!(StaticIdentity::from_config(Some(3)).current_viewer(), Some(UserId(3)));
    }
}
