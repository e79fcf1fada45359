//! Authentication collaborator
//!
//! Sign-in lives outside the check-in core. The splash screen only needs to
//! know whether someone is signed in so it can offer "Sign In" or "Sign Out";
//! scoring and the screen flow never look at identity.

use serde::{Deserialize, Serialize};

/// Identity of a signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Source of the current identity
pub trait AuthProvider {
    fn current_user(&self) -> Option<&UserIdentity>;

    fn sign_out(&mut self);
}

/// What the splash screen's account button does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplashAuthAction {
    SignIn,
    SignOut,
}

impl SplashAuthAction {
    pub fn label(&self) -> &'static str {
        match self {
            SplashAuthAction::SignIn => "Sign In",
            SplashAuthAction::SignOut => "Sign Out",
        }
    }
}

/// Account button action for the splash screen
pub fn splash_auth_action(auth: &dyn AuthProvider) -> SplashAuthAction {
    if auth.current_user().is_some() {
        SplashAuthAction::SignOut
    } else {
        SplashAuthAction::SignIn
    }
}

/// In-process identity holder
#[derive(Debug, Clone, Default)]
pub struct LocalAuth {
    user: Option<UserIdentity>,
}

impl LocalAuth {
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(user: UserIdentity) -> Self {
        Self { user: Some(user) }
    }
}

impl AuthProvider for LocalAuth {
    fn current_user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    fn sign_out(&mut self) {
        if let Some(user) = self.user.take() {
            tracing::debug!(user = %user.id, "signed out");
        }
    }
}
