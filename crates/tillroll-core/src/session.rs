//! Session and role gate
//!
//! Wraps `LocalStorage` with the rules for the authenticated identity: a
//! session exists only when both a token and a readable cached user are
//! stored. Everything that needs to know "is this an admin?" asks here.

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::{Theme, User};
use crate::storage::{LocalStorage, THEME_KEY, TOKEN_KEY, USER_KEY};

#[derive(Debug)]
pub struct Session {
    storage: LocalStorage,
    token: Option<String>,
    user: Option<User>,
}

impl Session {
    /// Restore a session from storage, clearing partial or corrupt state
    pub fn restore(mut storage: LocalStorage) -> Result<Self> {
        let token = storage.get(TOKEN_KEY).map(str::to_string);
        let user = match storage.get(USER_KEY) {
            Some(raw) => match serde_json::from_str::<User>(raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("Cached user is unreadable, clearing session: {}", e);
                    None
                }
            },
            None => None,
        };

        match (token, user) {
            (Some(token), Some(user)) if !token.is_empty() => Ok(Self {
                storage,
                token: Some(token),
                user: Some(user),
            }),
            _ => {
                storage.remove_all(&[TOKEN_KEY, USER_KEY])?;
                Ok(Self {
                    storage,
                    token: None,
                    user: None,
                })
            }
        }
    }

    /// Record a successful login
    pub fn establish(&mut self, token: &str, user: User) -> Result<()> {
        if token.is_empty() {
            return Err(Error::Parse("login response has no token".into()));
        }
        self.storage.set(TOKEN_KEY, token)?;
        self.storage.set(USER_KEY, serde_json::to_string(&user)?)?;
        info!(user = %user.email, role = %user.role, "Session established");
        self.token = Some(token.to_string());
        self.user = Some(user);
        Ok(())
    }

    /// Replace the cached profile (after `GET /users/me`)
    pub fn update_user(&mut self, user: User) -> Result<()> {
        if self.token.is_none() {
            return Err(Error::NotAuthenticated);
        }
        self.storage.set(USER_KEY, serde_json::to_string(&user)?)?;
        self.user = Some(user);
        Ok(())
    }

    /// Forget the identity; the theme preference is kept
    pub fn clear(&mut self) -> Result<()> {
        self.token = None;
        self.user = None;
        self.storage.remove_all(&[TOKEN_KEY, USER_KEY])
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_admin)
    }

    /// Fail with `AccessDenied` unless the current user is an admin
    pub fn require_admin(&self) -> Result<()> {
        if !self.is_authenticated() {
            return Err(Error::NotAuthenticated);
        }
        if !self.is_admin() {
            return Err(Error::AccessDenied("admin role required".into()));
        }
        Ok(())
    }

    pub fn theme(&self) -> Theme {
        self.storage
            .get(THEME_KEY)
            .and_then(|t| t.parse().ok())
            .unwrap_or_default()
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<()> {
        self.storage.set(THEME_KEY, theme.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn user(role: Role) -> User {
        User {
            id: 1,
            name: "Meera".into(),
            email: "meera@example.com".into(),
            role,
            created_at: None,
        }
    }

    #[test]
    fn test_restore_requires_token_and_user() {
        let mut storage = LocalStorage::in_memory();
        storage.set(TOKEN_KEY, "t").unwrap();
        let session = Session::restore(storage).unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
    }

    #[test]
    fn test_restore_valid_session() {
        let mut storage = LocalStorage::in_memory();
        storage.set(TOKEN_KEY, "t").unwrap();
        storage
            .set(USER_KEY, serde_json::to_string(&user(Role::User)).unwrap())
            .unwrap();

        let session = Session::restore(storage).unwrap();
        assert!(session.is_authenticated());
        assert!(!session.is_admin());
        assert_eq!(session.user().unwrap().name, "Meera");
    }

    #[test]
    fn test_restore_clears_corrupt_user() {
        let mut storage = LocalStorage::in_memory();
        storage.set(TOKEN_KEY, "t").unwrap();
        storage.set(USER_KEY, "{broken").unwrap();

        let session = Session::restore(storage).unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(session.storage.get(TOKEN_KEY), None);
    }

    #[test]
    fn test_establish_and_clear() {
        let mut session = Session::restore(LocalStorage::in_memory()).unwrap();
        session.set_theme(Theme::Dark).unwrap();
        session.establish("tok", user(Role::Admin)).unwrap();
        assert!(session.is_admin());
        assert!(session.require_admin().is_ok());

        session.clear().unwrap();
        assert!(!session.is_authenticated());
        assert!(matches!(session.require_admin(), Err(Error::NotAuthenticated)));
        assert_eq!(session.theme(), Theme::Dark);
    }

    #[test]
    fn test_require_admin_denies_regular_user() {
        let mut session = Session::restore(LocalStorage::in_memory()).unwrap();
        session.establish("tok", user(Role::User)).unwrap();
        assert!(matches!(session.require_admin(), Err(Error::AccessDenied(_))));
    }

    #[test]
    fn test_establish_rejects_empty_token() {
        let mut session = Session::restore(LocalStorage::in_memory()).unwrap();
        assert!(session.establish("", user(Role::User)).is_err());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_theme_defaults_to_light() {
        let session = Session::restore(LocalStorage::in_memory()).unwrap();
        assert_eq!(session.theme(), Theme::Light);
    }
}
