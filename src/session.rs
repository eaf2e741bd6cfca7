//! Signed-in identity and auth token, persisted in the local store.

use serde::{Deserialize, Serialize};

use crate::cache::{KvStore, OverrideCache, StorageKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Intern,
  Hr,
}

impl Role {
  pub fn login_path(self) -> &'static str {
    match self {
      Role::Intern => "/auth/login/intern",
      Role::Hr => "/auth/login/hr",
    }
  }
}

/// Token issued by the backend on login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
  pub token: String,
  #[serde(default)]
  pub user_id: String,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub role: Option<String>,
}

/// Who is using the client, for display only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Identity {
  pub id: String,
  pub name: String,
  pub email: String,
  pub role: Option<String>,
}

impl<S: KvStore> OverrideCache<S> {
  pub fn auth_session(&self) -> Option<AuthSession> {
    self
      .get::<AuthSession>(StorageKey::AuthSession)
      .filter(|s| !s.token.trim().is_empty())
  }

  /// The bearer token, if a session exists.
  pub fn token(&self) -> Option<String> {
    self.auth_session().map(|s| s.token)
  }

  pub fn set_auth_session(&self, session: &AuthSession) {
    self.set(StorageKey::AuthSession, session);
  }

  pub fn current_intern(&self) -> Option<Identity> {
    self.get(StorageKey::CurrentIntern)
  }

  pub fn set_current_intern(&self, identity: &Identity) {
    self.set(StorageKey::CurrentIntern, identity);
  }

  pub fn current_hr(&self) -> Option<Identity> {
    self.get(StorageKey::CurrentHr)
  }

  pub fn set_current_hr(&self, identity: &Identity) {
    self.set(StorageKey::CurrentHr, identity);
  }

  /// Forget token and identities. Data overrides are kept.
  pub fn clear_session(&self) {
    self.clear(StorageKey::AuthSession);
    self.clear(StorageKey::CurrentIntern);
    self.clear(StorageKey::CurrentHr);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStore;

  #[test]
  fn test_blank_token_is_no_session() {
    let cache = OverrideCache::new(MemoryStore::new(), "internflow");
    cache.set_auth_session(&AuthSession {
      token: "  ".into(),
      user_id: "1".into(),
      name: None,
      email: None,
      role: None,
    });
    assert!(cache.token().is_none());
  }

  #[test]
  fn test_clear_session_keeps_overrides() {
    let cache = OverrideCache::new(MemoryStore::new(), "internflow");
    cache.set_auth_session(&AuthSession {
      token: "abc".into(),
      user_id: "1".into(),
      name: Some("Asha".into()),
      email: None,
      role: Some("INTERN".into()),
    });
    cache.set_current_intern(&Identity {
      id: "1".into(),
      name: "Asha".into(),
      ..Identity::default()
    });
    cache.set(StorageKey::Leaves, &Vec::<String>::new());

    assert_eq!(cache.token().as_deref(), Some("abc"));
    cache.clear_session();

    assert!(cache.token().is_none());
    assert!(cache.current_intern().is_none());
    assert!(cache.get::<Vec<String>>(StorageKey::Leaves).is_some());
  }
}
