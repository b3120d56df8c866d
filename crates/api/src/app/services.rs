//! Service wiring and the in-memory state behind the routes.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use sitegate_auth::{AuthorizationGate, RedirectPolicy, Role};
use sitegate_core::{DomainError, Failure, UserId, ValidationErrors};

use crate::app::dto::{ContactView, MediaView, PostView, UserView};
use crate::limiter::RateLimiter;
use crate::mailer::Mailer;

pub struct AppServices {
    pub gate: AuthorizationGate,
    pub redirects: RedirectPolicy,
    pub mailer: Arc<dyn Mailer>,
    pub limiter: Arc<dyn RateLimiter>,
    pub content: InMemoryStore<Uuid, PostView>,
    pub media: InMemoryStore<Uuid, MediaView>,
    pub users: UserDirectory,
    pub inbox: InMemoryStore<Uuid, ContactView>,
    pub rate_limit_namespace: String,
    pub contact_inbox: String,
}

/// Ordered in-memory map for dev/tests.
///
/// Lock poisoning surfaces as an `INTERNAL` failure instead of a panic.
#[derive(Debug)]
pub struct InMemoryStore<K, V> {
    inner: RwLock<BTreeMap<K, V>>,
}

impl<K, V> Default for InMemoryStore<K, V> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<K, V> InMemoryStore<K, V>
where
    K: Ord + Copy,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: K, value: V) -> Result<(), Failure> {
        self.inner.write().map_err(poisoned)?.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &K) -> Result<Option<V>, Failure> {
        Ok(self.inner.read().map_err(poisoned)?.get(key).cloned())
    }

    pub fn list(&self) -> Result<Vec<V>, Failure> {
        Ok(self.inner.read().map_err(poisoned)?.values().cloned().collect())
    }

    /// Apply `f` to the stored value; `None` when `key` is absent.
    pub fn update<R>(
        &self,
        key: &K,
        f: impl FnOnce(&mut V) -> Result<R, Failure>,
    ) -> Result<Option<R>, Failure> {
        let mut map = self.inner.write().map_err(poisoned)?;
        match map.get_mut(key) {
            Some(value) => f(value).map(Some),
            None => Ok(None),
        }
    }

    pub fn remove(&self, key: &K) -> Result<Option<V>, Failure> {
        Ok(self.inner.write().map_err(poisoned)?.remove(key))
    }

    /// Run `f` against the whole map under one write guard, so a check and
    /// the insert it guards are atomic.
    pub fn with_write<R>(
        &self,
        f: impl FnOnce(&mut BTreeMap<K, V>) -> Result<R, Failure>,
    ) -> Result<R, Failure> {
        let mut map = self.inner.write().map_err(poisoned)?;
        f(&mut map)
    }
}

fn poisoned<T>(_: T) -> Failure {
    Failure::internal(anyhow::anyhow!("in-memory store lock poisoned"))
}

/// User records keyed by id, with case-insensitive unique emails.
#[derive(Debug, Default)]
pub struct UserDirectory {
    store: InMemoryStore<UserId, UserView>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &self,
        email: &str,
        display_name: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<UserView, Failure> {
        let user = UserView {
            id: UserId::new(),
            email: email.trim().to_ascii_lowercase(),
            display_name: display_name.trim().to_string(),
            role,
            created_at: now,
        };

        self.store.with_write(|users| {
            if users.values().any(|existing| existing.email == user.email) {
                let mut fields = ValidationErrors::new();
                fields.add("email", "Email is already registered");
                return Err(DomainError::conflict("A user with this email already exists")
                    .with_field_errors(fields.into_field_errors())
                    .into());
            }
            users.insert(user.id, user.clone());
            Ok(user)
        })
    }

    pub fn list(&self) -> Result<Vec<UserView>, Failure> {
        self.store.list()
    }

    pub fn get(&self, id: &UserId) -> Result<Option<UserView>, Failure> {
        self.store.get(id)
    }

    /// Change a user's role. Callers cannot change their own role.
    pub fn change_role(&self, actor: UserId, id: UserId, role: Role) -> Result<UserView, Failure> {
        if actor == id {
            return Err(DomainError::conflict("You cannot change your own role").into());
        }
        self.store
            .update(&id, |user| {
                user.role = role;
                Ok(user.clone())
            })?
            .ok_or_else(|| DomainError::not_found("User not found").into())
    }
}
