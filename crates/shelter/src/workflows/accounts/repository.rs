use std::collections::BTreeMap;
use std::sync::Mutex;

use super::domain::User;
use crate::workflows::identity::UserId;
use crate::workflows::repository::RepositoryError;

/// Storage for visitor profiles. `insert` must reject a duplicate username or
/// (case-insensitive) e-mail with `RepositoryError::Conflict`.
pub trait UserRepository: Send + Sync {
    fn insert(&self, user: User) -> Result<User, RepositoryError>;
    fn update(&self, user: User) -> Result<(), RepositoryError>;
    /// Drops a user that never finished registering.
    fn remove(&self, id: UserId) -> Result<(), RepositoryError>;
    fn fetch(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
}

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: Mutex<BTreeMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_users<T>(
        &self,
        work: impl FnOnce(&mut BTreeMap<UserId, User>) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut guard = self
            .users
            .lock()
            .map_err(|_| RepositoryError::Unavailable("user table lock poisoned".to_string()))?;
        work(&mut guard)
    }
}

fn email_taken(users: &BTreeMap<UserId, User>, email: &str, except: Option<UserId>) -> bool {
    users
        .values()
        .any(|user| Some(user.id) != except && user.email.eq_ignore_ascii_case(email))
}

impl UserRepository for InMemoryUserRepository {
    fn insert(&self, user: User) -> Result<User, RepositoryError> {
        self.with_users(|users| {
            let username_taken = users
                .values()
                .any(|existing| existing.username == user.username);
            if users.contains_key(&user.id)
                || username_taken
                || email_taken(users, &user.email, None)
            {
                return Err(RepositoryError::Conflict);
            }
            users.insert(user.id, user.clone());
            Ok(user)
        })
    }

    fn update(&self, user: User) -> Result<(), RepositoryError> {
        self.with_users(|users| {
            if !users.contains_key(&user.id) {
                return Err(RepositoryError::NotFound);
            }
            if email_taken(users, &user.email, Some(user.id)) {
                return Err(RepositoryError::Conflict);
            }
            users.insert(user.id, user);
            Ok(())
        })
    }

    fn remove(&self, id: UserId) -> Result<(), RepositoryError> {
        self.with_users(|users| {
            users.remove(&id).map(|_| ()).ok_or(RepositoryError::NotFound)
        })
    }

    fn fetch(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.with_users(|users| Ok(users.get(&id).cloned()))
    }

    fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        self.with_users(|users| {
            Ok(users
                .values()
                .find(|user| user.username == username)
                .cloned())
        })
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.with_users(|users| {
            Ok(users
                .values()
                .find(|user| user.email.eq_ignore_ascii_case(email))
                .cloned())
        })
    }
}
