//! User store contract and its implementations.
mod debug;
mod memory;
mod remote;

pub use debug::*;
pub use memory::*;
pub use remote::*;

pub(crate) use remote::check;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::user::User;

/// Update key appending to a user's abilities.
pub const UPDATE_KEY_ABILITY: &str = "ability";
/// Update key appending to a user's experience.
pub const UPDATE_KEY_EXPERIENCE: &str = "experience";

/// Operations on a shared collection of users, keyed by email.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert `user` unless a user with the same email exists.
    ///
    /// Returns `false`, leaving the existing entry untouched, on duplicate.
    async fn create(&self, user: User) -> Result<bool>;

    /// Snapshot of every user, in no particular order.
    async fn read(&self) -> Result<Vec<User>>;

    /// Append `value` to the list named by `key` on the user owning `email`.
    ///
    /// Returns `false` if no user matches `email` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `key` is neither
    /// [`UPDATE_KEY_ABILITY`] nor [`UPDATE_KEY_EXPERIENCE`].
    async fn update(&self, email: &str, key: &str, value: &str) -> Result<bool>;
}

#[async_trait]
impl<S: UserStore + ?Sized> UserStore for Arc<S> {
    async fn create(&self, user: User) -> Result<bool> {
        (**self).create(user).await
    }

    async fn read(&self) -> Result<Vec<User>> {
        (**self).read().await
    }

    async fn update(&self, email: &str, key: &str, value: &str) -> Result<bool> {
        (**self).update(email, key, value).await
    }
}

#[async_trait]
impl<S: UserStore + ?Sized> UserStore for Box<S> {
    async fn create(&self, user: User) -> Result<bool> {
        (**self).create(user).await
    }

    async fn read(&self) -> Result<Vec<User>> {
        (**self).read().await
    }

    async fn update(&self, email: &str, key: &str, value: &str) -> Result<bool> {
        (**self).update(email, key, value).await
    }
}

/// Append-only list of a [`User`] an update targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKey {
    Ability,
    Experience,
}

impl UpdateKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateKey::Ability => UPDATE_KEY_ABILITY,
            UpdateKey::Experience => UPDATE_KEY_EXPERIENCE,
        }
    }
}

impl FromStr for UpdateKey {
    type Err = Error;

    fn from_str(key: &str) -> Result<Self> {
        match key {
            UPDATE_KEY_ABILITY => Ok(UpdateKey::Ability),
            UPDATE_KEY_EXPERIENCE => Ok(UpdateKey::Experience),
            _ => Err(Error::InvalidArgument(key.to_owned())),
        }
    }
}

impl fmt::Display for UpdateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
