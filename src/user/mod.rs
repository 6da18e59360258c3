mod builder;

pub use builder::*;

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

use crate::store::UpdateKey;

/// User profile.
///
/// Identity is the email, compared case-insensitively. Only `abilities` and
/// `experience` ever change after construction, and only through a store.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "UserRecord")]
pub struct User {
    email: String,
    name: String,
    address: String,
    formation: String,
    #[serde(with = "picture")]
    picture_data: Vec<u8>,
    abilities: Vec<String>,
    experience: Vec<String>,
}

impl User {
    /// Create a new [`UserBuilder`].
    pub fn builder() -> UserBuilder {
        UserBuilder::new()
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Academic background.
    pub fn formation(&self) -> &str {
        &self.formation
    }

    /// Raw picture file content, empty when the user has no picture.
    pub fn picture_data(&self) -> &[u8] {
        &self.picture_data
    }

    pub fn has_picture(&self) -> bool {
        !self.picture_data.is_empty()
    }

    pub fn abilities(&self) -> &[String] {
        &self.abilities
    }

    pub fn experience(&self) -> &[String] {
        &self.experience
    }

    /// Whether `email` designates this user.
    pub fn is(&self, email: &str) -> bool {
        identity(&self.email) == identity(email)
    }

    /// Key under which a store files this user.
    pub(crate) fn identity(&self) -> String {
        identity(&self.email)
    }

    pub(crate) fn append(&mut self, key: UpdateKey, value: String) {
        match key {
            UpdateKey::Ability => self.abilities.push(value),
            UpdateKey::Experience => self.experience.push(value),
        }
    }
}

/// Normalized form of an email used for identity checks.
pub(crate) fn identity(email: &str) -> String {
    email.to_lowercase()
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

/// Wire form of a [`User`], checked by the builder on decode.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    email: Option<String>,
    name: Option<String>,
    address: Option<String>,
    formation: Option<String>,
    #[serde(default, with = "picture")]
    picture_data: Vec<u8>,
    #[serde(default)]
    abilities: Vec<String>,
    #[serde(default)]
    experience: Vec<String>,
}

impl TryFrom<UserRecord> for User {
    type Error = ValidationErrors;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        let mut builder = UserBuilder::new()
            .picture_data(record.picture_data)
            .abilities(record.abilities)
            .experience(record.experience);

        if let Some(email) = record.email {
            builder = builder.email(email);
        }
        if let Some(name) = record.name {
            builder = builder.name(name);
        }
        if let Some(address) = record.address {
            builder = builder.address(address);
        }
        if let Some(formation) = record.formation {
            builder = builder.formation(formation);
        }

        builder.build()
    }
}

/// Picture bytes travel as standard base64.
mod picture {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &[u8],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
