//! Staged builder for User.

use validator::{ValidationError, ValidationErrors};

use crate::user::User;

/// [`User`] builder.
///
/// `email`, `name`, `address` and `formation` have no default and must be
/// set before [`UserBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct UserBuilder {
    email: Option<String>,
    name: Option<String>,
    address: Option<String>,
    formation: Option<String>,
    picture_data: Vec<u8>,
    abilities: Vec<String>,
    experience: Vec<String>,
}

fn required(errors: &mut ValidationErrors, field: &'static str, message: &'static str) {
    errors.add(
        field,
        ValidationError::new("required").with_message(message.into()),
    );
}

impl UserBuilder {
    /// Create a new [`UserBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Update `email` field on [`UserBuilder`].
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Update `name` field on [`UserBuilder`].
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Update `address` field on [`UserBuilder`].
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Update `formation` field on [`UserBuilder`].
    pub fn formation(mut self, formation: impl Into<String>) -> Self {
        self.formation = Some(formation.into());
        self
    }

    /// Update `picture_data` field on [`UserBuilder`].
    pub fn picture_data(mut self, data: Vec<u8>) -> Self {
        self.picture_data = data;
        self
    }

    /// Append to `abilities`.
    pub fn abilities<I, S>(mut self, abilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.abilities.extend(abilities.into_iter().map(Into::into));
        self
    }

    /// Append to `experience`.
    pub fn experience<I, S>(mut self, experience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.experience.extend(experience.into_iter().map(Into::into));
        self
    }

    /// Build the [`User`].
    ///
    /// Every missing required field is reported, not only the first one.
    pub fn build(self) -> Result<User, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.email.is_none() {
            required(&mut errors, "email", "User email must be set.");
        }
        if self.name.is_none() {
            required(&mut errors, "name", "User name must be set.");
        }
        if self.address.is_none() {
            required(&mut errors, "address", "User address must be set.");
        }
        if self.formation.is_none() {
            required(&mut errors, "formation", "User formation must be set.");
        }

        match (self.email, self.name, self.address, self.formation) {
            (Some(email), Some(name), Some(address), Some(formation)) => Ok(User {
                email,
                name,
                address,
                formation,
                picture_data: self.picture_data,
                abilities: self.abilities,
                experience: self.experience,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_name() {
        let errors = UserBuilder::new()
            .email("a@x.com")
            .address("R1")
            .formation("CS")
            .build()
            .unwrap_err();

        let fields = errors.field_errors();
        assert_eq!(fields.len(), 1);
        assert!(fields.contains_key("name"));
    }

    #[test]
    fn test_every_missing_field_is_reported() {
        let errors = UserBuilder::new().abilities(["IoT"]).build().unwrap_err();

        let fields = errors.field_errors();
        for field in ["email", "name", "address", "formation"] {
            assert!(fields.contains_key(field), "{field} not reported");
        }
    }

    #[test]
    fn test_optional_fields_default() {
        let user = UserBuilder::new()
            .email("a@x.com")
            .name("Ana")
            .address("R1")
            .formation("CS")
            .build()
            .unwrap();

        assert!(user.picture_data().is_empty());
        assert!(user.abilities().is_empty());
        assert!(user.experience().is_empty());
    }

    #[test]
    fn test_bulk_append() {
        let user = UserBuilder::new()
            .email("a@x.com")
            .name("Ana")
            .address("R1")
            .formation("CS")
            .abilities(["Data analysis"])
            .abilities(vec!["Cloud".to_string(), "Cloud".to_string()])
            .experience(["5 years at Y"])
            .build()
            .unwrap();

        assert_eq!(user.abilities(), ["Data analysis", "Cloud", "Cloud"]);
        assert_eq!(user.experience(), ["5 years at Y"]);
    }
}
