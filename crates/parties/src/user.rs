use serde::{Deserialize, Serialize};

use rentstock_core::{require_non_blank, DomainResult, Entity, UserId};

use crate::supplier::validate_email;

/// Application user; referenced by inventory movements as the actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl NewUser {
    pub const DEFAULT_ROLE: &'static str = "user";

    pub fn validate(&self) -> DomainResult<()> {
        require_non_blank("username", &self.username)?;
        require_non_blank("name", &self.name)?;
        validate_email(&self.email)
    }

    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            username: self.username.trim().to_string(),
            name: self.name,
            email: self.email.trim().to_string(),
            role: self
                .role
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| Self::DEFAULT_ROLE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_defaults_to_user() {
        let u = NewUser {
            username: "maria".to_string(),
            name: "Maria".to_string(),
            email: "maria@example.com".to_string(),
            role: None,
        }
        .into_user(UserId::new());
        assert_eq!(u.role, "user");
    }

    #[test]
    fn blank_username_is_rejected() {
        let u = NewUser {
            username: "".to_string(),
            name: "Maria".to_string(),
            email: "maria@example.com".to_string(),
            role: Some("admin".to_string()),
        };
        assert!(u.validate().is_err());
    }
}
