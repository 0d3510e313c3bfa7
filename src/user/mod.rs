use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Role {
    Admin,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("Unknown role '{other}'")),
        }
    }
}

/// A registered user. The password is kept in plain text; this is a local single-tenant tool.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) role: Role,
    pub(crate) created_at: DateTime<Utc>,
}

impl User {
    pub(crate) fn new(id: String, username: &str, password: &str, role: Role) -> User {
        User {
            id,
            username: username.to_string(),
            password: password.to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    pub(crate) fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LoginCredentials {
    pub(crate) username: String,
    pub(crate) password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SignupData {
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) confirm_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_json_field_names() {
        let user = User::new("7".to_string(), "ada", "secret1", Role::Admin);
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "admin");
        assert!(json.get("createdAt").is_some());
        assert!(user.is_admin());
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert!("owner".parse::<Role>().is_err());
    }
}
