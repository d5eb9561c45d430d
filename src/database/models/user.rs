use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use crate::api::format::{FormatError, Representation};

/// A registered account. The credential hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    #[sqlx(rename = "user_id")]
    pub id: i64,
    pub username: String,
    pub pseudonym: String,
    pub is_admin: bool,
}

impl Representation for User {
    const XML_ROOT: &'static str = "user";
}

/// Body of `POST /users`.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserCreationRequest {
    pub username: String,
    pub password: String,
    pub pseudonym: String,
    pub is_admin: bool,
}

/// Body of `PUT /users/:id`. Absent fields are left untouched.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserModificationRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub pseudonym: Option<String>,
    pub is_admin: Option<bool>,
}

impl UserModificationRequest {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.password.is_none()
            && self.pseudonym.is_none()
            && self.is_admin.is_none()
    }
}

impl fmt::Debug for UserCreationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCreationRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("pseudonym", &self.pseudonym)
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

impl fmt::Debug for UserModificationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserModificationRequest")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pseudonym", &self.pseudonym)
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserList {
    #[serde(rename = "user")]
    pub items: Vec<User>,
}

impl From<Vec<User>> for UserList {
    fn from(items: Vec<User>) -> Self {
        Self { items }
    }
}

impl Representation for UserList {
    const XML_ROOT: &'static str = "users";

    fn to_json(&self) -> Result<Vec<u8>, FormatError> {
        serde_json::to_vec(&self.items).map_err(|e| FormatError::Render {
            format: "json",
            message: e.to_string(),
        })
    }
}
