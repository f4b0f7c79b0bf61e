use serde::{Deserialize, Serialize};

use crate::validation::{Fields, Presence, RequiredFields, Rule};

pub(crate) const EMAIL: Rule = Rule {
    key: "email",
    label: "Email",
};
pub(crate) const PASSWORD: Rule = Rule {
    key: "password",
    label: "Password",
};

/// Fields required by both registration and login.
pub(crate) const CREDENTIALS: RequiredFields = RequiredFields::new(&[EMAIL, PASSWORD]);

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Fields for LoginRequest {
    fn presence(&self, key: &str) -> Presence {
        match key {
            "email" => Presence::of_text(&self.email),
            "password" => Presence::of_text(&self.password),
            _ => Presence::Absent,
        }
    }
}

/// Response returned after login or refresh.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub auth_token: String,
}

/// Optional logout body; when present the email must match the token.
#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub email: Option<String>,
}
