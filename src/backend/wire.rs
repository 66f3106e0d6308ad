//! Request and response bodies for the REST and auth endpoints

use serde::{Deserialize, Serialize};

use crate::model::{Identity, QuestionId, Role};

#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RefreshGrant<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppMetadata {
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub app_metadata: AppMetadata,
}

impl AuthUser {
    pub fn into_identity(self) -> Identity {
        let role = match self.app_metadata.role.as_deref() {
            Some("admin") => Role::Admin,
            _ => Role::Student,
        };
        Identity { user_id: self.id, email: self.email.unwrap_or_default(), role }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}

/// Sign-up returns a session, or only the user when email confirmation is on
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(AuthSession),
    User(AuthUser),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkRow {
    pub user_id: String,
    pub question_id: QuestionId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsertedId {
    pub id: QuestionId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_role_claim_maps_to_admin() {
        let json = r#"{"id":"u1","email":"ops@targetup.in","app_metadata":{"role":"admin","provider":"email"}}"#;
        let user: AuthUser = serde_json::from_str(json).unwrap();
        assert!(user.into_identity().is_admin());
    }

    #[test]
    fn missing_metadata_is_student() {
        let user: AuthUser = serde_json::from_str(r#"{"id":"u2"}"#).unwrap();
        let identity = user.into_identity();
        assert_eq!(identity.role, Role::Student);
        assert_eq!(identity.email, "");
    }

    #[test]
    fn sign_up_without_session_parses_as_user() {
        let json = r#"{"id":"u3","email":"new@targetup.in"}"#;
        let resp: SignUpResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(resp, SignUpResponse::User(_)));

        let json = r#"{"access_token":"t","user":{"id":"u3"}}"#;
        let resp: SignUpResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(resp, SignUpResponse::Session(_)));
    }
}
