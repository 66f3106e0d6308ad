//! HTTPS client for the hosted backend (REST tables, storage and auth)

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio::sync::broadcast;

use super::error::BackendError;
use super::vault::{StoredSession, TokenVault, mask_token};
use super::wire::{
    AuthSession, AuthUser, Credentials, InsertedId, MarkRow, RefreshGrant, SignUpResponse,
};
use super::{AuthEvent, ContentStore, IdentityProvider, MarkKind, ProgressStore, QuestionFilter};
use crate::config::BackendConfig;
use crate::model::{Exam, Identity, NewQuestion, NewTestResult, Question, QuestionId, TestResult};

/// Backend client
pub struct RestClient {
    /// HTTP client
    client: Client,
    /// Project URL without trailing slash
    base_url: String,
    /// Public (anon) API key
    api_key: String,
    /// Storage bucket for uploaded images
    bucket: String,
    /// Where OAuth providers send the user back to
    redirect_url: Option<String>,
    vault: Arc<dyn TokenVault>,
    session: Mutex<Option<StoredSession>>,
    events: broadcast::Sender<AuthEvent>,
}

impl RestClient {
    /// Create a client from configuration
    pub fn new(config: &BackendConfig, vault: Arc<dyn TokenVault>) -> Result<Self, BackendError> {
        if config.url.trim().is_empty() || config.api_key.trim().is_empty() {
            return Err(BackendError::NotConfigured);
        }

        let client = Client::builder().timeout(std::time::Duration::from_secs(60)).build()?;
        let (events, _) = broadcast::channel(16);

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            bucket: config.bucket.clone(),
            redirect_url: config.oauth_redirect_url.clone(),
            vault,
            session: Mutex::new(None),
            events,
        })
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Public URL for an object in the image bucket
    pub fn public_url(&self, name: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, self.bucket, name)
    }

    fn access_token(&self) -> Option<String> {
        self.session.lock().ok().and_then(|s| s.as_ref().map(|s| s.access_token.clone()))
    }

    fn signed_in_identity(&self) -> Option<Identity> {
        self.session.lock().ok().and_then(|s| s.as_ref().map(|s| s.identity.clone()))
    }

    /// Attach the API key and the user's bearer token (or the anon key)
    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token().unwrap_or_else(|| self.api_key.clone());
        builder.header("apikey", &self.api_key).bearer_auth(bearer)
    }

    /// Send an authorized request, refreshing an expired token once
    async fn send(&self, builder: RequestBuilder) -> Result<Response, BackendError> {
        let retry = builder.try_clone();
        let response = self.authorize(builder).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        let (Some(retry), Some(refresh_token)) = (retry, self.refresh_token()) else {
            return Ok(response);
        };

        match self.refresh(&refresh_token).await {
            Ok(_) => Ok(self.authorize(retry).send().await?),
            Err(e) => {
                tracing::warn!("Token refresh failed: {}", e);
                Ok(response)
            }
        }
    }

    fn refresh_token(&self) -> Option<String> {
        self.session.lock().ok().and_then(|s| s.as_ref().and_then(|s| s.refresh_token.clone()))
    }

    /// Exchange a refresh token for a new session
    async fn refresh(&self, refresh_token: &str) -> Result<Identity, BackendError> {
        let response = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.api_key)
            .json(&RefreshGrant { refresh_token })
            .send()
            .await?;
        let auth: AuthSession = Self::check(response).await?.json().await?;
        tracing::debug!(token = %mask_token(&auth.access_token), "Session refreshed");
        Ok(self.remember(auth))
    }

    fn require_admin(&self) -> Result<(), BackendError> {
        match self.signed_in_identity() {
            Some(identity) if identity.is_admin() => Ok(()),
            Some(_) => Err(BackendError::Forbidden),
            None => Err(BackendError::NotSignedIn),
        }
    }

    /// Map non-success responses to errors
    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), %message, "Backend request failed");
        Err(BackendError::ApiError { status: status.as_u16(), message })
    }

    fn remember(&self, auth: AuthSession) -> Identity {
        let identity = auth.user.into_identity();
        let stored = StoredSession {
            access_token: auth.access_token,
            refresh_token: auth.refresh_token,
            identity: identity.clone(),
        };
        if let Err(e) = self.vault.store(&stored) {
            tracing::warn!("Could not persist session: {}", e);
        }
        if let Ok(mut slot) = self.session.lock() {
            *slot = Some(stored);
        }
        let _ = self.events.send(AuthEvent::SignedIn(identity.clone()));
        identity
    }

    async fn fetch_user(&self, access_token: &str) -> Result<AuthUser, BackendError> {
        let response = self
            .client
            .get(self.auth_url("user"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

/// Quote a value for use inside a PostgREST logic expression
fn quote_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[async_trait]
impl ContentStore for RestClient {
    async fn list_exams(&self, access_code: Option<&str>) -> Result<Vec<Exam>, BackendError> {
        let mut query = vec![("select", "*".to_string()), ("order", "id.asc".to_string())];
        match access_code.filter(|c| !c.is_empty()) {
            Some(code) => {
                let filter = format!("(access_code.is.null,access_code.eq.{})", quote_value(code));
                query.push(("or", filter));
            }
            None => query.push(("access_code", "is.null".to_string())),
        }

        let request = self.client.get(self.rest_url("exams")).query(&query);
        let response = self.send(request).await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>, BackendError> {
        let mut query = vec![("select", "*".to_string()), ("order", "id.desc".to_string())];
        if let Some(exam) = &filter.exam_id {
            query.push(("exam_id", format!("eq.{}", exam)));
        }
        if let Some(subject) = &filter.subject {
            query.push(("subject", format!("eq.{}", subject)));
        }
        if let Some(chapter) = &filter.chapter {
            query.push(("chapter", format!("eq.{}", chapter)));
        }

        let request = self.client.get(self.rest_url("questions")).query(&query);
        let response = self.send(request).await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn insert_exam(&self, exam: &Exam) -> Result<(), BackendError> {
        self.require_admin()?;
        let request = self
            .client
            .post(self.rest_url("exams"))
            .header("Prefer", "return=minimal")
            .json(&[exam]);
        let response = self.send(request).await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update_exam(&self, exam: &Exam) -> Result<(), BackendError> {
        self.require_admin()?;
        let request = self
            .client
            .patch(self.rest_url("exams"))
            .query(&[("id", format!("eq.{}", exam.id))])
            .json(exam);
        let response = self.send(request).await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_exam(&self, exam_id: &str) -> Result<(), BackendError> {
        self.require_admin()?;
        let request = self
            .client
            .delete(self.rest_url("exams"))
            .query(&[("id", format!("eq.{}", exam_id))]);
        let response = self.send(request).await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn insert_question(&self, question: &NewQuestion) -> Result<QuestionId, BackendError> {
        self.require_admin()?;
        let request = self
            .client
            .post(self.rest_url("questions"))
            .header("Prefer", "return=representation")
            .query(&[("select", "id")])
            .json(&[question]);
        let response = self.send(request).await?;
        let rows: Vec<InsertedId> = Self::check(response).await?.json().await?;
        rows.first()
            .map(|r| r.id)
            .ok_or_else(|| BackendError::NotFound("inserted question id".to_string()))
    }

    async fn update_question(
        &self,
        id: QuestionId,
        question: &NewQuestion,
    ) -> Result<(), BackendError> {
        self.require_admin()?;
        let request = self
            .client
            .patch(self.rest_url("questions"))
            .query(&[("id", format!("eq.{}", id))])
            .json(question);
        let response = self.send(request).await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), BackendError> {
        self.require_admin()?;
        let request = self
            .client
            .delete(self.rest_url("questions"))
            .query(&[("id", format!("eq.{}", id))]);
        let response = self.send(request).await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn bulk_insert_questions(&self, questions: &[NewQuestion]) -> Result<usize, BackendError> {
        self.require_admin()?;
        let request = self
            .client
            .post(self.rest_url("questions"))
            .header("Prefer", "return=minimal")
            .json(questions);
        let response = self.send(request).await?;
        Self::check(response).await?;
        tracing::info!(rows = questions.len(), "Bulk insert committed");
        Ok(questions.len())
    }

    async fn upload_file(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BackendError> {
        self.require_admin()?;
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, name);
        let request = self
            .client
            .post(url)
            .header("content-type", content_type)
            .header("x-upsert", "true")
            .body(bytes);
        let response = self.send(request).await?;
        Self::check(response).await?;
        Ok(self.public_url(name))
    }
}

#[async_trait]
impl ProgressStore for RestClient {
    async fn list_marks(&self, kind: MarkKind, user_id: &str) -> Result<Vec<QuestionId>, BackendError> {
        let request = self
            .client
            .get(self.rest_url(kind.table()))
            .query(&[("select", "user_id,question_id".to_string()), ("user_id", format!("eq.{}", user_id))]);
        let response = self.send(request).await?;
        let rows: Vec<MarkRow> = Self::check(response).await?.json().await?;
        Ok(rows.into_iter().map(|r| r.question_id).collect())
    }

    async fn insert_mark(
        &self,
        kind: MarkKind,
        user_id: &str,
        question_id: QuestionId,
    ) -> Result<(), BackendError> {
        let row = MarkRow { user_id: user_id.to_string(), question_id };
        let request = self
            .client
            .post(self.rest_url(kind.table()))
            .header("Prefer", "return=minimal")
            .json(&[row]);
        let response = self.send(request).await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_mark(
        &self,
        kind: MarkKind,
        user_id: &str,
        question_id: QuestionId,
    ) -> Result<(), BackendError> {
        let request = self
            .client
            .delete(self.rest_url(kind.table()))
            .query(&[
                ("user_id", format!("eq.{}", user_id)),
                ("question_id", format!("eq.{}", question_id)),
            ]);
        let response = self.send(request).await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn list_results(&self, user_id: &str) -> Result<Vec<TestResult>, BackendError> {
        let request = self
            .client
            .get(self.rest_url("test_results"))
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", user_id)),
                ("order", "created_at.desc".to_string()),
            ]);
        let response = self.send(request).await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn insert_result(&self, result: &NewTestResult) -> Result<(), BackendError> {
        let request = self
            .client
            .post(self.rest_url("test_results"))
            .header("Prefer", "return=minimal")
            .json(&[result]);
        let response = self.send(request).await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for RestClient {
    async fn current_session(&self) -> Result<Option<Identity>, BackendError> {
        let Some(stored) = self.vault.load()? else {
            return Ok(None);
        };
        tracing::debug!(token = %mask_token(&stored.access_token), "Restoring stored session");

        match self.fetch_user(&stored.access_token).await {
            Ok(user) => {
                let auth = AuthSession {
                    access_token: stored.access_token,
                    refresh_token: stored.refresh_token,
                    user,
                };
                Ok(Some(self.remember(auth)))
            }
            Err(e) if e.requires_reauth() => {
                if let Some(refresh_token) = &stored.refresh_token {
                    match self.refresh(refresh_token).await {
                        Ok(identity) => return Ok(Some(identity)),
                        Err(e) if e.is_recoverable() => return Err(e),
                        Err(e) => tracing::info!("Session refresh rejected: {}", e),
                    }
                }
                tracing::info!("Stored session expired, discarding");
                self.vault.purge()?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, BackendError> {
        let response = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&Credentials { email, password })
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::BAD_REQUEST {
            return Err(BackendError::InvalidCredentials);
        }

        let auth: AuthSession = Self::check(response).await?.json().await?;
        Ok(self.remember(auth))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, BackendError> {
        let response = self
            .client
            .post(self.auth_url("signup"))
            .header("apikey", &self.api_key)
            .json(&Credentials { email, password })
            .send()
            .await?;

        let body: SignUpResponse = Self::check(response).await?.json().await?;
        match body {
            SignUpResponse::Session(auth) => Ok(self.remember(auth)),
            SignUpResponse::User(_) => Err(BackendError::ConfirmationRequired(email.to_string())),
        }
    }

    fn oauth_url(&self, provider: &str) -> Result<String, BackendError> {
        let mut url = reqwest::Url::parse(&self.auth_url("authorize"))
            .map_err(|e| BackendError::ApiError { status: 0, message: e.to_string() })?;
        url.query_pairs_mut().append_pair("provider", provider);
        if let Some(redirect) = &self.redirect_url {
            url.query_pairs_mut().append_pair("redirect_to", redirect);
        }
        Ok(url.to_string())
    }

    async fn complete_oauth(&self, access_token: &str) -> Result<Identity, BackendError> {
        let user = self.fetch_user(access_token).await?;
        let auth = AuthSession { access_token: access_token.to_string(), refresh_token: None, user };
        Ok(self.remember(auth))
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let token = self.access_token();
        if let Ok(mut slot) = self.session.lock() {
            *slot = None;
        }

        let result = match token {
            Some(token) => {
                let response = self
                    .client
                    .post(self.auth_url("logout"))
                    .header("apikey", &self.api_key)
                    .bearer_auth(token)
                    .send()
                    .await;
                match response {
                    Ok(response) => Self::check(response).await.map(|_| ()),
                    Err(e) => Err(e.into()),
                }
            }
            None => Ok(()),
        };

        let _ = self.events.send(AuthEvent::SignedOut);
        result
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryVault;
    use crate::backend::wire::AppMetadata;

    fn config() -> BackendConfig {
        BackendConfig {
            url: "https://demo.supabase.co/".into(),
            api_key: "anon-key".into(),
            bucket: "images".into(),
            oauth_redirect_url: Some("http://localhost:3000".into()),
        }
    }

    #[test]
    fn missing_url_is_not_configured() {
        let mut cfg = config();
        cfg.url = String::new();
        let err = RestClient::new(&cfg, Arc::new(MemoryVault::default())).err().unwrap();
        assert!(matches!(err, BackendError::NotConfigured));
    }

    #[test]
    fn urls_are_built_without_double_slash() {
        let client = RestClient::new(&config(), Arc::new(MemoryVault::default())).unwrap();
        assert_eq!(client.rest_url("exams"), "https://demo.supabase.co/rest/v1/exams");
        assert_eq!(
            client.public_url("icons/jee.png"),
            "https://demo.supabase.co/storage/v1/object/public/images/icons/jee.png"
        );
    }

    #[test]
    fn oauth_url_carries_provider_and_redirect() {
        let client = RestClient::new(&config(), Arc::new(MemoryVault::default())).unwrap();
        let url = client.oauth_url("google").unwrap();
        assert!(url.starts_with("https://demo.supabase.co/auth/v1/authorize?"));
        assert!(url.contains("provider=google"));
        assert!(url.contains("redirect_to=http%3A%2F%2Flocalhost%3A3000"));
    }

    #[test]
    fn access_codes_are_quoted_in_filters() {
        assert_eq!(quote_value("JEE2025"), r#""JEE2025""#);
        assert_eq!(quote_value("a,b)"), r#""a,b)""#);
        assert_eq!(quote_value(r#"say "hi"\"#), r#""say \"hi\"\\""#);
    }

    #[test]
    fn refresh_token_comes_from_the_active_session() {
        let client = RestClient::new(&config(), Arc::new(MemoryVault::default())).unwrap();
        assert_eq!(client.refresh_token(), None);

        let auth = AuthSession {
            access_token: "access".into(),
            refresh_token: Some("refresh".into()),
            user: AuthUser { id: "user-1".into(), email: None, app_metadata: AppMetadata::default() },
        };
        client.remember(auth);
        assert_eq!(client.refresh_token().as_deref(), Some("refresh"));
    }

    #[test]
    fn admin_writes_require_sign_in() {
        let client = RestClient::new(&config(), Arc::new(MemoryVault::default())).unwrap();
        assert!(matches!(client.require_admin(), Err(BackendError::NotSignedIn)));
    }
}
