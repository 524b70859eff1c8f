//! `reqwest`-based implementation of the store traits.
//!
//! One client instance carries the whole session: authentication cookies are
//! kept in the client's cookie jar, every request is JSON, and a fixed
//! request timeout keeps a hung backend from wedging the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use study_core::model::{
    Credentials, ModuleId, ModuleInfo, ModulePatch, ModuleSummary, NewModule, NewTerm,
    ProgressStatus, Registration, Term, TermId, TermPatch, UserProfile,
};

use crate::error::BackendError;
use crate::store::{AuthStore, ModuleStore, ProgressStore, TermStore};

/// Upper bound on any single backend request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the study backend.
#[derive(Debug)]
pub struct HttpStore {
    client: Client,
    base: Url,
}

impl HttpStore {
    /// Builds a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::BaseUrl` for an unparseable url and
    /// `BackendError::Http` if the underlying client cannot be constructed.
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let mut base = base_url.to_owned();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)?;

        let client = Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client, base })
    }

    fn url(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.base.join(path)?)
    }

    async fn check(response: Response) -> Result<Response, BackendError> {
        match response.status() {
            StatusCode::UNAUTHORIZED => Err(BackendError::Unauthorized),
            StatusCode::NOT_FOUND => Err(BackendError::NotFound),
            status if !status.is_success() => Err(BackendError::HttpStatus(status)),
            _ => Ok(response),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, BackendError> {
        log::debug!("GET {path}");
        let response = self.client.get(self.url(path)?).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

/// Detail responses arrive wrapped in a `data` envelope.
#[derive(Debug, Deserialize)]
struct ModuleEnvelope {
    data: ModuleInfo,
}

#[derive(Debug, Serialize, Deserialize)]
struct TermStatusBody {
    status: ProgressStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTermBody<'a> {
    module_id: &'a str,
    term: &'a str,
    definition: &'a str,
}

//
// ─── STORE IMPLEMENTATIONS ─────────────────────────────────────────────────────
//

#[async_trait]
impl TermStore for HttpStore {
    async fn list_terms(&self, module_id: &ModuleId) -> Result<Vec<Term>, BackendError> {
        self.get_json(&format!("modules/{module_id}/terms")).await
    }

    async fn create_term(
        &self,
        module_id: &ModuleId,
        term: &NewTerm,
    ) -> Result<Term, BackendError> {
        log::debug!("POST terms (module {module_id})");
        let body = CreateTermBody {
            module_id: module_id.as_str(),
            term: &term.term,
            definition: &term.definition,
        };
        let response = self
            .client
            .post(self.url("terms")?)
            .json(&body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn update_term(&self, id: &TermId, patch: &TermPatch) -> Result<(), BackendError> {
        log::debug!("PATCH terms/{id}");
        let response = self
            .client
            .patch(self.url(&format!("terms/{id}"))?)
            .json(patch)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_term(&self, id: &TermId) -> Result<(), BackendError> {
        log::debug!("DELETE terms/{id}");
        let response = self
            .client
            .delete(self.url(&format!("terms/{id}"))?)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for HttpStore {
    async fn term_status(&self, id: &TermId) -> Result<Option<ProgressStatus>, BackendError> {
        // A missing record is an expected state, not an error.
        match self
            .get_json::<TermStatusBody>(&format!("v2/terms/{id}/progress"))
            .await
        {
            Ok(body) => Ok(Some(body.status)),
            Err(BackendError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn set_term_status(
        &self,
        id: &TermId,
        status: ProgressStatus,
    ) -> Result<(), BackendError> {
        log::debug!("PATCH v2/terms/{id}/progress -> {}", status.as_str());
        let response = self
            .client
            .patch(self.url(&format!("v2/terms/{id}/progress"))?)
            .json(&TermStatusBody { status })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ModuleStore for HttpStore {
    async fn list_modules(&self) -> Result<Vec<ModuleSummary>, BackendError> {
        self.get_json("modules").await
    }

    async fn community_modules(
        &self,
        query: Option<&str>,
    ) -> Result<Vec<ModuleSummary>, BackendError> {
        log::debug!("GET modules/community");
        let mut request = self.client.get(self.url("modules/community")?);
        if let Some(q) = query {
            request = request.query(&[("q", q)]);
        }
        let response = request.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn get_module(&self, id: &ModuleId) -> Result<ModuleInfo, BackendError> {
        let envelope: ModuleEnvelope = self.get_json(&format!("modules/{id}")).await?;
        Ok(envelope.data)
    }

    async fn create_module(&self, module: &NewModule) -> Result<ModuleSummary, BackendError> {
        log::debug!("POST modules");
        let response = self
            .client
            .post(self.url("modules")?)
            .json(module)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn update_module(
        &self,
        id: &ModuleId,
        patch: &ModulePatch,
    ) -> Result<(), BackendError> {
        log::debug!("PATCH modules/{id}");
        let response = self
            .client
            .patch(self.url(&format!("modules/{id}"))?)
            .json(patch)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_module(&self, id: &ModuleId) -> Result<(), BackendError> {
        log::debug!("DELETE modules/{id}");
        let response = self
            .client
            .delete(self.url(&format!("modules/{id}"))?)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthStore for HttpStore {
    async fn register(&self, registration: &Registration) -> Result<(), BackendError> {
        log::debug!("POST auth/register");
        let response = self
            .client
            .post(self.url("auth/register")?)
            .json(registration)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn login(&self, credentials: &Credentials) -> Result<(), BackendError> {
        log::debug!("POST auth/login");
        let response = self
            .client
            .post(self.url("auth/login")?)
            .json(credentials)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn logout(&self) -> Result<(), BackendError> {
        log::debug!("POST auth/logout");
        let response = self.client.post(self.url("auth/logout")?).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn current_user(&self) -> Result<UserProfile, BackendError> {
        self.get_json("users/me").await
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_a_trailing_slash() {
        let store = HttpStore::new("https://api.example.com/v1").unwrap();
        let url = store.url("modules/m1/terms").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/modules/m1/terms");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = HttpStore::new("not a url").unwrap_err();
        assert!(matches!(err, BackendError::BaseUrl(_)));
    }

    #[test]
    fn module_envelope_unwraps_data() {
        let json = r#"{"data":{"title":"Basics","termsCount":2,"terms":[
            {"id":"t1","term":"cat","definition":"кот","isStarred":true},
            {"id":"t2","term":"dog","definition":"собака"}
        ]}}"#;
        let envelope: ModuleEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data.title, "Basics");
        assert_eq!(envelope.data.terms.len(), 2);
        assert!(envelope.data.terms[0].is_starred);
        assert!(!envelope.data.terms[1].is_starred);
    }

    #[test]
    fn status_body_round_trips() {
        let body: TermStatusBody = serde_json::from_str(r#"{"status":"in_progress"}"#).unwrap();
        assert_eq!(body.status, ProgressStatus::InProgress);
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"status":"in_progress"}"#
        );
    }

    #[test]
    fn create_term_body_uses_camel_case() {
        let body = CreateTermBody {
            module_id: "m1",
            term: "cat",
            definition: "кот",
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(
            json,
            r#"{"moduleId":"m1","term":"cat","definition":"кот"}"#
        );
    }
}
