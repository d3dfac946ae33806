pub mod dto;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use testcraft_core::model::{
    AnswerSnapshot, Language, RunOutcome, SubmissionId, TestCase, TestDefinition, TestId,
    TestResult, UserId, UserProfile,
};
use tracing::{debug, warn};
use url::Url;

use crate::repository::{
    AccessError, AccessGrant, AccessValidator, CodeRunner, ResultRepository, Storage,
    StorageError, SubmissionRepository, TestRepository, UserDirectory,
};
use dto::{
    AccessGrantDto, AccessRequestDto, RunRequestDto, RunResponseDto, SubmissionDto,
    SubmissionReceiptDto, TestCaseDto, TestDto, TestResultDto, UserDto,
};

const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl HttpConfig {
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, StorageError> {
        let mut raw = base_url.trim().to_string();
        // Keep a trailing slash so `Url::join` appends instead of replacing the last segment.
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw)
            .map_err(|e| StorageError::Connection(format!("invalid API url `{base_url}`: {e}")))?;
        Ok(Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }
}

/// JSON client for the TestCraft REST backend.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    config: HttpConfig,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the HTTP client cannot be built.
    pub fn new(config: HttpConfig) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, StorageError> {
        self.config
            .base_url
            .join(path)
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, StorageError> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let response = self.client.get(url).send().await.map_err(transport_error)?;
        read_json(check_status(response).await?).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, StorageError>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        read_json(check_status(response).await?).await
    }
}

fn transport_error(err: reqwest::Error) -> StorageError {
    if err.is_timeout() {
        StorageError::Connection("request timed out".into())
    } else {
        StorageError::Connection(err.to_string())
    }
}

async fn check_status(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(%status, "backend returned an error status");
    Err(status_error(status, body))
}

fn status_error(status: StatusCode, body: String) -> StorageError {
    match status {
        StatusCode::NOT_FOUND => StorageError::NotFound,
        StatusCode::CONFLICT => StorageError::Conflict,
        s if s.is_server_error() => StorageError::Connection(format!("{s}: {body}")),
        s => {
            let message = if body.trim().is_empty() {
                s.to_string()
            } else {
                body
            };
            StorageError::Rejected(message)
        }
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, StorageError> {
    response
        .json()
        .await
        .map_err(|e| StorageError::Serialization(e.to_string()))
}

#[async_trait]
impl TestRepository for HttpBackend {
    async fn load_test_definition(&self, id: TestId) -> Result<TestDefinition, StorageError> {
        let dto: TestDto = self.get_json(&format!("tests/{id}")).await?;
        dto.into_definition()
    }
}

#[async_trait]
impl AccessValidator for HttpBackend {
    async fn validate_access_code(
        &self,
        test_id: TestId,
        email: &str,
        access_code: &str,
    ) -> Result<AccessGrant, AccessError> {
        let body = AccessRequestDto { email, access_code };
        match self
            .post_json::<_, AccessGrantDto>(&format!("tests/{test_id}/access"), &body)
            .await
        {
            Ok(grant) => Ok(AccessGrant {
                user_id: UserId::new(grant.user_id),
                email: grant.email,
            }),
            Err(StorageError::Rejected(message)) => Err(AccessError::Denied(message)),
            Err(StorageError::NotFound) => Err(AccessError::Denied("unknown test".into())),
            Err(other) => Err(AccessError::Storage(other)),
        }
    }
}

#[async_trait]
impl SubmissionRepository for HttpBackend {
    async fn submit_session(&self, snapshot: &AnswerSnapshot) -> Result<SubmissionId, StorageError> {
        let body = SubmissionDto::from(snapshot);
        let receipt: SubmissionReceiptDto = self
            .post_json(&format!("tests/{}/submissions", snapshot.test_id), &body)
            .await?;
        Ok(receipt.id)
    }
}

#[async_trait]
impl CodeRunner for HttpBackend {
    async fn run_code(
        &self,
        code: &str,
        language: Language,
        test_cases: &[TestCase],
    ) -> Result<RunOutcome, StorageError> {
        let body = RunRequestDto {
            code,
            language,
            test_cases: test_cases.iter().map(TestCaseDto::from).collect(),
        };
        let response: RunResponseDto = self.post_json("code/run", &body).await?;
        Ok(response.into())
    }
}

#[async_trait]
impl ResultRepository for HttpBackend {
    async fn list_results(&self) -> Result<Vec<TestResult>, StorageError> {
        let rows: Vec<TestResultDto> = self.get_json("results").await?;
        Ok(rows.into_iter().map(TestResult::from).collect())
    }
}

#[async_trait]
impl UserDirectory for HttpBackend {
    async fn list_users(&self) -> Result<Vec<UserProfile>, StorageError> {
        let rows: Vec<UserDto> = self.get_json("users").await?;
        Ok(rows.into_iter().map(UserProfile::from).collect())
    }
}

impl Storage {
    /// Wire every contract to one HTTP backend.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the HTTP client cannot be built.
    pub fn http(config: HttpConfig) -> Result<Self, StorageError> {
        let backend = Arc::new(HttpBackend::new(config)?);
        Ok(Self {
            tests: backend.clone(),
            access: backend.clone(),
            submissions: backend.clone(),
            code_runner: backend.clone(),
            results: backend.clone(),
            users: backend,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_always_gets_trailing_slash() {
        let config = HttpConfig::new("http://localhost:8080/api").unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:8080/api/");
        let joined = config.base_url.join("tests/4").unwrap();
        assert_eq!(joined.as_str(), "http://localhost:8080/api/tests/4");
    }

    #[test]
    fn rejects_relative_url() {
        assert!(HttpConfig::new("not a url").is_err());
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, String::new()),
            StorageError::NotFound
        ));
        assert!(matches!(
            status_error(StatusCode::CONFLICT, String::new()),
            StorageError::Conflict
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, String::new()),
            StorageError::Connection(_)
        ));
        match status_error(StatusCode::FORBIDDEN, "wrong code".into()) {
            StorageError::Rejected(message) => assert_eq!(message, "wrong code"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
