//! People-API style HTTP client.

use super::{DirectoryError, RemoteDirectory, RemotePage};
use crate::config::DirectoryConfig;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use rolodex_engine::{RawRemoteRecord, RemotePayload};
use std::time::Duration;

/// Fields requested when listing and written when updating.
const PERSON_FIELDS: &str = "names,phoneNumbers,emailAddresses,organizations";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Directory client authenticating with a bearer token.
pub struct HttpDirectory {
    client: Client,
    base_url: String,
    token: String,
    page_size: u32,
}

impl HttpDirectory {
    pub fn new(config: &DirectoryConfig) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("Rolodex/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
            page_size: config.page_size,
        })
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, DirectoryError> {
        let response = request.bearer_auth(&self.token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

fn require_ref(remote_ref: &str) -> Result<&str, DirectoryError> {
    if remote_ref.trim().is_empty() {
        return Err(DirectoryError::Rejected("empty resource name".to_string()));
    }
    Ok(remote_ref)
}

#[async_trait]
impl RemoteDirectory for HttpDirectory {
    async fn list(&self, page_token: Option<&str>) -> Result<RemotePage, DirectoryError> {
        let url = format!("{}/people/me/connections", self.base_url);
        let page_size = self.page_size.to_string();

        let mut query = vec![("personFields", PERSON_FIELDS), ("pageSize", page_size.as_str())];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response = self.send(self.client.get(&url).query(&query)).await?;
        Ok(response.json().await?)
    }

    async fn create(&self, payload: &RemotePayload) -> Result<RawRemoteRecord, DirectoryError> {
        let url = format!("{}/people:createContact", self.base_url);
        let response = self.send(self.client.post(&url).json(payload)).await?;
        Ok(response.json().await?)
    }

    async fn update(
        &self,
        remote_ref: &str,
        version: Option<&str>,
        payload: &RemotePayload,
    ) -> Result<RawRemoteRecord, DirectoryError> {
        let url = format!("{}/{}:updateContact", self.base_url, require_ref(remote_ref)?);
        let body = RemotePayload {
            etag: version.map(str::to_string).or_else(|| payload.etag.clone()),
            ..payload.clone()
        };
        let request = self
            .client
            .patch(&url)
            .query(&[("updatePersonFields", PERSON_FIELDS)])
            .json(&body);
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    async fn delete(&self, remote_ref: &str) -> Result<(), DirectoryError> {
        let url = format!("{}/{}:deleteContact", self.base_url, require_ref(remote_ref)?);
        self.send(self.client.delete(&url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> HttpDirectory {
        HttpDirectory::new(&DirectoryConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            token: "token".to_string(),
            page_size: 10,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn blank_resource_names_are_rejected_before_sending() {
        let directory = directory();

        let err = directory.delete(" ").await.unwrap_err();
        assert!(matches!(err, DirectoryError::Rejected(_)));

        let err = directory
            .update("", None, &RemotePayload::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Rejected(_)));
    }

    #[test]
    fn page_deserializes_connections() {
        let page: RemotePage = serde_json::from_str(
            r#"{"connections": [{"resourceName": "people/c1"}], "nextPageToken": "t2", "totalPeople": 3}"#,
        )
        .unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.next_page_token.as_deref(), Some("t2"));

        let last: RemotePage = serde_json::from_str("{}").unwrap();
        assert!(last.records.is_empty());
        assert!(last.next_page_token.is_none());
    }
}
