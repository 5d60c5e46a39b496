use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, de::DeserializeOwned};

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Blocking client for the `/v2` API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl ApiClient {
    pub fn new(server_url: &str, username: &str, password: &str) -> anyhow::Result<Self> {
        let mut client = Self::anonymous(server_url)?;
        client.credentials = Some((username.to_string(), password.to_string()));
        Ok(client)
    }

    /// A client for the unauthenticated endpoints.
    pub fn anonymous(server_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: server_url.trim_end_matches('/').to_string(),
            credentials: None,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v2{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((username, password)) => request.basic_auth(username, Some(password)),
            None => request,
        }
    }

    pub fn get_text(&self, path: &str) -> anyhow::Result<String> {
        let resp = self.authorize(self.client.get(self.url(path))).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(error_from(status, &resp.text()?));
        }
        Ok(resp.text()?)
    }

    pub fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> anyhow::Result<Option<T>> {
        let mut request = self.authorize(self.client.put(self.url(path)));
        if let Some(body) = body {
            request = request.json(body);
        }
        self.handle_response(request.send()?)
    }

    pub fn delete(&self, path: &str) -> anyhow::Result<()> {
        let resp = self.authorize(self.client.delete(self.url(path))).send()?;
        self.handle_response::<serde_json::Value>(resp)?;
        Ok(())
    }

    fn handle_response<T: DeserializeOwned>(&self, resp: Response) -> anyhow::Result<Option<T>> {
        let status = resp.status();
        let body = resp.text()?;

        if !status.is_success() {
            return Err(error_from(status, &body));
        }

        let api_resp: ApiResponse<T> = serde_json::from_str(&body)?;
        Ok(api_resp.data)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn error_from(status: StatusCode, body: &str) -> anyhow::Error {
    let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(body)
        .ok()
        .and_then(|r| r.errors.into_iter().next())
        .unwrap_or_else(|| "Server error (no details provided)".into());
    anyhow::anyhow!("{message} ({status})")
}
