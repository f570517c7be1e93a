use anyhow::{bail, Context, Result};
use reqwest::{Client, Response};
use sandbox_core::{AuditReport, BlockRow};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// Thin wrapper over the node's session endpoints.
pub struct NodeClient {
    http: Client,
    base: String,
}

impl NodeClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn decode<T: DeserializeOwned>(res: Response) -> Result<T> {
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            bail!("node returned {status}: {body}");
        }
        res.json::<T>().await.context("decoding node response")
    }

    pub async fn create_session(&self) -> Result<String> {
        let res = self.http.post(self.url("/sessions")).send().await?;
        let body: Value = Self::decode(res).await?;
        body["session"]
            .as_str()
            .map(str::to_string)
            .context("node response carried no session id")
    }

    pub async fn mine(
        &self,
        session: &str,
        data: &str,
        difficulty: Option<i64>,
        wait: bool,
    ) -> Result<Value> {
        let mut body = json!({ "data": data });
        if let Some(d) = difficulty {
            body["difficulty"] = json!(d);
        }
        let res = self
            .http
            .post(self.url(&format!("/sessions/{session}/mine")))
            .query(&[("wait", wait)])
            .json(&body)
            .send()
            .await?;
        Self::decode(res).await
    }

    pub async fn status(&self, session: &str) -> Result<Value> {
        let res = self
            .http
            .get(self.url(&format!("/sessions/{session}/mine")))
            .send()
            .await?;
        Self::decode(res).await
    }

    pub async fn cancel(&self, session: &str) -> Result<Value> {
        let res = self
            .http
            .delete(self.url(&format!("/sessions/{session}/mine")))
            .send()
            .await?;
        Self::decode(res).await
    }

    pub async fn reset(&self, session: &str) -> Result<Vec<BlockRow>> {
        let res = self
            .http
            .post(self.url(&format!("/sessions/{session}/reset")))
            .send()
            .await?;
        Self::decode(res).await
    }

    pub async fn chain(&self, session: &str) -> Result<Vec<BlockRow>> {
        let res = self
            .http
            .get(self.url(&format!("/sessions/{session}/chain")))
            .send()
            .await?;
        Self::decode(res).await
    }

    pub async fn audit(&self, session: &str) -> Result<AuditReport> {
        let res = self
            .http
            .get(self.url(&format!("/sessions/{session}/chain/audit")))
            .send()
            .await?;
        Self::decode(res).await
    }

    pub async fn graph(&self, session: &str, format: &str) -> Result<String> {
        let res = self
            .http
            .get(self.url(&format!("/sessions/{session}/graph")))
            .query(&[("format", format)])
            .send()
            .await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            bail!("node returned {status}: {body}");
        }
        Ok(body)
    }

    pub async fn tamper(&self, session: &str, index: u64, data: &str) -> Result<Value> {
        let res = self
            .http
            .post(self.url(&format!("/sessions/{session}/tamper")))
            .json(&json!({ "index": index, "data": data }))
            .send()
            .await?;
        Self::decode(res).await
    }
}
