//! HTTP 提交通道 - 基础设施层
//!
//! 持有唯一的 reqwest Client，把文件以 multipart 形式提交到
//! `{api_base_url}/apply/{job_id}`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::ChannelError;
use crate::infrastructure::submission_channel::{Destination, SubmissionChannel, SubmitOutcome};
use crate::models::{AcceptedItem, PayloadHandle};

/// HTTP 提交通道
#[derive(Clone)]
pub struct HttpChannel {
    client: reqwest::Client,
    base_url: String,
    session_cookie: Option<String>,
}

impl HttpChannel {
    pub fn new(config: &Config) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ChannelError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session_cookie: config.session_cookie.clone(),
        })
    }

    /// 检查服务是否可用
    pub async fn health_check(&self) -> Result<Value, ChannelError> {
        let endpoint = format!("{}/health", self.base_url);
        let response = self
            .with_session(self.client.get(&endpoint))
            .send()
            .await
            .map_err(|source| ChannelError::RequestFailed {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        if !(200..300).contains(&status) {
            return Err(ChannelError::Rejected {
                status,
                message: failure_message(status, &body),
            });
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
    }

    /// 提交单个文件
    pub async fn apply(
        &self,
        item: &AcceptedItem,
        destination: &Destination,
    ) -> Result<(), ChannelError> {
        let endpoint = format!("{}/apply/{}", self.base_url, destination);
        let candidate = item.candidate();

        let bytes = match candidate.payload() {
            PayloadHandle::File(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|source| ChannelError::PayloadUnavailable {
                        path: path.display().to_string(),
                        source,
                    })?
            }
            PayloadHandle::Memory(data) => data.to_vec(),
        };

        let part = multipart::Part::bytes(bytes)
            .file_name(candidate.name().to_string())
            .mime_str(candidate.kind().as_str())
            .map_err(|e| ChannelError::InvalidRequest(format!("无效的 MIME 类型: {}", e)))?;
        let form = multipart::Form::new().part("file", part);

        debug!("POST {} ({})", endpoint, candidate.name());

        let response = self
            .with_session(self.client.post(&endpoint))
            .multipart(form)
            .send()
            .await
            .map_err(|source| {
                error!("请求失败 {}: {}", endpoint, source);
                ChannelError::RequestFailed {
                    endpoint: endpoint.clone(),
                    source,
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        if (200..300).contains(&status) {
            debug!("提交结果: {}", body);
            Ok(())
        } else {
            Err(ChannelError::Rejected {
                status,
                message: failure_message(status, &body),
            })
        }
    }

    fn with_session(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.session_cookie {
            Some(cookie) => request.header(reqwest::header::COOKIE, cookie),
            None => request,
        }
    }
}

#[async_trait]
impl SubmissionChannel for HttpChannel {
    async fn submit(&self, item: &AcceptedItem, destination: &Destination) -> SubmitOutcome {
        match self.apply(item, destination).await {
            Ok(()) => {
                info!("✓ {} 已提交到职位 {}", item.name(), destination);
                SubmitOutcome::Success
            }
            Err(e) => SubmitOutcome::Failure(e.to_string()),
        }
    }
}

/// 从错误响应中取出服务端给出的 `error` 字段
fn failure_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP error! status: {}", status))
}
