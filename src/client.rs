// src/client.rs

use crate::{config::AppConfig, error::*};
use futures::StreamExt;
use reqwest::{IntoUrl, Response, StatusCode, header};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::{
    io::Write as IoWrite,
    path::Path,
    sync::Arc,
};

#[derive(Clone)]
pub struct RobustClient {
    pub client: ClientWithMiddleware,
    config: Arc<AppConfig>,
    session_cookie: Option<String>,
}

impl RobustClient {
    pub fn new(config: Arc<AppConfig>, session_cookie: Option<String>) -> Self {
        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(
            reqwest::Client::builder()
                .user_agent(config.user_agent.clone())
                .connect_timeout(config.connect_timeout)
                .timeout(config.timeout)
                .pool_max_idle_per_host(config.max_workers * 3)
                .build()
                .unwrap(),
        )
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build();

        Self {
            client,
            config,
            session_cookie,
        }
    }

    fn request<T: IntoUrl>(&self, url: T) -> reqwest_middleware::RequestBuilder {
        let mut builder = self
            .client
            .get(url)
            .header(header::REFERER, self.config.site_base.clone());
        if let Some(cookie) = &self.session_cookie {
            builder = builder.header(header::COOKIE, format!("auth_token={}", cookie));
        }
        builder
    }

    pub async fn get<T: IntoUrl>(&self, url: T) -> AppResult<Response> {
        let res = self.request(url).send().await?;
        if res.status() == StatusCode::UNAUTHORIZED || res.status() == StatusCode::FORBIDDEN {
            return Err(AppError::SessionInvalid);
        }
        Ok(res.error_for_status()?)
    }

    pub async fn get_text<T: IntoUrl>(&self, url: T) -> AppResult<String> {
        Ok(self.get(url).await?.text().await?)
    }

    pub async fn get_json<T: IntoUrl>(&self, url: T) -> AppResult<serde_json::Value> {
        Ok(self.get(url).await?.json().await?)
    }

    /// 将一个二进制资源流式写入磁盘。目标目录必须已存在。
    /// 先写入同目录临时文件，全部字节落盘后才改名到最终路径:
    /// 最终路径上要么没有文件，要么就是完整的文件，中途断流不会留下
    /// 能通过非空存在性检查的半成品。
    pub async fn fetch_to_file(&self, url: &str, dest: &Path) -> AppResult<()> {
        let parent = dest.parent().ok_or_else(|| {
            AppError::Other(anyhow::anyhow!("下载路径 '{}' 缺少父目录", dest.display()))
        })?;
        let res = self.get(url).await?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        let mut stream = res.bytes_stream();
        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result?;
            tmp.write_all(&chunk)?;
        }
        tmp.flush()?;
        tmp.persist(dest)?;
        Ok(())
    }
}
