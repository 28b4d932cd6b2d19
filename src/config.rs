// src/config.rs

pub mod session;

use self::session::load_or_create_external_config;
use crate::{constants, error::AppResult};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::PathBuf, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkConfig {
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VideoToolConfig {
    /// 外部视频工具的可执行文件名 (默认 yt-dlp)
    pub command: Option<String>,
    /// 并行下载的分片数
    pub concurrent_fragments: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub video_tool: VideoToolConfig,
    pub url_templates: HashMap<String, String>,
    /// 平台自有的文件托管域名；指向其他域名的资源视为外部链接
    pub file_host: String,
    pub site_base: String,
}

impl ExternalConfig {
    pub(crate) fn default_app_config() -> Self {
        let url_templates = HashMap::from([
            (
                "STREAM_MANIFEST".into(),
                "https://stream.mux.com/{playback_id}.m3u8?token={token}".into(),
            ),
            (
                "FILE_DOWNLOAD_URL".into(),
                "https://www.skool.com/api/files/{file_id}/download-url?expires_in={expiry}".into(),
            ),
        ]);

        Self {
            session_cookie: None,
            network: NetworkConfig {
                connect_timeout_secs: Some(10),
                timeout_secs: Some(60),
                max_retries: Some(3),
            },
            video_tool: VideoToolConfig {
                command: Some("yt-dlp".into()),
                concurrent_fragments: Some(4),
            },
            url_templates,
            file_host: "files.skool.com".into(),
            site_base: "https://www.skool.com".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub max_workers: usize,
    pub force_redownload: bool,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub max_retries: u32,
    pub url_templates: HashMap<String, String>,
    pub file_host: String,
    pub site_base: String,
    pub video_tool: String,
    pub video_fragments: u32,
    pub cookies_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn new(workers: Option<usize>, force_redownload: bool) -> AppResult<Self> {
        let external_config = load_or_create_external_config()?;

        let max_workers = workers
            .unwrap_or(constants::DEFAULT_WORKERS)
            .clamp(constants::MIN_WORKERS, constants::MAX_WORKERS);

        Ok(Self {
            max_workers,
            force_redownload,
            user_agent: constants::USER_AGENT.into(),
            connect_timeout: Duration::from_secs(
                external_config.network.connect_timeout_secs.unwrap_or(10),
            ),
            timeout: Duration::from_secs(external_config.network.timeout_secs.unwrap_or(60)),
            max_retries: external_config.network.max_retries.unwrap_or(3),
            url_templates: external_config.url_templates,
            file_host: external_config.file_host,
            site_base: external_config.site_base,
            video_tool: external_config
                .video_tool
                .command
                .unwrap_or_else(|| "yt-dlp".into()),
            video_fragments: external_config.video_tool.concurrent_fragments.unwrap_or(4),
            cookies_file: session::cookies_file_path().ok().filter(|p| p.is_file()),
        })
    }

    pub fn url_template(&self, key: &str) -> Option<&str> {
        self.url_templates.get(key).map(|s| s.as_str())
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            force_redownload: false,
            user_agent: "test-agent/1.0".to_string(),
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(15),
            max_retries: 3,
            url_templates: ExternalConfig::default_app_config().url_templates,
            file_host: "files.skool.com".to_string(),
            site_base: "https://www.skool.com".to_string(),
            video_tool: "yt-dlp".to_string(),
            video_fragments: 4,
            cookies_file: None,
        }
    }
}
