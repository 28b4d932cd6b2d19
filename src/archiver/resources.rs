// src/archiver/resources.rs
//
// 附件解析与下载。两个来源的资源 (结构化元数据 + 正文扫描) 按归一化
// 标题合并去重，元数据一方在标题冲突时为准；平台自有托管且只有文件
// 标识的资源需要先通过 API 换取限时签名下载地址。

use crate::{
    ArchiveJobContext,
    constants,
    error::*,
    models::Resource,
    utils,
};
use itertools::Itertools;
use log::{debug, info, warn};
use serde_json::Value;
use std::path::Path;

pub struct ResourceResolver<'a> {
    context: &'a ArchiveJobContext,
}

impl<'a> ResourceResolver<'a> {
    pub fn new(context: &'a ArchiveJobContext) -> Self {
        Self { context }
    }

    /// 合并规则: 元数据资源全部保留；正文扫描到的资源仅在没有同名
    /// (归一化后) 条目时才加入。
    pub fn merge(meta: Vec<Resource>, dom: Vec<Resource>) -> Vec<Resource> {
        meta.into_iter()
            .chain(dom)
            .unique_by(|r| utils::normalize_title(&r.title))
            .collect()
    }

    /// 以文件标识换取签名下载地址。任何非成功响应都是软失败。
    async fn exchange_download_url(&self, file_id: &str) -> AppResult<String> {
        let template = self
            .context
            .config
            .url_template("FILE_DOWNLOAD_URL")
            .ok_or_else(|| {
                AppError::Other(anyhow::anyhow!("配置缺少 FILE_DOWNLOAD_URL 模板"))
            })?;
        let url = template
            .replace("{file_id}", file_id)
            .replace("{expiry}", &constants::DOWNLOAD_URL_EXPIRY_SECS.to_string());

        let body: Value = self.context.http_client.get_json(&url).await?;
        // 下载地址字段优先级: url > downloadUrl
        body.get("url")
            .and_then(Value::as_str)
            .or_else(|| body.get("downloadUrl").and_then(Value::as_str))
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::Structural(format!("文件 '{}' 的签名地址响应中缺少 url 字段", file_id))
            })
    }

    /// 逐个下载可下载资源，返回成功落盘 (或已存在) 的数量。
    /// 外部资源从不下载，只会被渲染为出站链接。
    pub async fn download_all(&self, resources: &[Resource], resources_dir: &Path) -> usize {
        let downloadable: Vec<&Resource> = resources.iter().filter(|r| !r.is_external).collect();
        if downloadable.is_empty() {
            return 0;
        }
        if let Err(e) = std::fs::create_dir_all(resources_dir) {
            warn!("无法创建附件目录 {:?}: {}", resources_dir, e);
            return 0;
        }

        let mut count = 0;
        for resource in downloadable {
            match self.download_one(resource, resources_dir).await {
                Ok(true) => count += 1,
                Ok(false) => {}
                Err(e) => {
                    // 单个附件失败不影响课时完成
                    warn!("附件 '{}' 下载失败，已跳过: {}", resource.title, e);
                }
            }
        }
        count
    }

    async fn download_one(&self, resource: &Resource, resources_dir: &Path) -> AppResult<bool> {
        let url = match (&resource.url, &resource.file_id) {
            (Some(url), _) => url.clone(),
            (None, Some(file_id)) => {
                debug!("附件 '{}' 需要换取签名下载地址", resource.title);
                self.exchange_download_url(file_id).await?
            }
            (None, None) => {
                warn!("附件 '{}' 既无直链也无文件标识，忽略", resource.title);
                return Ok(false);
            }
        };

        let file_name = resource
            .file_name
            .clone()
            .unwrap_or_else(|| utils::sanitize_filename(&resource.title));
        let dest = resources_dir.join(utils::sanitize_filename(&file_name));

        if !self.context.config.force_redownload && utils::is_nonempty_file(&dest) {
            debug!("附件已存在，跳过: {:?}", dest.file_name());
            return Ok(true);
        }
        self.context.http_client.fetch_to_file(&url, &dest).await?;
        info!("附件 '{}' 已下载", resource.title);
        Ok(true)
    }

    /// 资源在本地的展示文件名 (用于页面渲染)。
    pub fn local_file_name(resource: &Resource) -> String {
        let name = resource
            .file_name
            .clone()
            .unwrap_or_else(|| utils::sanitize_filename(&resource.title));
        utils::sanitize_filename(&name)
    }
}
