// src/archiver/assets.rs
//
// 图片与封面的幂等下载。目标路径上存在非空文件即视为此前已成功下载，
// 这是唯一的续传依据，单个资产不另设完成台账。

use crate::{ArchiveJobContext, constants::layout, error::*, utils};
use itertools::Itertools;
use log::{debug, warn};
use regex::Regex;
use std::{
    path::Path,
    sync::LazyLock,
};

static IMG_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img[^>]+src="(https?://[^"]+)""#).unwrap());

#[derive(Debug, PartialEq, Eq)]
pub(super) enum AssetOutcome {
    Downloaded,
    Skipped,
}

/// 若目标文件尚不存在 (或为空)，则下载；否则短路跳过。
pub(super) async fn download_if_missing(
    context: &ArchiveJobContext,
    url: &str,
    dest: &Path,
) -> AppResult<AssetOutcome> {
    if !context.config.force_redownload && utils::is_nonempty_file(dest) {
        debug!("文件已存在，跳过下载: {:?}", dest.file_name());
        return Ok(AssetOutcome::Skipped);
    }
    context.http_client.fetch_to_file(url, dest).await?;
    Ok(AssetOutcome::Downloaded)
}

/// 将正文中的远程图片本地化: 为每个图片 URL 计算确定性的本地文件名
/// (URL 短哈希 + URL 末段文件名，哈希保证无需查找表即可避免碰撞)，
/// 逐个按需下载，并把 HTML 中的远程地址替换为本地相对路径。
/// 单张图片失败只记录日志，正文保留原始远程地址。
pub(super) async fn localize_images(
    context: &ArchiveJobContext,
    body_html: &str,
    assets_dir: &Path,
) -> AppResult<String> {
    let urls: Vec<String> = IMG_SRC_RE
        .captures_iter(body_html)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .unique()
        .collect();
    if urls.is_empty() {
        return Ok(body_html.to_string());
    }

    let mut rewritten = body_html.to_string();
    for url in urls {
        let local_name = format!(
            "{}-{}",
            utils::short_url_hash(&url),
            utils::url_basename(&url)
        );
        let dest = assets_dir.join(&local_name);
        match download_if_missing(context, &url, &dest).await {
            Ok(_) => {
                // 只替换整个 src 属性值: 一个 URL 是另一个 URL 前缀时，
                // 裸字符串替换会把较长的那个改烂
                let relative = format!("{}/{}", layout::ASSETS_DIR, local_name);
                rewritten = rewritten.replace(
                    &format!("src=\"{}\"", url),
                    &format!("src=\"{}\"", relative),
                );
            }
            Err(e) => {
                warn!("图片 '{}' 下载失败，正文保留远程地址: {}", url, e);
            }
        }
    }
    Ok(rewritten)
}

/// 下载课程封面到课程目录。失败不致命。
pub async fn download_cover(
    context: &ArchiveJobContext,
    cover_url: &str,
    course_dir: &Path,
) -> Option<String> {
    let assets_dir = course_dir.join(layout::ASSETS_DIR);
    if let Err(e) = std::fs::create_dir_all(&assets_dir) {
        warn!("无法创建封面目录: {}", e);
        return None;
    }
    let dest = assets_dir.join(layout::COVER_FILE);
    match download_if_missing(context, cover_url, &dest).await {
        Ok(_) => Some(format!("{}/{}", layout::ASSETS_DIR, layout::COVER_FILE)),
        Err(e) => {
            warn!("课程封面下载失败: {}", e);
            None
        }
    }
}
