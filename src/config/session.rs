// src/config/session.rs

use crate::{
    config::ExternalConfig,
    constants,
    error::{AppError, AppResult},
};
use anyhow::{Context, anyhow};
use log::{debug, info};
use std::{fs, path::PathBuf};

fn config_dir() -> AppResult<PathBuf> {
    let dir = dirs::home_dir()
        .ok_or_else(|| AppError::Other(anyhow!("无法获取用户主目录")))?
        .join(constants::CONFIG_DIR_NAME);
    Ok(dir)
}

pub(super) fn get_config_path() -> AppResult<PathBuf> {
    Ok(config_dir()?.join(constants::CONFIG_FILE_NAME))
}

pub fn cookies_file_path() -> AppResult<PathBuf> {
    Ok(config_dir()?.join(constants::COOKIES_FILE_NAME))
}

pub(crate) fn load_or_create_external_config() -> AppResult<ExternalConfig> {
    let config_path = get_config_path()?;
    if config_path.is_file() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("读取配置文件 '{}' 失败", config_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件 '{}' 失败", config_path.display()))
            .map_err(AppError::from)
    } else {
        info!("配置文件 {:?} 不存在，将创建默认配置。", config_path);
        let config = ExternalConfig::default_app_config();

        if let Some(dir) = config_path.parent() {
            fs::create_dir_all(dir)?;
        }

        let json_content = serde_json::to_string_pretty(&config)?;
        fs::write(&config_path, json_content)?;

        Ok(config)
    }
}

/// 保存会话 Cookie，并生成供外部视频工具使用的 Netscape 格式 cookies.txt。
pub fn save_session(cookie: &str, site_base: &str) -> AppResult<()> {
    if cookie.is_empty() {
        return Ok(());
    }

    let config_path = get_config_path()?;
    let mut config = load_or_create_external_config()?;
    config.session_cookie = Some(cookie.to_string());

    let json_content = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, json_content)
        .with_context(|| format!("保存会话到 '{}' 失败", config_path.display()))?;

    write_cookies_txt(cookie, site_base)?;

    info!("会话已保存至配置文件: {}", config_path.display());
    println!(
        "{} 会话已成功保存至: {}",
        *crate::symbols::INFO,
        config_path.display()
    );
    Ok(())
}

fn write_cookies_txt(cookie: &str, site_base: &str) -> AppResult<()> {
    let domain = url::Url::parse(site_base)?
        .host_str()
        .map(|h| h.trim_start_matches("www.").to_string())
        .ok_or_else(|| AppError::Other(anyhow!("站点地址 '{}' 缺少域名", site_base)))?;

    let path = cookies_file_path()?;
    let content = format!(
        "# Netscape HTTP Cookie File\n.{domain}\tTRUE\t/\tTRUE\t0\tauth_token\t{cookie}\n"
    );
    fs::write(&path, content)
        .with_context(|| format!("写入 cookies 文件 '{}' 失败", path.display()))?;
    debug!("已更新 cookies 文件: {}", path.display());
    Ok(())
}

pub fn load_session_from_config() -> Option<String> {
    load_or_create_external_config()
        .ok()
        .and_then(|config| config.session_cookie)
}

/// 解析会话 Cookie，返回 (值, 来源描述)。优先级: 命令行参数 > 环境变量 > 配置文件。
pub fn resolve_session(cli_session: Option<&str>) -> (Option<String>, String) {
    if let Some(cookie) = cli_session && !cookie.is_empty() {
        debug!("使用来自命令行参数的会话");
        return (Some(cookie.to_string()), "命令行参数".to_string());
    }
    if let Ok(cookie) = std::env::var("SKL_SESSION") && !cookie.is_empty() {
        debug!("使用来自环境变量 SKL_SESSION 的会话");
        return (Some(cookie), "环境变量 (SKL_SESSION)".to_string());
    }
    if let Some(cookie) = load_session_from_config() && !cookie.is_empty() {
        debug!("使用来自本地配置文件的会话");
        return (Some(cookie), "本地配置文件".to_string());
    }
    debug!("未在任何位置找到可用的会话");
    (None, "未找到".to_string())
}
