// src/lib.rs

pub mod archiver;
pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod index;
pub mod logging;
pub mod manifest;
pub mod models;
pub mod render;
pub mod source;
pub mod symbols;
pub mod ui;
pub mod utils;

use crate::{
    archiver::ArchiveManager,
    cli::{Cli, Commands, DownloadMode},
    client::RobustClient,
    config::{AppConfig, session},
    error::*,
    index::IndexGate,
    manifest::{CourseManifest, ModuleEntry},
    models::{CourseMeta, CourseTree, LessonEvent, LessonTask},
    source::{CommunitySource, CourseSource},
};
use chrono::Utc;
use colored::*;
use log::{info, warn};
use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::sync::mpsc;

/// 一次下载运行中，所有工作单元共享的环境。克隆是廉价的 (内部全是
/// Arc / 发送端句柄)。
#[derive(Clone)]
pub struct ArchiveJobContext {
    pub manager: ArchiveManager,
    pub config: Arc<AppConfig>,
    pub http_client: Arc<RobustClient>,
    pub source: Arc<dyn CourseSource>,
    pub index_gate: Arc<IndexGate>,
    pub events: mpsc::UnboundedSender<LessonEvent>,
    pub cancellation_token: Arc<AtomicBool>,
    pub course_dir: PathBuf,
}

/// 进程级运行状态，显式传递而非全局变量。中断处理器持有它，以便在
/// 退出前对当前课程目录做最后一次索引重建。
pub struct RunContext {
    cancelled: Arc<AtomicBool>,
    active_course_dir: Mutex<Option<PathBuf>>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            active_course_dir: Mutex::new(None),
        }
    }

    pub fn cancellation_token(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    fn set_active_course_dir(&self, dir: &Path) {
        *self.active_course_dir.lock().unwrap() = Some(dir.to_path_buf());
    }

    /// 中断收尾: 通知工作单元停止认领新任务，并把索引页刷新到与磁盘
    /// 一致的状态。已在途的课时不被强杀，半成品由清单缺失标记。
    pub fn shutdown(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let dir = self.active_course_dir.lock().unwrap().clone();
        if let Some(dir) = dir {
            info!("收到中断，正在做最后一次索引重建");
            if let Err(e) = index::regenerate(&dir) {
                warn!("中断时的索引重建失败: {}", e);
            }
        }
    }
}

pub async fn run_from_cli(cli: Cli, run_ctx: Arc<RunContext>) -> AppResult<()> {
    match cli.command {
        Commands::Download {
            url,
            output,
            workers,
            mode,
            force_redownload,
            session,
        } => {
            run_download(
                &url,
                &output,
                workers,
                mode,
                force_redownload,
                session.as_deref(),
                run_ctx,
            )
            .await
        }
        Commands::Login { guide } => run_login(guide),
        Commands::Index { dir } => run_index(&dir),
    }
}

async fn run_download(
    url: &str,
    output: &Path,
    workers: Option<usize>,
    mode: DownloadMode,
    force_redownload: bool,
    cli_session: Option<&str>,
    run_ctx: Arc<RunContext>,
) -> AppResult<()> {
    ui::print_header(&format!("{} v{}", clap::crate_name!(), clap::crate_version!()));

    let (session_cookie, session_source) = session::resolve_session(cli_session);
    if session_cookie.is_some() {
        ui::info(&format!("已加载会话 (来源: {})", session_source));
    } else {
        ui::warn("未找到会话 Cookie，只能访问公开内容。可先运行 login 命令。");
    }

    // 单课时模式没有并发的意义
    let workers = match mode {
        DownloadMode::Course => workers,
        DownloadMode::Lesson => Some(1),
    };
    let config = Arc::new(AppConfig::new(workers, force_redownload)?);
    let http_client = Arc::new(RobustClient::new(config.clone(), session_cookie));
    let source: Arc<dyn CourseSource> =
        Arc::new(CommunitySource::new(http_client.clone(), config.clone()));

    // 课程结构获取失败时整个运行中止
    let (meta, tree) = source.fetch_course(url).await?;

    let course_dir = output
        .join(utils::sanitize_filename(&meta.group_name))
        .join(utils::sanitize_filename(&meta.course_name));
    std::fs::create_dir_all(&course_dir)?;
    run_ctx.set_active_course_dir(&course_dir);
    ui::info(&format!(
        "课程 '{}' → {}",
        meta.course_name,
        display_path(&course_dir)
    ));

    let index_gate = Arc::new(IndexGate::new());
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let manager = ArchiveManager::new();
    let context = ArchiveJobContext {
        manager: manager.clone(),
        config,
        http_client,
        source,
        index_gate: index_gate.clone(),
        events: event_tx,
        cancellation_token: run_ctx.cancellation_token(),
        course_dir: course_dir.clone(),
    };

    let cover_path = match &meta.cover_url {
        Some(cover_url) => archiver::download_cover(&context, cover_url, &course_dir).await,
        None => None,
    };

    // 课程清单先于任何工作单元落盘，这样即使首个课时中途失败，
    // 索引重建也有权威的命名与排序可依
    write_course_manifest(&course_dir, &meta, &tree, cover_path)?;

    let tasks = build_tasks(&tree, url, mode)?;
    manager.start_run(tasks.len());

    let consumer = tokio::spawn(consume_events(event_rx, manager.clone(), tasks.len() as u64));

    archiver::run_course_lessons(&context, &tasks).await;
    drop(context); // 释放最后一个发送端，让消费者退出

    if let Err(e) = consumer.await {
        warn!("事件消费任务异常退出: {}", e);
    }

    // 收尾索引重建必须等到所有中途刷新让出席位
    index_gate.final_pass(&course_dir).await;

    manager.print_report();
    println!(
        "\n{} 存档位置: {}",
        *symbols::INFO,
        display_path(&course_dir).cyan()
    );

    // 部分失败不打断运行，但要通过退出码让调用方知道
    if !manager.did_all_succeed() {
        return Err(AppError::Other(anyhow::anyhow!(
            "部分课时存档失败，详见上方报告"
        )));
    }
    Ok(())
}

/// 事件消费端: 更新进度条并把终态事件计入统计。
async fn consume_events(
    mut rx: mpsc::UnboundedReceiver<LessonEvent>,
    manager: ArchiveManager,
    total: u64,
) {
    let pbar = ui::new_tasks_progress_bar(total, "存档进度");
    while let Some(event) = rx.recv().await {
        match event {
            LessonEvent::Started { title } => {
                pbar.set_message(utils::truncate_text(&title, 40));
            }
            LessonEvent::Completed { title: _ } => {
                manager.record_completed();
                pbar.inc(1);
            }
            LessonEvent::Skipped { title, reason } => {
                manager.record_skip(&title, &reason);
                pbar.inc(1);
            }
            LessonEvent::Failed { title, error } => {
                manager.record_failure(&title, &error);
                pbar.inc(1);
            }
        }
    }
    pbar.finish_with_message("完成");
}

/// 把课程树展开成调度任务。单课时模式按链接中的课时标识过滤。
fn build_tasks(tree: &CourseTree, url: &str, mode: DownloadMode) -> AppResult<Vec<LessonTask>> {
    let mut tasks = Vec::new();
    for module in &tree.modules {
        let module_dir = utils::numbered_dir_name(module.index, &module.title);
        for lesson in &module.lessons {
            tasks.push(LessonTask {
                module_index: module.index,
                module_title: module.title.clone(),
                module_dir: module_dir.clone(),
                lesson: lesson.clone(),
            });
        }
    }

    if mode == DownloadMode::Lesson {
        let lesson_id = url::Url::parse(url)?
            .query_pairs()
            .find(|(k, _)| k == "md")
            .map(|(_, v)| v.into_owned())
            .ok_or_else(|| {
                AppError::Structural("单课时模式要求链接中带有课时标识 (md 参数)".to_string())
            })?;
        tasks.retain(|t| t.lesson.id == lesson_id);
        if tasks.is_empty() {
            return Err(AppError::Structural(format!(
                "课程中不存在标识为 '{}' 的课时",
                lesson_id
            )));
        }
    }
    Ok(tasks)
}

fn write_course_manifest(
    course_dir: &Path,
    meta: &CourseMeta,
    tree: &CourseTree,
    cover_path: Option<String>,
) -> AppResult<()> {
    let manifest = CourseManifest {
        course_name: meta.course_name.clone(),
        group_name: meta.group_name.clone(),
        cover_url: meta.cover_url.clone(),
        cover_path,
        modules: tree
            .modules
            .iter()
            .map(|m| ModuleEntry {
                index: m.index,
                title: m.title.clone(),
                dir_name: utils::numbered_dir_name(m.index, &m.title),
            })
            .collect(),
        updated_at: Utc::now(),
    };
    manifest::write_course_manifest(course_dir, &manifest)
}

fn run_login(guide: bool) -> AppResult<()> {
    if guide {
        let lines: Vec<&str> = constants::HELP_LOGIN_GUIDE.trim().lines().collect();
        ui::box_message("如何获取会话 Cookie", &lines, |s| s.cyan());
        return Ok(());
    }

    ui::print_header("保存平台会话");
    ui::info("提示: 运行 `login --guide` 查看获取 Cookie 的步骤。");
    let cookie = ui::prompt_hidden("请粘贴 auth_token Cookie 的值")?;
    let cookie = cookie.trim();
    if cookie.is_empty() {
        ui::warn("输入为空，未做任何更改。");
        return Ok(());
    }
    let external = config::ExternalConfig::default_app_config();
    session::save_session(cookie, &external.site_base)?;
    Ok(())
}

fn run_index(dir: &Path) -> AppResult<()> {
    if !dir.is_dir() {
        return Err(AppError::Other(anyhow::anyhow!(
            "目录不存在: {}",
            dir.display()
        )));
    }
    index::regenerate(dir)?;
    ui::info(&format!(
        "索引已重建: {}",
        display_path(&dir.join(constants::layout::COURSE_INDEX))
    ));
    Ok(())
}

/// 展示用路径: 能规范化就规范化 (dunce 避免 Windows 的 \\?\ 前缀)。
fn display_path(path: &Path) -> String {
    dunce::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
