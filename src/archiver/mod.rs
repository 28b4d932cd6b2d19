// src/archiver/mod.rs

mod assets;
mod lesson;
mod resources;
mod scheduler;
mod signed_url;
mod video;

pub use assets::download_cover;
pub use lesson::{LessonOutcome, LessonWorker};
pub use resources::ResourceResolver;
pub use scheduler::{run_bounded, run_course_lessons};
pub use signed_url::{PlaybackResolution, PollPolicy, SignedUrlResolver};
pub use video::VideoAcquirer;

use crate::{symbols, ui};
use colored::*;
use log::info;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

#[derive(Clone, Default)]
pub struct ArchiveStats {
    pub total: usize,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// 跨课时的运行期统计。只存在于一次运行内，持久状态一律以磁盘清单为准。
#[derive(Clone)]
pub struct ArchiveManager {
    stats: Arc<Mutex<ArchiveStats>>,
    failed_lessons: Arc<Mutex<Vec<(String, String)>>>,
    skipped_lessons: Arc<Mutex<Vec<(String, String)>>>,
}

impl Default for ArchiveManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveManager {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(Mutex::new(ArchiveStats::default())),
            failed_lessons: Arc::new(Mutex::new(Vec::new())),
            skipped_lessons: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn start_run(&self, total_lessons: usize) {
        info!("开始新一轮课程存档，课时总数: {}", total_lessons);
        let mut stats = self.stats.lock().unwrap();
        *stats = ArchiveStats {
            total: total_lessons,
            ..Default::default()
        };
        self.failed_lessons.lock().unwrap().clear();
        self.skipped_lessons.lock().unwrap().clear();
    }

    pub fn record_completed(&self) {
        self.stats.lock().unwrap().completed += 1;
    }

    pub fn record_skip(&self, title: &str, reason: &str) {
        info!("跳过课时 '{}'，原因: {}", title, reason);
        self.stats.lock().unwrap().skipped += 1;
        self.skipped_lessons
            .lock()
            .unwrap()
            .push((title.to_string(), reason.to_string()));
    }

    pub fn record_failure(&self, title: &str, reason: &str) {
        log::error!("课时 '{}' 存档失败: {}", title, reason);
        self.stats.lock().unwrap().failed += 1;
        self.failed_lessons
            .lock()
            .unwrap()
            .push((title.to_string(), reason.to_string()));
    }

    pub fn get_stats(&self) -> ArchiveStats {
        self.stats.lock().unwrap().clone()
    }

    pub fn did_all_succeed(&self) -> bool {
        self.stats.lock().unwrap().failed == 0
    }

    pub fn print_report(&self) {
        let stats = self.get_stats();
        let skipped = self.skipped_lessons.lock().unwrap();
        let failed = self.failed_lessons.lock().unwrap();
        info!(
            "存档报告: Total={}, Completed={}, Skipped={}, Failed={}",
            stats.total, stats.completed, stats.skipped, stats.failed
        );

        if !skipped.is_empty() || !failed.is_empty() {
            ui::print_sub_header("课时详情报告");
            if !skipped.is_empty() {
                println!("\n{} 跳过的课时 ({}个):", *symbols::INFO, stats.skipped);
                print_grouped_report(&skipped, |s| s.cyan());
            }
            if !failed.is_empty() {
                println!("\n{} 失败的课时 ({}个):", *symbols::ERROR, stats.failed);
                print_grouped_report(&failed, |s| s.red());
            }
        }
        ui::print_sub_header("任务总结");
        if stats.total > 0 && stats.completed == stats.total - stats.skipped {
            println!(
                "{} 所有 {} 个课时均已完成 ({} 个已跳过)。",
                *symbols::OK,
                stats.total,
                stats.skipped
            );
        } else {
            let summary = format!(
                "{} | {} | {}",
                format!("完成: {}", stats.completed).green(),
                format!("失败: {}", stats.failed).red(),
                format!("跳过: {}", stats.skipped).yellow()
            );
            println!("{}", summary);
        }
    }
}

// 模块内的私有辅助函数
fn print_grouped_report(
    items: &[(String, String)],
    color_fn: fn(ColoredString) -> ColoredString,
) {
    let mut grouped: HashMap<&String, Vec<&String>> = HashMap::new();
    for (title, reason) in items {
        grouped.entry(reason).or_default().push(title);
    }
    let mut sorted_reasons: Vec<_> = grouped.keys().collect();
    sorted_reasons.sort();
    for reason in sorted_reasons {
        println!("  - {}", color_fn(format!("原因: {}", reason).into()));
        let mut titles = grouped.get(reason).unwrap().clone();
        titles.sort();
        for title in titles {
            println!("    - {}", title);
        }
    }
}
