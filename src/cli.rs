// src/cli.rs

use crate::constants;
use clap::{Parser, Subcommand, ValueEnum, command, crate_version};
use std::path::PathBuf;

/// 定义日志输出级别
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// 下载模式: 整个课程或单个课时
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum DownloadMode {
    Course,
    Lesson,
}

#[derive(Parser, Debug, Clone)]
#[command(
    version = crate_version!(),
    about,
    long_about = None,
    arg_required_else_help = true,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// (隐藏参数) 设置日志文件的输出级别，用于调试
    #[arg(long, value_enum, default_value_t = LogLevel::Off, global = true, hide = true)]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 下载并存档一个课程 (或单个课时)
    Download {
        /// 课程或课时页面的链接
        url: String,
        /// 设置文件保存目录
        #[arg(short, long, value_name = "DIR", default_value_os_t = PathBuf::from(constants::DEFAULT_SAVE_DIR))]
        output: PathBuf,
        /// 设置最大并发课时数 (限制在 1-16 之间)
        #[arg(short, long, value_parser = clap::value_parser!(usize))]
        workers: Option<usize>,
        /// 指定链接指向的是课程还是单个课时
        #[arg(long, value_enum, default_value_t = DownloadMode::Course)]
        mode: DownloadMode,
        /// 强制重新下载已存在的文件
        #[arg(short, long, action = clap::ArgAction::SetTrue)]
        force_redownload: bool,
        /// 提供会话 Cookie，优先级高于配置文件
        #[arg(long)]
        session: Option<String>,
    },
    /// 保存平台会话 Cookie，供后续下载使用
    Login {
        /// 显示如何获取会话 Cookie 的指南并退出
        #[arg(long, action = clap::ArgAction::SetTrue)]
        guide: bool,
    },
    /// 根据磁盘上的清单重建课程导航页
    Index {
        /// 课程目录 (包含 .course.json 的目录)
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },
}
