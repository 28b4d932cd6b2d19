// src/archiver/scheduler.rs
//
// 拉取式并发池: 一个共享游标扫过任务列表，K 个工作协程各自循环认领
// 下一个未认领的任务，直到列表耗尽。不需要信号量或条件变量，且在课时
// 耗时差异很大时 (有的带大视频，有的没有) 自然实现负载均衡。

use super::lesson::{LessonOutcome, LessonWorker};
use crate::{
    ArchiveJobContext,
    constants,
    models::{LessonEvent, LessonTask},
};
use log::{debug, error};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 以至多 `bound` 的并发度处理全部任务。任何一个任务的失败都不会
/// 取消或阻塞其余任务；所有任务到达终态后才返回。bound 被钳制在
/// [1, 16]，1 即严格顺序执行。
pub async fn run_bounded<T, F, Fut>(items: &[T], bound: usize, handler: F)
where
    T: Clone,
    F: Fn(usize, T) -> Fut,
    Fut: Future<Output = ()>,
{
    if items.is_empty() {
        return;
    }
    let bound = bound
        .clamp(constants::MIN_WORKERS, constants::MAX_WORKERS)
        .min(items.len());
    debug!("启动并发池: {} 个任务, 并发度 {}", items.len(), bound);

    let cursor = AtomicUsize::new(0);
    let cursor = &cursor;
    let handler = &handler;

    let workers = (0..bound).map(|worker_id| async move {
        loop {
            let i = cursor.fetch_add(1, Ordering::SeqCst);
            let Some(item) = items.get(i) else {
                debug!("工作协程 {} 退出: 任务已耗尽", worker_id);
                break;
            };
            handler(i, item.clone()).await;
        }
    });
    futures::future::join_all(workers).await;
}

/// 课程级调度入口: 把每个课时交给一个 LessonWorker，并把结果转换为
/// 生命周期事件。单个课时内部抛出的任何错误都在这里被拦下，转成
/// Failed 事件，绝不向上传播 —— 部分成功是预期结果而非运行错误。
pub async fn run_course_lessons(context: &ArchiveJobContext, tasks: &[LessonTask]) {
    run_bounded(tasks, context.config.max_workers, |_, task| {
        let context = context.clone();
        async move {
            if context
                .cancellation_token
                .load(std::sync::atomic::Ordering::Relaxed)
            {
                return;
            }
            let title = task.lesson.title.clone();
            let _ = context.events.send(LessonEvent::Started {
                title: title.clone(),
            });

            let worker = LessonWorker::new(context.clone());
            let event = match worker.run(&task).await {
                Ok(LessonOutcome::Completed) => LessonEvent::Completed { title },
                Ok(LessonOutcome::Skipped(reason)) => LessonEvent::Skipped { title, reason },
                Err(e) => {
                    error!("课时 '{}' 在工作单元边界捕获错误: {}", title, e);
                    LessonEvent::Failed {
                        title,
                        error: e.to_string(),
                    }
                }
            };
            let _ = context.events.send(event);
        }
    })
    .await;
}
