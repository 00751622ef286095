// 该文件是 Fenlei （分类） 项目的一部分。
// src/task.rs - 任务运行
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::{Duration, Instant},
};

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::{
  classifier::{Classified, Classifier},
  input::ImageSource,
  model::Model,
  output::Render,
};

#[async_trait]
pub trait Task<I, M, O>: Sized
where
  M: Model,
{
  type Error;
  async fn run_task(
    self,
    input: I,
    classifier: Arc<Classifier<M>>,
    output: O,
  ) -> Result<(), Self::Error>;
}

pub struct OneShotTask;

#[async_trait]
impl<I, M, O, RE> Task<I, M, O> for OneShotTask
where
  I: Iterator<Item = ImageSource> + Send + 'static,
  M: Model + 'static,
  O: Render<Classified, Error = RE> + Send + Sync + 'static,
  RE: std::error::Error + Send + Sync + 'static,
{
  type Error = anyhow::Error;

  async fn run_task(
    self,
    mut input: I,
    classifier: Arc<Classifier<M>>,
    output: O,
  ) -> Result<(), Self::Error> {
    info!("开始任务...");
    let source = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))?;
    info!("输入图像: {}，开始分类...", source.name());
    let now = Instant::now();
    let result = classifier.classify_source(source).await?;
    let elapsed = now.elapsed();
    info!("分类完成，耗时: {:.2?}", elapsed);
    output.render_result(&result)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

/// 对同一张图像重复分类，统计平均耗时
pub struct RepeatShotTask {
  repeat: usize,
}

impl Default for RepeatShotTask {
  fn default() -> Self {
    Self { repeat: 100 }
  }
}

impl RepeatShotTask {
  pub fn with_repeat(mut self, repeat: usize) -> Self {
    self.repeat = repeat.max(1);
    self
  }
}

// 前两次视为预热
const WARMUP_RUNS: usize = 2;

#[async_trait]
impl<I, M, O, RE> Task<I, M, O> for RepeatShotTask
where
  I: Iterator<Item = ImageSource> + Send + 'static,
  M: Model + 'static,
  O: Render<Classified, Error = RE> + Send + Sync + 'static,
  RE: std::error::Error + Send + Sync + 'static,
{
  type Error = anyhow::Error;

  async fn run_task(
    self,
    mut input: I,
    classifier: Arc<Classifier<M>>,
    output: O,
  ) -> Result<(), Self::Error> {
    info!("开始任务...");
    let source = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))?;
    let source = source.load().await?;
    info!("输入图像读取成功，开始推理...");

    let mut times = Vec::with_capacity(self.repeat);
    let mut last = None;
    for i in 0..self.repeat {
      let now = Instant::now();
      let classification = classifier.classify(&source.image).await?;
      let elapsed = now.elapsed();
      info!("({})分类完成，耗时: {:.2?}", i, elapsed);
      times.push(elapsed);
      last = Some(classification);
    }

    if let Some(classification) = last {
      let canvas = classifier.preprocessor().canvas(&source.image)?;
      output.render_result(&Classified {
        name: source.name,
        canvas,
        classification,
      })?;
    }

    let measured = if times.len() > WARMUP_RUNS {
      &times[WARMUP_RUNS..]
    } else {
      &times[..]
    };
    warn!(
      "平均分类时间: {:.2?} ({} 次)",
      measured.iter().sum::<Duration>() / measured.len() as u32,
      measured.len()
    );

    Ok(())
  }
}

/// 依次处理全部输入，单张失败只记录日志
#[derive(Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
  batch_size: usize,
}

impl Default for ContinuousTask {
  fn default() -> Self {
    Self {
      frame_number: None,
      batch_size: 1,
    }
  }
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  /// 每批并发分类的图像数
  pub fn with_batch_size(mut self, batch_size: usize) -> Self {
    self.batch_size = batch_size.max(1);
    self
  }
}

#[async_trait]
impl<I, M, O, RE> Task<I, M, O> for ContinuousTask
where
  I: Iterator<Item = ImageSource> + Send + 'static,
  M: Model + 'static,
  O: Render<Classified, Error = RE> + Send + Sync + 'static,
  RE: std::error::Error + Send + Sync + 'static,
{
  type Error = anyhow::Error;

  async fn run_task(
    self,
    input: I,
    classifier: Arc<Classifier<M>>,
    output: O,
  ) -> Result<(), Self::Error> {
    info!("开始任务...");
    let interrupted = Arc::new(AtomicBool::new(false));
    {
      let interrupted = Arc::clone(&interrupted);
      ctrlc::set_handler(move || {
        info!("收到中断信号，准备退出...");
        interrupted.store(true, Ordering::SeqCst);
      })?;
    }

    let limit = self.frame_number.unwrap_or(usize::MAX);
    let mut input = input.take(limit);
    let mut frame_index = 0usize;
    let mut failures = 0usize;

    loop {
      let batch: Vec<ImageSource> = input.by_ref().take(self.batch_size).collect();
      if batch.is_empty() {
        break;
      }

      let now = Instant::now();
      let count = batch.len();
      for result in classifier.classify_all(batch).await {
        frame_index += 1;
        match result {
          Ok(result) => {
            if let Err(e) = output.render_result(&result) {
              error!("第 {} 张图像渲染失败: {}", frame_index, e);
              failures += 1;
            }
          }
          Err(e) => {
            error!("第 {} 张图像分类失败: {}", frame_index, e);
            failures += 1;
          }
        }
      }
      info!("处理 {} 张图像，耗时: {:.2?}", count, now.elapsed());

      if interrupted.load(Ordering::SeqCst) {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    if frame_index >= limit {
      info!("达到指定帧数 {}, 退出任务循环", limit);
    }
    info!("任务完成，共 {} 张，失败 {} 张", frame_index, failures);
    Ok(())
  }
}

