// 该文件是 Fenlei （分类） 项目的一部分。
// src/bin/benchmark_repeatshot.rs - 推理耗时测试
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

use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::info;

use fenlei::{
  Classifier, FromUrl,
  args::ClassifyArgs,
  input::InputWrapper,
  model::{HostedModel, Model, OnnxModelBuilder},
  output::OutputWrapper,
  task::{RepeatShotTask, Task},
};

/// 对同一张图像重复分类，统计平均耗时
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  #[command(flatten)]
  pub classify: ClassifyArgs,

  /// 重复次数
  #[arg(long, value_name = "REPEAT", default_value_t = 100)]
  pub repeat: usize,
}

async fn run<M: Model + 'static>(args: &Args, model: M) -> Result<()> {
  let classify = &args.classify;
  let classifier = Arc::new(Classifier::new(classify.classifier_config()?, model)?);
  let input = InputWrapper::from_url(&classify.input)?;
  let output = OutputWrapper::from_url(&classify.output)?;

  RepeatShotTask::default()
    .with_repeat(args.repeat)
    .run_task(input, classifier, output)
    .await
}

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型: {}", args.classify.model);
  info!("输入来源: {}", args.classify.input);
  info!("重复次数: {}", args.repeat);

  let model_url = args.classify.model.clone();
  match model_url.scheme() {
    "onnx" => run(&args, OnnxModelBuilder::from_url(&model_url)?.build().await?).await,
    "http" | "https" => run(&args, HostedModel::from_url(&model_url)?).await,
    other => bail!("不支持的模型来源: {}", other),
  }
}
