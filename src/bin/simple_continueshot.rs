// 该文件是 Fenlei （分类） 项目的一部分。
// src/bin/simple_continueshot.rs - 连续分类
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
  task::{ContinuousTask, Task},
};

/// 依次分类输入中的全部图像
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  #[command(flatten)]
  pub classify: ClassifyArgs,

  /// 最多处理的图像数
  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,

  /// 每批并发分类的图像数
  #[arg(long, value_name = "BATCH", default_value_t = 4)]
  pub batch: usize,
}

async fn run<M: Model + 'static>(args: &Args, model: M) -> Result<()> {
  let classify = &args.classify;
  let classifier = Arc::new(Classifier::new(classify.classifier_config()?, model)?);
  let input = InputWrapper::from_url(&classify.input)?;
  let output = OutputWrapper::from_url(&classify.output)?;

  ContinuousTask::default()
    .with_frame_number(args.frame_number)
    .with_batch_size(args.batch)
    .run_task(input, classifier, output)
    .await
}

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型: {}", args.classify.model);
  info!("输入来源: {}", args.classify.input);
  info!("输出: {}", args.classify.output);

  let model_url = args.classify.model.clone();
  match model_url.scheme() {
    "onnx" => run(&args, OnnxModelBuilder::from_url(&model_url)?.build().await?).await,
    "http" | "https" => run(&args, HostedModel::from_url(&model_url)?).await,
    other => bail!("不支持的模型来源: {}", other),
  }
}
