// 该文件是 Fenlei （分类） 项目的一部分。
// src/bin/simple_oneshot.rs - 单张图像分类
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
  task::{OneShotTask, Task},
};

/// 对单张图像进行分类
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  #[command(flatten)]
  pub classify: ClassifyArgs,
}

async fn run<M: Model + 'static>(args: &ClassifyArgs, model: M) -> Result<()> {
  let classifier = Arc::new(Classifier::new(args.classifier_config()?, model)?);
  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  OneShotTask.run_task(input, classifier, output).await
}

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse().classify;

  info!("模型: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出: {}", args.output);

  match args.model.scheme() {
    "onnx" => run(&args, OnnxModelBuilder::from_url(&args.model)?.build().await?).await,
    "http" | "https" => run(&args, HostedModel::from_url(&args.model)?).await,
    other => bail!("不支持的模型来源: {}", other),
  }
}
