// 该文件是 Fenlei （分类） 项目的一部分。
// src/args.rs - 命令行参数
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

use clap::{Args, ValueEnum};
use url::Url;

use crate::{
  DEFAULT_HEIGHT, DEFAULT_WIDTH,
  classifier::ClassifierConfig,
  frame::Normalization,
  label::{LabelOrder, LabelSet, RankError},
};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizationArg {
  /// 0-255 原始像素
  #[default]
  Raw,
  /// ImageNet 均值方差
  Imagenet,
}

/// 各个可执行程序共用的参数
#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
  /// 模型来源
  /// - ONNX: onnx:///path/to/model.onnx?threads=4&opt=3
  /// - 远程推理服务: https://host/invocations
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 输入来源
  /// - 图片: image:///path/to/cat.jpg
  /// - 目录: folder:///path/to/images
  /// - 远程: https://host/cat.jpg
  /// - Data URI: data:image/png;base64,...
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 输出
  /// - 日志: console:?top=5
  /// - JSON Lines: json:///path/to/results.jsonl
  /// - 目录记录: folder:///path/to/records?min_score=0.5
  #[arg(long, value_name = "OUTPUT", default_value = "console:")]
  pub output: Url,

  /// 以空白分隔的类别标签
  #[arg(long, value_name = "LABELS")]
  pub labels: String,

  /// 标签与得分的对应方式 (sorted / original)
  #[arg(long, value_name = "ORDER", default_value = "sorted")]
  pub order: LabelOrder,

  #[arg(long, default_value_t = DEFAULT_WIDTH)]
  pub width: u32,

  #[arg(long, default_value_t = DEFAULT_HEIGHT)]
  pub height: u32,

  #[arg(long, value_enum, default_value_t = NormalizationArg::Raw)]
  pub normalization: NormalizationArg,
}

impl ClassifyArgs {
  pub fn classifier_config(&self) -> Result<ClassifierConfig, RankError> {
    let normalization = match self.normalization {
      NormalizationArg::Raw => Normalization::Raw,
      NormalizationArg::Imagenet => Normalization::imagenet(),
    };

    Ok(
      ClassifierConfig::new(LabelSet::parse(&self.labels)?)
        .size(self.width, self.height)
        .order(self.order)
        .normalization(normalization),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::Parser;

  #[derive(Parser)]
  struct TestCli {
    #[command(flatten)]
    args: ClassifyArgs,
  }

  #[test]
  fn test_defaults() {
    let cli = TestCli::try_parse_from([
      "test",
      "--model",
      "onnx:///m.onnx",
      "--input",
      "image:///cat.png",
      "--labels",
      "dog cat",
    ])
    .unwrap();

    let config = cli.args.classifier_config().unwrap();
    assert_eq!((config.width, config.height), (224, 224));
    assert_eq!(config.order, LabelOrder::Sorted);
    assert_eq!(config.labels.sorted(), ["cat", "dog"]);
    assert_eq!(cli.args.output.scheme(), "console");
  }

  #[test]
  fn test_overrides() {
    let cli = TestCli::try_parse_from([
      "test",
      "--model",
      "https://example.com/invocations",
      "--input",
      "folder:///images",
      "--labels",
      "a b c",
      "--order",
      "original",
      "--width",
      "320",
      "--height",
      "240",
      "--normalization",
      "imagenet",
    ])
    .unwrap();

    let config = cli.args.classifier_config().unwrap();
    assert_eq!((config.width, config.height), (320, 240));
    assert_eq!(config.order, LabelOrder::Original);
    assert_eq!(config.normalization, Normalization::imagenet());
  }

  #[test]
  fn test_rejects_unknown_order() {
    let result = TestCli::try_parse_from([
      "test",
      "--model",
      "onnx:///m.onnx",
      "--input",
      "image:///cat.png",
      "--labels",
      "a",
      "--order",
      "random",
    ]);
    assert!(result.is_err());
  }
}
