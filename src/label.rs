// 该文件是 Fenlei （分类） 项目的一部分。
// src/label.rs - 类别标签集合
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

use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankError {
  #[error("输入无效: {0}")]
  InvalidInput(String),
  #[error("标签数量 ({labels}) 与得分数量 ({scores}) 不一致")]
  LabelCountMismatch { labels: usize, scores: usize },
}

/// 得分向量下标与标签的对应方式
///
/// 导出的分类模型按字典序排列类别，默认使用 `Sorted`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelOrder {
  #[default]
  Sorted,
  Original,
}

impl FromStr for LabelOrder {
  type Err = RankError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "sorted" => Ok(LabelOrder::Sorted),
      "original" => Ok(LabelOrder::Original),
      other => Err(RankError::InvalidInput(format!(
        "未知的标签顺序: {}",
        other
      ))),
    }
  }
}

/// 以空白分隔的类别标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
  original: Box<[String]>,
  sorted: Box<[String]>,
}

impl LabelSet {
  pub fn parse(labels: &str) -> Result<Self, RankError> {
    let original: Vec<String> = labels.split_whitespace().map(str::to_owned).collect();
    if original.is_empty() {
      return Err(RankError::InvalidInput("标签列表为空".to_string()));
    }

    let mut sorted = original.clone();
    sorted.sort();

    Ok(Self {
      original: original.into_boxed_slice(),
      sorted: sorted.into_boxed_slice(),
    })
  }

  /// 输入时的顺序
  pub fn original(&self) -> &[String] {
    &self.original
  }

  /// 字典序
  pub fn sorted(&self) -> &[String] {
    &self.sorted
  }

  pub fn ordered(&self, order: LabelOrder) -> &[String] {
    match order {
      LabelOrder::Sorted => self.sorted(),
      LabelOrder::Original => self.original(),
    }
  }

  pub fn len(&self) -> usize {
    self.original.len()
  }

  pub fn is_empty(&self) -> bool {
    self.original.is_empty()
  }
}

impl FromStr for LabelSet {
  type Err = RankError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    LabelSet::parse(s)
  }
}
