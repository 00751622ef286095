// 该文件是 Fenlei （分类） 项目的一部分。
// src/rank.rs - 推理结果排序
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

use serde::Serialize;
use tracing::debug;

pub use crate::label::RankError;
use crate::label::{LabelOrder, LabelSet};

/// 一次分类的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
  labels: Box<[String]>,
  scores: Box<[f32]>,
  best_index: usize,
}

impl Classification {
  /// 与得分逐位置对应的标签
  pub fn labels(&self) -> &[String] {
    &self.labels
  }

  pub fn scores(&self) -> &[f32] {
    &self.scores
  }

  pub fn best_index(&self) -> usize {
    self.best_index
  }

  pub fn best_label(&self) -> &str {
    &self.labels[self.best_index]
  }

  pub fn best_score(&self) -> f32 {
    self.scores[self.best_index]
  }

  /// 全部 (标签, 得分) 对
  pub fn pairs(&self) -> impl Iterator<Item = (&str, f32)> + '_ {
    self
      .labels
      .iter()
      .zip(self.scores.iter())
      .map(|(label, &score)| (label.as_str(), score))
  }

  /// 得分最高的 k 个结果，按得分降序，同分时保持下标顺序
  pub fn top(&self, k: usize) -> Vec<(&str, f32)> {
    let mut pairs: Vec<(&str, f32)> = self.pairs().collect();
    pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
    pairs.truncate(k);
    pairs
  }
}

/// 最大值下标，相等时保留先出现者
///
/// NaN 不会成为结果：当前最大值为 NaN 时，后续任意数值都会取代它，
/// 因此 `[NaN, 0.1, 0.3]` 得到 2 而不是 0。全部为 NaN 时返回 0。
pub fn argmax(scores: &[f32]) -> Option<usize> {
  let mut iter = scores.iter().enumerate();
  let (mut best, mut best_value) = iter.next().map(|(i, &v)| (i, v))?;
  for (i, &value) in iter {
    if value > best_value || (best_value.is_nan() && !value.is_nan()) {
      best = i;
      best_value = value;
    }
  }
  Some(best)
}

/// 根据得分向量与标签集合生成分类结果
pub fn rank(
  scores: Vec<f32>,
  labels: &LabelSet,
  order: LabelOrder,
) -> Result<Classification, RankError> {
  let best_index =
    argmax(&scores).ok_or_else(|| RankError::InvalidInput("得分向量为空".to_string()))?;

  if labels.len() != scores.len() {
    return Err(RankError::LabelCountMismatch {
      labels: labels.len(),
      scores: scores.len(),
    });
  }

  let labels: Box<[String]> = labels.ordered(order).into();
  debug!(
    "最佳类别: {} ({}), 下标 {}",
    labels[best_index], scores[best_index], best_index
  );

  Ok(Classification {
    labels,
    scores: scores.into_boxed_slice(),
    best_index,
  })
}
