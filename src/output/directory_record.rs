// 该文件是 Fenlei （分类） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use std::path::PathBuf;

use chrono::{Datelike, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::{
  FromUrl, FromUrlWithScheme,
  classifier::Classified,
  output::{ClassificationRecord, Render},
  url_local_path,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("无效的参数: {0}")]
  InvalidQuery(String),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  SerdeError(#[from] serde_json::Error),
}

/// 按日期分目录保存画布与结果，`folder:///records?min_score=0.5`
///
/// 每条结果生成 `YYYY/MM/DD/HH-MM-SS-XXXX.png` 与同名 `.json`。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  frame_counter: Mutex<u16>,
  min_score: Option<f32>,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let mut min_score = None;
    for (k, v) in uri.query_pairs() {
      if k == "min_score" {
        let score = v
          .parse::<f32>()
          .map_err(|_| DirectoryRecordOutputError::InvalidQuery(format!("min_score={}", v)))?;
        min_score = Some(score);
      }
    }

    Ok(DirectoryRecordOutput {
      directory: PathBuf::from(url_local_path(uri)),
      frame_counter: Mutex::new(0),
      min_score,
    })
  }
}

impl DirectoryRecordOutput {
  fn frame_id(&self) -> u16 {
    let mut counter = self.frame_counter.lock();
    *counter = counter.wrapping_add(1);
    *counter
  }

  fn frame_path(&self) -> Result<PathBuf, DirectoryRecordOutputError> {
    let now = Utc::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    Ok(directory.join(format!(
      "{}-{:04X}.png",
      now.format("%H-%M-%S"),
      self.frame_id()
    )))
  }
}

impl Render<Classified> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, result: &Classified) -> Result<(), Self::Error> {
    let best_score = result.classification.best_score();
    if self.min_score.is_some_and(|min_score| best_score < min_score) {
      debug!("{} 得分 {} 过低, 跳过记录", result.name, best_score);
      return Ok(());
    }

    let path = self.frame_path()?;
    result.canvas.save(&path)?;

    let record = serde_json::to_vec_pretty(&ClassificationRecord::from(result))?;
    std::fs::write(path.with_extension("json"), record)?;
    debug!("记录保存到: {}", path.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{LabelOrder, LabelSet, rank::rank};
  use image::RgbaImage;

  fn folder_url(dir: &std::path::Path, query: &str) -> url::Url {
    let url = url::Url::from_directory_path(dir).unwrap();
    url::Url::parse(&format!("{}{}", url.as_str().replacen("file:", "folder:", 1), query)).unwrap()
  }

  fn classified(scores: Vec<f32>) -> Classified {
    let labels = LabelSet::parse("cat dog").unwrap();
    Classified {
      name: "a.png".to_string(),
      canvas: RgbaImage::new(4, 4),
      classification: rank(scores, &labels, LabelOrder::Sorted).unwrap(),
    }
  }

  fn files_with_extension(dir: &std::path::Path, ext: &str) -> usize {
    let mut count = 0;
    let mut stack = vec![dir.to_path_buf()];
    while let Some(dir) = stack.pop() {
      for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
          stack.push(path);
        } else if path.extension().is_some_and(|e| e == ext) {
          count += 1;
        }
      }
    }
    count
  }

  #[test]
  fn test_saves_canvas_and_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let output = DirectoryRecordOutput::from_url(&folder_url(dir.path(), "")).unwrap();
    output.render_result(&classified(vec![0.3, 0.7])).unwrap();
    output.render_result(&classified(vec![0.6, 0.4])).unwrap();

    assert_eq!(files_with_extension(dir.path(), "png"), 2);
    assert_eq!(files_with_extension(dir.path(), "json"), 2);
  }

  #[test]
  fn test_min_score_skips_low_confidence() {
    let dir = tempfile::tempdir().unwrap();
    let output = DirectoryRecordOutput::from_url(&folder_url(dir.path(), "?min_score=0.9")).unwrap();
    output.render_result(&classified(vec![0.3, 0.7])).unwrap();

    assert_eq!(files_with_extension(dir.path(), "png"), 0);
  }

  #[test]
  fn test_invalid_min_score() {
    let url = url::Url::parse("folder:///tmp/records?min_score=high").unwrap();
    assert!(matches!(
      DirectoryRecordOutput::from_url(&url),
      Err(DirectoryRecordOutputError::InvalidQuery(_))
    ));
  }
}
