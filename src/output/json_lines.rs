// 该文件是 Fenlei （分类） 项目的一部分。
// src/output/json_lines.rs - JSON Lines 输出
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
  fs::{File, OpenOptions},
  io::Write,
  path::PathBuf,
};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  classifier::Classified,
  output::{ClassificationRecord, Render},
  url_local_path,
};

#[derive(Error, Debug)]
pub enum JsonLinesOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  SerdeError(#[from] serde_json::Error),
}

/// 每条结果追加一行 JSON，`json:///path/to/results.jsonl`
pub struct JsonLinesOutput {
  path: PathBuf,
  file: Mutex<File>,
}

impl FromUrlWithScheme for JsonLinesOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonLinesOutput {
  type Error = JsonLinesOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(JsonLinesOutputError::SchemeMismatch);
    }

    let path = PathBuf::from(url_local_path(url));
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    info!("结果写入: {}", path.display());

    Ok(JsonLinesOutput {
      path,
      file: Mutex::new(file),
    })
  }
}

impl JsonLinesOutput {
  pub fn path(&self) -> &PathBuf {
    &self.path
  }
}

impl Render<Classified> for JsonLinesOutput {
  type Error = JsonLinesOutputError;

  fn render_result(&self, result: &Classified) -> Result<(), Self::Error> {
    let mut line = serde_json::to_vec(&ClassificationRecord::from(result))?;
    line.push(b'\n');

    let mut file = self.file.lock();
    file.write_all(&line)?;
    file.flush()?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{LabelOrder, LabelSet, rank::rank};
  use image::RgbaImage;

  fn classified(name: &str, scores: Vec<f32>) -> Classified {
    let labels = LabelSet::parse("cat dog").unwrap();
    Classified {
      name: name.to_string(),
      canvas: RgbaImage::new(2, 2),
      classification: rank(scores, &labels, LabelOrder::Sorted).unwrap(),
    }
  }

  #[test]
  fn test_appends_one_line_per_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("results.jsonl");
    let url = Url::from_file_path(&path).unwrap();
    let url = Url::parse(&url.as_str().replacen("file:", "json:", 1)).unwrap();

    let output = JsonLinesOutput::from_url(&url).unwrap();
    output.render_result(&classified("a.png", vec![0.2, 0.8])).unwrap();
    output.render_result(&classified("b.png", vec![0.9, 0.1])).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = text
      .lines()
      .map(|line| serde_json::from_str(line).unwrap())
      .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["source"], "a.png");
    assert_eq!(lines[0]["best_label"], "dog");
    assert_eq!(lines[1]["best_label"], "cat");
    assert_eq!(lines[1]["scores"][1]["label"], "dog");
  }
}
