// 该文件是 Fenlei （分类） 项目的一部分。
// src/output.rs - 输出定义
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
use thiserror::Error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, classifier::Classified};

pub trait Render<Output> {
  type Error;
  fn render_result(&self, result: &Output) -> Result<(), Self::Error>;
}

mod console;
pub use self::console::ConsoleOutput;

mod json_lines;
pub use self::json_lines::{JsonLinesOutput, JsonLinesOutputError};

#[cfg(feature = "directory_record")]
mod directory_record;
#[cfg(feature = "directory_record")]
pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError};

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("JSON 输出错误: {0}")]
  JsonLinesOutputError(#[from] JsonLinesOutputError),
  #[cfg(feature = "directory_record")]
  #[error("目录记录输出错误: {0}")]
  DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 序列化到 JSON 的单条分类记录
#[derive(Debug, Serialize)]
pub struct ClassificationRecord<'a> {
  pub source: &'a str,
  pub timestamp: String,
  pub best_label: &'a str,
  pub best_score: f32,
  pub best_index: usize,
  pub scores: Vec<LabelScore<'a>>,
}

#[derive(Debug, Serialize)]
pub struct LabelScore<'a> {
  pub label: &'a str,
  pub score: f32,
}

impl<'a> From<&'a Classified> for ClassificationRecord<'a> {
  fn from(result: &'a Classified) -> Self {
    let classification = &result.classification;
    ClassificationRecord {
      source: &result.name,
      timestamp: chrono::Utc::now().to_rfc3339(),
      best_label: classification.best_label(),
      best_score: classification.best_score(),
      best_index: classification.best_index(),
      scores: classification
        .pairs()
        .map(|(label, score)| LabelScore { label, score })
        .collect(),
    }
  }
}

/// 按 URL 方案选择输出
pub enum OutputWrapper {
  Console(ConsoleOutput),
  JsonLines(JsonLinesOutput),
  #[cfg(feature = "directory_record")]
  DirectoryRecord(DirectoryRecordOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      ConsoleOutput::SCHEME => Ok(OutputWrapper::Console(ConsoleOutput::from_url(url)?)),
      JsonLinesOutput::SCHEME => Ok(OutputWrapper::JsonLines(JsonLinesOutput::from_url(url)?)),
      #[cfg(feature = "directory_record")]
      DirectoryRecordOutput::SCHEME => Ok(OutputWrapper::DirectoryRecord(
        DirectoryRecordOutput::from_url(url)?,
      )),
      other => Err(OutputError::SchemeMismatch(other.to_string())),
    }
  }
}

impl Render<Classified> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, result: &Classified) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::Console(output) => output.render_result(result).map_err(|never| match never {}),
      OutputWrapper::JsonLines(output) => output.render_result(result).map_err(OutputError::from),
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecord(output) => {
        output.render_result(result).map_err(OutputError::from)
      }
    }
  }
}
