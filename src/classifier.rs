// 该文件是 Fenlei （分类） 项目的一部分。
// src/classifier.rs - 分类流水线
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

use image::{RgbaImage, imageops::FilterType};
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  DEFAULT_HEIGHT, DEFAULT_WIDTH,
  frame::{FrameError, Normalization},
  input::{ImageSource, InputError},
  label::{LabelOrder, LabelSet, RankError},
  model::{LoadModel, Model, ModelError, ModelInput},
  preprocess::{Letterbox, Preprocessor},
  rank::{Classification, rank},
};

/// 对外暴露的错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  InvalidInput,
  ShapeMismatch,
  ModelLoad,
  Inference,
  LabelCountMismatch,
}

#[derive(Error, Debug)]
pub enum ClassifyError {
  #[error("预处理错误: {0}")]
  Frame(#[from] FrameError),
  #[error("结果排序错误: {0}")]
  Rank(#[from] RankError),
  #[error("{0}")]
  Model(#[from] ModelError),
  #[error("输入错误: {0}")]
  Input(#[from] InputError),
  #[error("分类任务异常退出: {0}")]
  Task(String),
}

impl ClassifyError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      ClassifyError::Frame(FrameError::InvalidInput(_)) => ErrorKind::InvalidInput,
      ClassifyError::Frame(FrameError::ShapeMismatch { .. }) => ErrorKind::ShapeMismatch,
      ClassifyError::Rank(RankError::InvalidInput(_)) => ErrorKind::InvalidInput,
      ClassifyError::Rank(RankError::LabelCountMismatch { .. }) => ErrorKind::LabelCountMismatch,
      ClassifyError::Model(ModelError::ModelLoad(_) | ModelError::ModelPath(_)) => {
        ErrorKind::ModelLoad
      }
      ClassifyError::Model(ModelError::NotLoaded | ModelError::Inference(_)) => {
        ErrorKind::Inference
      }
      ClassifyError::Input(_) => ErrorKind::InvalidInput,
      ClassifyError::Task(_) => ErrorKind::Inference,
    }
  }
}

/// 分类器配置
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
  pub width: u32,
  pub height: u32,
  pub labels: LabelSet,
  pub order: LabelOrder,
  pub normalization: Normalization,
  pub filter: FilterType,
}

impl ClassifierConfig {
  /// 224x224，字典序标签，不做归一化
  pub fn new(labels: LabelSet) -> Self {
    Self {
      width: DEFAULT_WIDTH,
      height: DEFAULT_HEIGHT,
      labels,
      order: LabelOrder::default(),
      normalization: Normalization::default(),
      filter: FilterType::Triangle,
    }
  }

  pub fn size(mut self, width: u32, height: u32) -> Self {
    self.width = width;
    self.height = height;
    self
  }

  pub fn order(mut self, order: LabelOrder) -> Self {
    self.order = order;
    self
  }

  pub fn normalization(mut self, normalization: Normalization) -> Self {
    self.normalization = normalization;
    self
  }

  pub fn filter(mut self, filter: FilterType) -> Self {
    self.filter = filter;
    self
  }
}

/// 一张图像的分类结果，附带送入模型的画布
#[derive(Debug, Clone)]
pub struct Classified {
  pub name: String,
  pub canvas: RgbaImage,
  pub classification: Classification,
}

/// 等比缩放 → 张量 → 推理 → 排序
pub struct Classifier<M: Model> {
  preprocessor: Preprocessor,
  labels: RwLock<LabelSet>,
  order: LabelOrder,
  model: M,
}

impl<M: Model> Classifier<M> {
  pub fn new(config: ClassifierConfig, model: M) -> Result<Self, ClassifyError> {
    let letterbox = Letterbox::new(config.width, config.height)?.with_filter(config.filter);
    info!(
      "分类器: {}x{}, {} 个类别, 标签顺序 {:?}",
      config.width,
      config.height,
      config.labels.len(),
      config.order
    );

    Ok(Self {
      preprocessor: Preprocessor::new(letterbox, config.normalization),
      labels: RwLock::new(config.labels),
      order: config.order,
      model,
    })
  }

  pub fn model(&self) -> &M {
    &self.model
  }

  pub fn preprocessor(&self) -> &Preprocessor {
    &self.preprocessor
  }

  pub fn labels(&self) -> LabelSet {
    self.labels.read().clone()
  }

  /// 替换标签，与模型加载互不影响
  pub fn set_labels(&self, labels: &str) -> Result<(), ClassifyError> {
    let labels = LabelSet::parse(labels)?;
    debug!("更新标签: {:?}", labels.original());
    *self.labels.write() = labels;
    Ok(())
  }

  pub async fn load_model(&self, model: Vec<u8>) -> Result<(), ClassifyError>
  where
    M: LoadModel,
  {
    self.model.load_model(model).await?;
    Ok(())
  }

  pub async fn classify(&self, image: &RgbaImage) -> Result<Classification, ClassifyError> {
    let canvas = self.preprocessor.canvas(image)?;
    self.classify_canvas(&canvas).await
  }

  /// 读取图像来源并分类
  pub async fn classify_source(&self, source: ImageSource) -> Result<Classified, ClassifyError> {
    let source = source.load().await?;
    let canvas = self.preprocessor.canvas(&source.image)?;
    let classification = self.classify_canvas(&canvas).await?;

    Ok(Classified {
      name: source.name,
      canvas,
      classification,
    })
  }

  async fn classify_canvas(&self, canvas: &RgbaImage) -> Result<Classification, ClassifyError> {
    let input = M::Input::from_canvas(canvas, &self.preprocessor)?;
    let scores = self.model.infer(input).await?;

    let labels = self.labels.read();
    Ok(rank(scores, &labels, self.order)?)
  }
}

impl<M: Model + 'static> Classifier<M> {
  /// 并发分类多张图像，结果顺序与输入一致，单张失败不影响其余
  pub async fn classify_all(
    self: &Arc<Self>,
    sources: Vec<ImageSource>,
  ) -> Vec<Result<Classified, ClassifyError>> {
    let handles: Vec<_> = sources
      .into_iter()
      .map(|source| {
        let classifier = Arc::clone(self);
        tokio::spawn(async move { classifier.classify_source(source).await })
      })
      .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
      let result = handle
        .await
        .unwrap_or_else(|e| Err(ClassifyError::Task(e.to_string())));
      if let Err(e) = &result {
        warn!("图像分类失败: {}", e);
      }
      results.push(result);
    }
    results
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_kinds() {
    let cases = [
      (
        ClassifyError::from(FrameError::InvalidInput("empty".to_string())),
        ErrorKind::InvalidInput,
      ),
      (
        ClassifyError::from(FrameError::ShapeMismatch {
          expected: 4,
          actual: 3,
        }),
        ErrorKind::ShapeMismatch,
      ),
      (
        ClassifyError::from(RankError::LabelCountMismatch {
          labels: 2,
          scores: 3,
        }),
        ErrorKind::LabelCountMismatch,
      ),
      (
        ClassifyError::from(ModelError::ModelLoad("corrupt".to_string())),
        ErrorKind::ModelLoad,
      ),
      (ClassifyError::from(ModelError::NotLoaded), ErrorKind::Inference),
      (
        ClassifyError::from(InputError::SchemeMismatch("v4l2".to_string())),
        ErrorKind::InvalidInput,
      ),
    ];

    for (error, kind) in cases {
      assert_eq!(error.kind(), kind, "{}", error);
    }
  }

  #[test]
  fn test_not_loaded_message() {
    let error = ClassifyError::from(ModelError::NotLoaded);
    assert!(error.to_string().contains("no model loaded"));
  }

  #[test]
  fn test_config_defaults() {
    let config = ClassifierConfig::new(LabelSet::parse("cat dog").unwrap());
    assert_eq!((config.width, config.height), (224, 224));
    assert_eq!(config.order, LabelOrder::Sorted);
    assert_eq!(config.normalization, Normalization::Raw);
  }
}
