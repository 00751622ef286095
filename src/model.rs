// 该文件是 Fenlei （分类） 项目的一部分。
// src/model.rs - 模型
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

use std::io::Cursor;

use async_trait::async_trait;
use image::{ImageFormat, RgbaImage};
use thiserror::Error;

use crate::{
  frame::{FrameError, RgbNchwTensor},
  preprocess::Preprocessor,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
  #[error("模型加载错误: {0}")]
  ModelLoad(String),
  #[error("推理错误: no model loaded")]
  NotLoaded,
  #[error("推理错误: {0}")]
  Inference(String),
  #[error("模型路径错误: {0}")]
  ModelPath(String),
}

/// 一次前向推理，返回第一个输出的全部得分
#[async_trait]
pub trait Model: Send + Sync {
  type Input: ModelInput;

  async fn infer(&self, input: Self::Input) -> Result<Vec<f32>, ModelError>;
}

/// 可以整体替换会话的模型
#[async_trait]
pub trait LoadModel: Send + Sync {
  async fn load_model(&self, model: Vec<u8>) -> Result<(), ModelError>;
}

/// 由等比缩放后的画布构造模型输入
pub trait ModelInput: Sized + Send + 'static {
  fn from_canvas(canvas: &RgbaImage, preprocessor: &Preprocessor) -> Result<Self, FrameError>;
}

impl ModelInput for RgbNchwTensor {
  fn from_canvas(canvas: &RgbaImage, preprocessor: &Preprocessor) -> Result<Self, FrameError> {
    preprocessor.tensor(canvas)
  }
}

/// PNG 编码后的画布，用于远程推理
#[derive(Debug, Clone)]
pub struct EncodedImage {
  pub bytes: Vec<u8>,
}

impl ModelInput for EncodedImage {
  fn from_canvas(canvas: &RgbaImage, _preprocessor: &Preprocessor) -> Result<Self, FrameError> {
    let mut bytes = Vec::new();
    canvas
      .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
      .map_err(|e| FrameError::InvalidInput(format!("PNG 编码失败: {}", e)))?;
    Ok(EncodedImage { bytes })
  }
}

mod engine;
pub use self::engine::{Engine, SessionBackend};

#[cfg(feature = "onnx_runtime")]
mod onnx;
#[cfg(feature = "onnx_runtime")]
pub use self::onnx::{OnnxModel, OnnxModelBuilder, OrtBackend};

#[cfg(feature = "hosted_model")]
mod hosted;
#[cfg(feature = "hosted_model")]
pub use self::hosted::HostedModel;
