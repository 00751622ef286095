// 该文件是 Fenlei （分类） 项目的一部分。
// src/model/onnx.rs - ONNX Runtime 推理后端
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

use ort::{
  session::{Session, builder::GraphOptimizationLevel},
  value::Tensor,
};
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::RgbNchwTensor,
  model::{Engine, LoadModel, ModelError, SessionBackend},
  url_local_path,
};

pub type OnnxModel = Engine<OrtBackend>;

#[derive(Debug, Clone)]
pub struct OrtBackend {
  /// 0 表示由运行时决定
  intra_threads: usize,
  /// 图优化级别 0-3
  optimization: u8,
}

impl Default for OrtBackend {
  fn default() -> Self {
    Self::new()
  }
}

impl OrtBackend {
  pub fn new() -> Self {
    Self {
      intra_threads: 0,
      optimization: 3,
    }
  }

  pub fn intra_threads(mut self, threads: usize) -> Self {
    self.intra_threads = threads;
    self
  }

  pub fn optimization(mut self, level: u8) -> Self {
    self.optimization = level.min(3);
    self
  }

  fn graph_level(&self) -> GraphOptimizationLevel {
    match self.optimization {
      0 => GraphOptimizationLevel::Disable,
      1 => GraphOptimizationLevel::Level1,
      2 => GraphOptimizationLevel::Level2,
      _ => GraphOptimizationLevel::Level3,
    }
  }
}

impl SessionBackend for OrtBackend {
  type Session = Session;

  fn load(&self, model: &[u8]) -> Result<Session, String> {
    let mut builder = Session::builder()
      .map_err(|e| format!("无法创建会话构建器: {}", e))?
      .with_optimization_level(self.graph_level())
      .map_err(|e| format!("无法设置优化级别: {}", e))?;

    if self.intra_threads > 0 {
      builder = builder
        .with_intra_threads(self.intra_threads)
        .map_err(|e| format!("无法设置线程数: {}", e))?;
    }

    let session = builder.commit_from_memory(model).map_err(|e| e.to_string())?;

    if session.outputs.is_empty() {
      return Err("模型没有任何输出".to_string());
    }

    for input in session.inputs.iter() {
      debug!("模型输入: {}", input.name);
    }
    for output in session.outputs.iter() {
      debug!("模型输出: {}", output.name);
    }

    Ok(session)
  }

  fn run(&self, session: &mut Session, input: RgbNchwTensor) -> Result<Vec<f32>, String> {
    let (shape, data) = input.into_raw();
    let tensor =
      Tensor::from_array((shape, data)).map_err(|e| format!("无法创建输入张量: {}", e))?;

    let outputs = session
      .run(ort::inputs![tensor])
      .map_err(|e| e.to_string())?;
    let (_, scores) = outputs[0]
      .try_extract_tensor::<f32>()
      .map_err(|e| format!("无法读取输出张量: {}", e))?;

    Ok(scores.to_vec())
  }
}

/// 从 `onnx:///path/to/model.onnx?threads=4&opt=3` 读取模型
pub struct OnnxModelBuilder {
  model_path: String,
  backend: OrtBackend,
}

impl FromUrlWithScheme for OnnxModelBuilder {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for OnnxModelBuilder {
  type Error = ModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ModelError::ModelPath(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    let mut backend = OrtBackend::new();
    for (key, value) in url.query_pairs() {
      match key.as_ref() {
        "threads" => {
          let threads = value
            .parse()
            .map_err(|_| ModelError::ModelPath(format!("无效的线程数: {}", value)))?;
          backend = backend.intra_threads(threads);
        }
        "opt" => {
          let level = value
            .parse()
            .map_err(|_| ModelError::ModelPath(format!("无效的优化级别: {}", value)))?;
          backend = backend.optimization(level);
        }
        _ => {}
      }
    }

    Ok(OnnxModelBuilder {
      model_path: url_local_path(url),
      backend,
    })
  }
}

impl OnnxModelBuilder {
  pub fn backend(mut self, backend: OrtBackend) -> Self {
    self.backend = backend;
    self
  }

  pub async fn build(self) -> Result<OnnxModel, ModelError> {
    info!("加载模型文件: {}", self.model_path);
    let model_data = tokio::fs::read(&self.model_path)
      .await
      .map_err(|e| ModelError::ModelLoad(format!("{}: {}", self.model_path, e)))?;

    let engine = Engine::new(self.backend);
    engine.load_model(model_data).await?;
    Ok(engine)
  }
}
