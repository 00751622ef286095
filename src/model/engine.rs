// 该文件是 Fenlei （分类） 项目的一部分。
// src/model/engine.rs - 推理会话管理
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

use std::sync::{
  Arc,
  atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::{
  frame::RgbNchwTensor,
  model::{LoadModel, Model, ModelError},
};

/// 推理运行时
///
/// `load` 与 `run` 都在阻塞线程池中执行。同一会话上的 `run` 由 [`Engine`] 串行调用。
pub trait SessionBackend: Send + Sync + 'static {
  type Session: Send + 'static;

  fn load(&self, model: &[u8]) -> Result<Self::Session, String>;
  fn run(&self, session: &mut Self::Session, input: RgbNchwTensor) -> Result<Vec<f32>, String>;
}

struct Loaded<S> {
  generation: u64,
  session: Arc<Mutex<S>>,
}

/// 持有单个长期会话的推理引擎
///
/// 未加载时 `infer` 返回 [`ModelError::NotLoaded`]。
/// 新会话加载成功后整体替换旧会话，加载失败时保持原状态。
/// 多个加载并发时以最后发起的为准。
pub struct Engine<B: SessionBackend> {
  backend: Arc<B>,
  current: RwLock<Option<Loaded<B::Session>>>,
  issued: AtomicU64,
}

impl<B: SessionBackend> Engine<B> {
  pub fn new(backend: B) -> Self {
    Self {
      backend: Arc::new(backend),
      current: RwLock::new(None),
      issued: AtomicU64::new(0),
    }
  }

  pub fn backend(&self) -> &B {
    &self.backend
  }

  pub fn is_loaded(&self) -> bool {
    self.current.read().is_some()
  }

  /// 当前会话的加载序号，从 1 开始
  pub fn generation(&self) -> Option<u64> {
    self.current.read().as_ref().map(|loaded| loaded.generation)
  }

  fn session(&self) -> Option<Arc<Mutex<B::Session>>> {
    self
      .current
      .read()
      .as_ref()
      .map(|loaded| Arc::clone(&loaded.session))
  }
}

#[async_trait]
impl<B: SessionBackend> LoadModel for Engine<B> {
  async fn load_model(&self, model: Vec<u8>) -> Result<(), ModelError> {
    let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
    info!(
      "加载模型 #{}, 大小: {:.2} MB",
      ticket,
      model.len() as f64 / (1024.0 * 1024.0)
    );

    let backend = Arc::clone(&self.backend);
    let session = tokio::task::spawn_blocking(move || backend.load(&model))
      .await
      .map_err(|e| ModelError::ModelLoad(format!("加载任务异常退出: {}", e)))?
      .map_err(|e| {
        error!("模型 #{} 加载失败: {}", ticket, e);
        ModelError::ModelLoad(e)
      })?;

    let mut current = self.current.write();
    match current.as_ref() {
      Some(loaded) if loaded.generation > ticket => {
        warn!(
          "模型 #{} 已被更新的模型 #{} 取代，丢弃",
          ticket, loaded.generation
        );
      }
      _ => {
        *current = Some(Loaded {
          generation: ticket,
          session: Arc::new(Mutex::new(session)),
        });
        info!("模型 #{} 加载完成", ticket);
      }
    }

    Ok(())
  }
}

#[async_trait]
impl<B: SessionBackend> Model for Engine<B> {
  type Input = RgbNchwTensor;

  async fn infer(&self, input: RgbNchwTensor) -> Result<Vec<f32>, ModelError> {
    let session = self.session().ok_or(ModelError::NotLoaded)?;
    debug!("执行模型推理, 输入形状: {:?}", input.shape());

    let backend = Arc::clone(&self.backend);
    let scores = tokio::task::spawn_blocking(move || {
      let mut session = session.lock();
      backend.run(&mut *session, input)
    })
    .await
    .map_err(|e| ModelError::Inference(format!("推理任务异常退出: {}", e)))?
    .map_err(ModelError::Inference)?;

    debug!("模型输出 {} 个得分", scores.len());
    Ok(scores)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::frame::Normalization;

  /// 以模型字节作为得分的测试运行时，"bad" 无法加载
  struct EchoBackend;

  impl SessionBackend for EchoBackend {
    type Session = Vec<f32>;

    fn load(&self, model: &[u8]) -> Result<Self::Session, String> {
      if model == b"bad" {
        return Err("protobuf parsing failed".to_string());
      }
      Ok(model.iter().map(|&b| f32::from(b)).collect())
    }

    fn run(&self, session: &mut Self::Session, _input: RgbNchwTensor) -> Result<Vec<f32>, String> {
      Ok(session.clone())
    }
  }

  fn tensor() -> RgbNchwTensor {
    RgbNchwTensor::from_rgba(&[0, 0, 0, 255], 1, 1, &Normalization::Raw).unwrap()
  }

  #[tokio::test]
  async fn test_unloaded_engine_rejects_run() {
    let engine = Engine::new(EchoBackend);
    assert!(!engine.is_loaded());
    assert_eq!(engine.infer(tensor()).await, Err(ModelError::NotLoaded));
  }

  #[tokio::test]
  async fn test_failed_load_keeps_unloaded() {
    let engine = Engine::new(EchoBackend);
    let err = engine.load_model(b"bad".to_vec()).await.unwrap_err();
    assert_eq!(err, ModelError::ModelLoad("protobuf parsing failed".to_string()));
    assert!(!engine.is_loaded());
    assert_eq!(engine.infer(tensor()).await, Err(ModelError::NotLoaded));
  }

  #[tokio::test]
  async fn test_failed_reload_keeps_previous_session() {
    let engine = Engine::new(EchoBackend);
    engine.load_model(vec![1, 2]).await.unwrap();
    assert!(engine.load_model(b"bad".to_vec()).await.is_err());
    assert_eq!(engine.generation(), Some(1));
    assert_eq!(engine.infer(tensor()).await.unwrap(), vec![1.0, 2.0]);
  }

  #[tokio::test]
  async fn test_reload_replaces_session() {
    let engine = Engine::new(EchoBackend);
    engine.load_model(vec![1, 2]).await.unwrap();
    engine.load_model(vec![7]).await.unwrap();
    assert_eq!(engine.generation(), Some(2));
    assert_eq!(engine.infer(tensor()).await.unwrap(), vec![7.0]);
  }
}
