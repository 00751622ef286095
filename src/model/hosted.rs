// 该文件是 Fenlei （分类） 项目的一部分。
// src/model/hosted.rs - 远程推理服务
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

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::{
  FromUrl,
  model::{EncodedImage, Model, ModelError},
};

const HOSTED_CONTENT_TYPE: &str = "application/x-image";
const HOSTED_DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// 将 PNG 画布提交到推理端点，返回 JSON 数组形式的得分
///
/// 请求的 `Content-Type` 固定为 `application/x-image`。
#[derive(Debug, Clone)]
pub struct HostedModel {
  endpoint: Url,
  timeout: Duration,
}

impl FromUrl for HostedModel {
  type Error = ModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != "http" && url.scheme() != "https" {
      return Err(ModelError::ModelPath(format!(
        "远程推理端点必须使用 http 或 https 方案, 实际为 {}",
        url.scheme()
      )));
    }

    Ok(HostedModel {
      endpoint: url.clone(),
      timeout: HOSTED_DEFAULT_TIMEOUT,
    })
  }
}

impl HostedModel {
  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn endpoint(&self) -> &Url {
    &self.endpoint
  }

  fn post(endpoint: &Url, timeout: Duration, image: &EncodedImage) -> Result<Vec<f32>, ModelError> {
    let agent = ureq::AgentBuilder::new().timeout(timeout).build();
    let response = agent
      .post(endpoint.as_str())
      .set("Content-Type", HOSTED_CONTENT_TYPE)
      .send_bytes(&image.bytes)
      .map_err(|e| ModelError::Inference(format!("远程推理请求失败: {}", e)))?;

    response
      .into_json::<Vec<f32>>()
      .map_err(|e| ModelError::Inference(format!("远程推理结果无法解析: {}", e)))
  }
}

#[async_trait]
impl Model for HostedModel {
  type Input = EncodedImage;

  async fn infer(&self, input: EncodedImage) -> Result<Vec<f32>, ModelError> {
    debug!("提交 {} 字节到 {}", input.bytes.len(), self.endpoint);
    let endpoint = self.endpoint.clone();
    let timeout = self.timeout;
    tokio::task::spawn_blocking(move || Self::post(&endpoint, timeout, &input))
      .await
      .map_err(|e| ModelError::Inference(format!("远程推理任务异常退出: {}", e)))?
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_hosted_requires_http() {
    let url = Url::parse("https://example.com/invocations").unwrap();
    assert!(HostedModel::from_url(&url).is_ok());

    let url = Url::parse("onnx:///model.onnx").unwrap();
    assert!(matches!(
      HostedModel::from_url(&url),
      Err(ModelError::ModelPath(_))
    ));
  }

  #[tokio::test]
  async fn test_unreachable_endpoint_is_inference_error() {
    let url = Url::parse("http://127.0.0.1:9/invocations").unwrap();
    let model = HostedModel::from_url(&url)
      .unwrap()
      .timeout(Duration::from_secs(2));
    let image = EncodedImage {
      bytes: vec![0u8; 4],
    };
    assert!(matches!(
      model.infer(image).await,
      Err(ModelError::Inference(_))
    ));
  }
}
