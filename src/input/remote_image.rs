// 该文件是 Fenlei （分类） 项目的一部分。
// src/input/remote_image.rs - 远程图像输入
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

use std::io::Read;

use tracing::debug;
use url::Url;

use crate::FromUrl;

use super::{ImageSource, InputError};

// 单张图像上限 64 MiB
const MAX_IMAGE_BYTES: u64 = 64 * 1024 * 1024;

/// `http(s)://...` 指向的单张图像
pub struct RemoteImageInput {
  url: Option<Url>,
}

impl FromUrl for RemoteImageInput {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      "http" | "https" => Ok(RemoteImageInput {
        url: Some(url.clone()),
      }),
      other => Err(InputError::SchemeMismatch(other.to_string())),
    }
  }
}

impl Iterator for RemoteImageInput {
  type Item = ImageSource;

  fn next(&mut self) -> Option<Self::Item> {
    self.url.take().map(ImageSource::Remote)
  }
}

pub(super) fn fetch(url: &Url) -> Result<Vec<u8>, InputError> {
  debug!("下载图像: {}", url);
  let response = ureq::get(url.as_str())
    .call()
    .map_err(|e| InputError::FetchError(format!("{}: {}", url, e)))?;

  read_capped(response.into_reader(), MAX_IMAGE_BYTES)
    .map_err(|e| match e {
      InputError::FetchError(reason) => InputError::FetchError(format!("{}: {}", url, reason)),
      other => other,
    })
}

/// 最多读取 `limit` 字节，超出时报错而不是截断
fn read_capped(reader: impl Read, limit: u64) -> Result<Vec<u8>, InputError> {
  let mut bytes = Vec::new();
  reader.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
  if bytes.len() as u64 > limit {
    return Err(InputError::FetchError(format!(
      "图像过大, 超过 {} 字节上限",
      limit
    )));
  }
  Ok(bytes)
}
