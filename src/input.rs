// 该文件是 Fenlei （分类） 项目的一部分。
// src/input.rs - 图像输入
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

use image::{ImageReader, RgbaImage};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::{FromUrl, url_local_path};

mod data_uri;
pub use self::data_uri::{DataUri, DataUriInput};

#[cfg(feature = "read_image_file")]
mod read_image_file;
#[cfg(feature = "read_image_file")]
pub use self::read_image_file::{DirectoryInput, ImageFileInput};

#[cfg(feature = "remote_input")]
mod remote_image;
#[cfg(feature = "remote_input")]
pub use self::remote_image::RemoteImageInput;

#[derive(Error, Debug)]
pub enum InputError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像解码错误: {0}")]
  ImageLoadError(#[from] image::ImageError),
  #[error("Data URI 无效: {0}")]
  InvalidDataUri(String),
  #[error("远程图像获取失败: {0}")]
  FetchError(String),
  #[error("图像读取任务异常退出: {0}")]
  TaskError(String),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 解码后的源图像
#[derive(Debug, Clone)]
pub struct SourceImage {
  /// 图像来源描述，用于输出
  pub name: String,
  pub image: RgbaImage,
}

impl SourceImage {
  pub fn from_rgba(name: impl Into<String>, image: RgbaImage) -> Self {
    Self {
      name: name.into(),
      image,
    }
  }
}

/// 尚未读取的图像来源
#[derive(Debug, Clone)]
pub enum ImageSource {
  File(PathBuf),
  Remote(Url),
  DataUri(String),
  Decoded(SourceImage),
}

impl ImageSource {
  pub fn name(&self) -> String {
    match self {
      ImageSource::File(path) => path.display().to_string(),
      ImageSource::Remote(url) => url.to_string(),
      ImageSource::DataUri(uri) => {
        let header = uri.split(',').next().unwrap_or_default();
        format!("{},...", header)
      }
      ImageSource::Decoded(image) => image.name.clone(),
    }
  }

  /// 读取并解码图像，在阻塞线程池中执行
  pub async fn load(self) -> Result<SourceImage, InputError> {
    let source = match self {
      ImageSource::Decoded(image) => return Ok(image),
      other => other,
    };

    tokio::task::spawn_blocking(move || source.load_blocking())
      .await
      .map_err(|e| InputError::TaskError(e.to_string()))?
  }

  fn load_blocking(self) -> Result<SourceImage, InputError> {
    let name = self.name();
    debug!("读取图像: {}", name);
    let image = match self {
      ImageSource::File(path) => ImageReader::open(&path)?
        .with_guessed_format()?
        .decode()?
        .to_rgba8(),
      #[cfg(feature = "remote_input")]
      ImageSource::Remote(url) => decode(&remote_image::fetch(&url)?)?,
      #[cfg(not(feature = "remote_input"))]
      ImageSource::Remote(url) => {
        return Err(InputError::SchemeMismatch(url.scheme().to_string()));
      }
      ImageSource::DataUri(uri) => decode(&DataUri::parse(&uri)?.bytes)?,
      ImageSource::Decoded(image) => return Ok(image),
    };

    Ok(SourceImage { name, image })
  }
}

impl FromUrl for ImageSource {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      "image" | "file" => Ok(ImageSource::File(PathBuf::from(url_local_path(url)))),
      "http" | "https" => Ok(ImageSource::Remote(url.clone())),
      "data" => Ok(ImageSource::DataUri(url.as_str().to_string())),
      other => Err(InputError::SchemeMismatch(other.to_string())),
    }
  }
}

fn decode(bytes: &[u8]) -> Result<RgbaImage, InputError> {
  Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// 按 URL 方案选择输入
pub enum InputWrapper {
  #[cfg(feature = "read_image_file")]
  ReadImageFile(ImageFileInput),
  #[cfg(feature = "read_image_file")]
  Directory(DirectoryInput),
  #[cfg(feature = "remote_input")]
  Remote(RemoteImageInput),
  DataUri(DataUriInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "read_image_file")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == ImageFileInput::SCHEME || url.scheme() == "file" {
        return Ok(InputWrapper::ReadImageFile(ImageFileInput::from_url(url)?));
      }
      if url.scheme() == DirectoryInput::SCHEME {
        return Ok(InputWrapper::Directory(DirectoryInput::from_url(url)?));
      }
    }
    #[cfg(feature = "remote_input")]
    {
      if url.scheme() == "http" || url.scheme() == "https" {
        return Ok(InputWrapper::Remote(RemoteImageInput::from_url(url)?));
      }
    }
    if url.scheme() == "data" {
      return Ok(InputWrapper::DataUri(DataUriInput::from_url(url)?));
    }
    Err(InputError::SchemeMismatch(url.scheme().to_string()))
  }
}

impl Iterator for InputWrapper {
  type Item = ImageSource;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      #[cfg(feature = "read_image_file")]
      InputWrapper::ReadImageFile(input) => input.next(),
      #[cfg(feature = "read_image_file")]
      InputWrapper::Directory(input) => input.next(),
      #[cfg(feature = "remote_input")]
      InputWrapper::Remote(input) => input.next(),
      InputWrapper::DataUri(input) => input.next(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // 1x1 红色 PNG
  const RED_PIXEL_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

  #[test]
  fn test_source_from_url() {
    let url = Url::parse("image:///tmp/a%20b.png").unwrap();
    assert!(matches!(
      ImageSource::from_url(&url).unwrap(),
      ImageSource::File(path) if path == PathBuf::from("/tmp/a b.png")
    ));

    let url = Url::parse("https://example.com/cat.jpg").unwrap();
    assert!(matches!(
      ImageSource::from_url(&url).unwrap(),
      ImageSource::Remote(_)
    ));

    let url = Url::parse("v4l2:///dev/video0").unwrap();
    assert!(matches!(
      ImageSource::from_url(&url),
      Err(InputError::SchemeMismatch(_))
    ));
  }

  #[tokio::test]
  async fn test_load_data_uri() {
    let url = Url::parse(RED_PIXEL_PNG).unwrap();
    let source = ImageSource::from_url(&url).unwrap();
    assert_eq!(source.name(), "data:image/png;base64,...");

    let image = source.load().await.unwrap();
    assert_eq!(image.image.dimensions(), (1, 1));
  }

  #[tokio::test]
  async fn test_load_garbage_is_decode_error() {
    let source = ImageSource::DataUri("data:image/png;base64,AAAA".to_string());
    assert!(matches!(
      source.load().await,
      Err(InputError::ImageLoadError(_))
    ));
  }

  #[tokio::test]
  async fn test_decoded_passes_through() {
    let source = ImageSource::Decoded(SourceImage::from_rgba("webcam", RgbaImage::new(2, 3)));
    let image = source.load().await.unwrap();
    assert_eq!(image.name, "webcam");
    assert_eq!(image.image.dimensions(), (2, 3));
  }

  #[test]
  fn test_wrapper_yields_single_data_uri() {
    let url = Url::parse(RED_PIXEL_PNG).unwrap();
    let sources: Vec<_> = InputWrapper::from_url(&url).unwrap().collect();
    assert_eq!(sources.len(), 1);
  }
}
