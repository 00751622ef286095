// 该文件是 Fenlei （分类） 项目的一部分。
// src/input/read_image_file.rs - 本地图像文件与目录输入
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

use std::{path::PathBuf, vec::IntoIter};

use tracing::{error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, url_local_path};

use super::{ImageSource, InputError};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp"];

/// 单个图像文件，`image:///path/to/cat.jpg`
pub struct ImageFileInput {
  path: Option<PathBuf>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME && url.scheme() != "file" {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(InputError::SchemeMismatch(url.scheme().to_string()));
    }

    Ok(ImageFileInput {
      path: Some(PathBuf::from(url_local_path(url))),
    })
  }
}

impl Iterator for ImageFileInput {
  type Item = ImageSource;

  fn next(&mut self) -> Option<Self::Item> {
    self.path.take().map(ImageSource::File)
  }
}

/// 目录下的全部图像文件，按文件名排序，`folder:///path/to/images`
pub struct DirectoryInput {
  files: IntoIter<PathBuf>,
}

impl FromUrlWithScheme for DirectoryInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryInput {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(InputError::SchemeMismatch(url.scheme().to_string()));
    }

    let dir = PathBuf::from(url_local_path(url));
    let mut files = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
      let path = entry?.path();
      if path.is_file() && is_image_file(&path) {
        files.push(path);
      }
    }
    files.sort();
    info!("目录 {} 中找到 {} 个图像文件", dir.display(), files.len());

    Ok(DirectoryInput {
      files: files.into_iter(),
    })
  }
}

impl Iterator for DirectoryInput {
  type Item = ImageSource;

  fn next(&mut self) -> Option<Self::Item> {
    self.files.next().map(ImageSource::File)
  }
}

fn is_image_file(path: &std::path::Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| {
      IMAGE_EXTENSIONS
        .iter()
        .any(|known| ext.eq_ignore_ascii_case(known))
    })
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_image_file_yields_once() {
    let url = Url::parse("image:///tmp/cat.jpg").unwrap();
    let mut input = ImageFileInput::from_url(&url).unwrap();
    assert!(matches!(input.next(), Some(ImageSource::File(_))));
    assert!(input.next().is_none());
  }

  #[test]
  fn test_image_file_rejects_scheme() {
    let url = Url::parse("folder:///tmp").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(InputError::SchemeMismatch(_))
    ));
  }

  #[test]
  fn test_directory_sorted_images_only() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["b.png", "a.JPG", "notes.txt", "c.webp"] {
      std::fs::write(dir.path().join(name), b"").unwrap();
    }
    std::fs::create_dir(dir.path().join("nested.png")).unwrap();

    let url = Url::from_directory_path(dir.path()).unwrap();
    let url = Url::parse(&url.as_str().replacen("file:", "folder:", 1)).unwrap();
    let names: Vec<_> = DirectoryInput::from_url(&url)
      .unwrap()
      .map(|source| match source {
        ImageSource::File(path) => path.file_name().unwrap().to_string_lossy().into_owned(),
        other => panic!("unexpected source {:?}", other),
      })
      .collect();

    assert_eq!(names, vec!["a.JPG", "b.png", "c.webp"]);
  }

  #[test]
  fn test_directory_missing_is_io_error() {
    let url = Url::parse("folder:///definitely/not/here").unwrap();
    assert!(matches!(
      DirectoryInput::from_url(&url),
      Err(InputError::IoError(_))
    ));
  }
}
