// 该文件是 Fenlei （分类） 项目的一部分。
// src/input/data_uri.rs - Data URI 解析
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

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme};

use super::{ImageSource, InputError};

const DATA_URI_PREFIX: &str = "data:";
const DEFAULT_MIME: &str = "text/plain";

/// `data:[<mime>][;base64],<payload>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
  pub mime: String,
  pub bytes: Vec<u8>,
}

impl DataUri {
  pub fn parse(uri: &str) -> Result<Self, InputError> {
    let rest = uri
      .strip_prefix(DATA_URI_PREFIX)
      .ok_or_else(|| InputError::InvalidDataUri("缺少 data: 前缀".to_string()))?;
    let (header, payload) = rest
      .split_once(',')
      .ok_or_else(|| InputError::InvalidDataUri("缺少 ',' 分隔符".to_string()))?;

    let mut params = header.split(';');
    let mime = match params.next() {
      Some(mime) if !mime.is_empty() => mime.to_string(),
      _ => DEFAULT_MIME.to_string(),
    };
    let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
      let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
      BASE64
        .decode(payload.as_bytes())
        .map_err(|e| InputError::InvalidDataUri(format!("base64 解码失败: {}", e)))?
    } else {
      urlencoding::decode_binary(payload.as_bytes()).into_owned()
    };

    Ok(DataUri { mime, bytes })
  }
}

/// 内嵌在 URL 中的单张图像
pub struct DataUriInput {
  source: Option<ImageSource>,
}

impl FromUrlWithScheme for DataUriInput {
  const SCHEME: &'static str = "data";
}

impl FromUrl for DataUriInput {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(InputError::SchemeMismatch(url.scheme().to_string()));
    }
    // 构造时即校验格式
    DataUri::parse(url.as_str())?;
    Ok(DataUriInput {
      source: Some(ImageSource::DataUri(url.as_str().to_string())),
    })
  }
}

impl Iterator for DataUriInput {
  type Item = ImageSource;

  fn next(&mut self) -> Option<Self::Item> {
    self.source.take()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_base64() {
    let uri = DataUri::parse("data:image/jpeg;base64,AQID").unwrap();
    assert_eq!(uri.mime, "image/jpeg");
    assert_eq!(uri.bytes, vec![1, 2, 3]);
  }

  #[test]
  fn test_parse_percent_encoded() {
    let uri = DataUri::parse("data:,a%20b").unwrap();
    assert_eq!(uri.mime, "text/plain");
    assert_eq!(uri.bytes, b"a b".to_vec());
  }

  #[test]
  fn test_parse_rejects_malformed() {
    assert!(DataUri::parse("image/png;base64,AQID").is_err());
    assert!(DataUri::parse("data:image/png;base64").is_err());
    assert!(DataUri::parse("data:image/png;base64,@@@").is_err());
  }

  #[test]
  fn test_input_rejects_bad_payload_early() {
    let url = Url::parse("data:image/png;base64,@@@").unwrap();
    assert!(matches!(
      DataUriInput::from_url(&url),
      Err(InputError::InvalidDataUri(_))
    ));

    let url = Url::parse("data:image/png;base64,AQID").unwrap();
    assert_eq!(DataUriInput::from_url(&url).unwrap().count(), 1);
  }
}
