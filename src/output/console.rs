// 该文件是 Fenlei （分类） 项目的一部分。
// src/output/console.rs - 日志输出
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

use std::convert::Infallible;

use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  classifier::Classified,
  output::{OutputError, Render},
};

/// `console:?top=5`，通过 tracing 打印结果
pub struct ConsoleOutput {
  /// 0 表示打印全部类别
  top: usize,
}

impl FromUrlWithScheme for ConsoleOutput {
  const SCHEME: &'static str = "console";
}

impl FromUrl for ConsoleOutput {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(OutputError::SchemeMismatch(url.scheme().to_string()));
    }

    let top = url
      .query_pairs()
      .find(|(k, _)| k == "top")
      .and_then(|(_, v)| v.parse().ok())
      .unwrap_or(0);

    Ok(ConsoleOutput { top })
  }
}

impl Render<Classified> for ConsoleOutput {
  type Error = Infallible;

  fn render_result(&self, result: &Classified) -> Result<(), Self::Error> {
    let classification = &result.classification;
    info!(
      "{}: {} ({:.4})",
      result.name,
      classification.best_label(),
      classification.best_score()
    );

    let pairs = if self.top == 0 {
      classification.pairs().collect()
    } else {
      classification.top(self.top)
    };
    for (label, score) in pairs {
      info!("  {:<24} {:.4}", label, score);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_console_top_query() {
    let url = Url::parse("console:?top=3").unwrap();
    assert_eq!(ConsoleOutput::from_url(&url).unwrap().top, 3);

    let url = Url::parse("console:").unwrap();
    assert_eq!(ConsoleOutput::from_url(&url).unwrap().top, 0);
  }
}
