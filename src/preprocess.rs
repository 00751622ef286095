// 该文件是 Fenlei （分类） 项目的一部分。
// src/preprocess.rs - 图像预处理（等比缩放填充）
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

use image::{Rgba, RgbaImage, imageops::FilterType};
use tracing::debug;

use crate::frame::{FrameError, Normalization, RgbNchwTensor};

const LETTERBOX_FILL: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// 源图像在画布中的绘制位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
  pub x: u32,
  pub y: u32,
  pub width: u32,
  pub height: u32,
}

/// 将任意尺寸图像等比缩放到固定画布，居中，黑色填充
#[derive(Debug, Clone, Copy)]
pub struct Letterbox {
  width: u32,
  height: u32,
  filter: FilterType,
}

impl Letterbox {
  pub fn new(width: u32, height: u32) -> Result<Self, FrameError> {
    if width == 0 || height == 0 {
      return Err(FrameError::InvalidInput(format!(
        "目标尺寸必须为正数: {}x{}",
        width, height
      )));
    }
    Ok(Self {
      width,
      height,
      filter: FilterType::Triangle,
    })
  }

  pub fn with_filter(mut self, filter: FilterType) -> Self {
    self.filter = filter;
    self
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  /// 计算源图像在画布中的绘制区域
  pub fn placement(&self, src_width: u32, src_height: u32) -> Result<Placement, FrameError> {
    if src_width == 0 || src_height == 0 {
      return Err(FrameError::InvalidInput(format!(
        "源图像面积为零: {}x{}",
        src_width, src_height
      )));
    }

    let (tw, th) = (self.width, self.height);
    // 比较 src_w / src_h 与 tw / th，交叉相乘避免浮点误差
    let image_side = u64::from(src_width) * u64::from(th);
    let canvas_side = u64::from(tw) * u64::from(src_height);

    let placement = if image_side < canvas_side {
      // 源图像相对更高：高度占满
      let width = scaled(src_width, th, src_height, tw);
      Placement {
        x: (tw - width) / 2,
        y: 0,
        width,
        height: th,
      }
    } else if image_side > canvas_side {
      // 源图像相对更宽：宽度占满
      let height = scaled(src_height, tw, src_width, th);
      Placement {
        x: 0,
        y: (th - height) / 2,
        width: tw,
        height,
      }
    } else {
      Placement {
        x: 0,
        y: 0,
        width: tw,
        height: th,
      }
    };

    Ok(placement)
  }

  /// 在新的画布上绘制缩放后的图像
  pub fn apply(&self, image: &RgbaImage) -> Result<RgbaImage, FrameError> {
    let placement = self.placement(image.width(), image.height())?;
    debug!(
      "等比缩放: {}x{} -> {}x{} 偏移 ({}, {})",
      image.width(),
      image.height(),
      placement.width,
      placement.height,
      placement.x,
      placement.y
    );

    let mut canvas = RgbaImage::from_pixel(self.width, self.height, LETTERBOX_FILL);
    let resized = image::imageops::resize(image, placement.width, placement.height, self.filter);
    image::imageops::overlay(
      &mut canvas,
      &resized,
      i64::from(placement.x),
      i64::from(placement.y),
    );
    Ok(canvas)
  }
}

/// `len * (num / den)`，四舍五入并限制在 `1..=max`
fn scaled(len: u32, num: u32, den: u32, max: u32) -> u32 {
  let value = (f64::from(len) * (f64::from(num) / f64::from(den))).round() as u32;
  value.clamp(1, max)
}

/// 等比缩放 + 张量布局转换
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
  letterbox: Letterbox,
  normalization: Normalization,
}

impl Preprocessor {
  pub fn new(letterbox: Letterbox, normalization: Normalization) -> Self {
    Self {
      letterbox,
      normalization,
    }
  }

  pub fn letterbox(&self) -> &Letterbox {
    &self.letterbox
  }

  pub fn canvas(&self, image: &RgbaImage) -> Result<RgbaImage, FrameError> {
    self.letterbox.apply(image)
  }

  pub fn tensor(&self, canvas: &RgbaImage) -> Result<RgbNchwTensor, FrameError> {
    RgbNchwTensor::from_rgba(
      canvas.as_raw(),
      canvas.width(),
      canvas.height(),
      &self.normalization,
    )
  }
}
