// 该文件是 Fenlei （分类） 项目的一部分。
// src/frame.rs - NCHW 张量定义
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

use ndarray::{Array4, ArrayView3, ArrayView4, s};
use thiserror::Error;

const RGB_CHANNELS: usize = 3;
const RGBA_CHANNELS: usize = 4;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
  #[error("输入无效: {0}")]
  InvalidInput(String),
  #[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
  ShapeMismatch { expected: usize, actual: usize },
}

/// 像素归一化策略
///
/// 默认 `Raw` 保持 0-255 的原始数值，这是导出模型时约定的输入格式。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Normalization {
  #[default]
  Raw,
  /// `(v * scale - mean[c]) / std[c]`
  MeanStd {
    scale: f32,
    mean: [f32; 3],
    std: [f32; 3],
  },
}

impl Normalization {
  /// ImageNet 常用的均值方差
  pub fn imagenet() -> Self {
    Normalization::MeanStd {
      scale: 1.0 / 255.0,
      mean: [0.485, 0.456, 0.406],
      std: [0.229, 0.224, 0.225],
    }
  }

  #[inline]
  fn apply(&self, channel: usize, value: u8) -> f32 {
    let value = f32::from(value);
    match self {
      Normalization::Raw => value,
      Normalization::MeanStd { scale, mean, std } => (value * scale - mean[channel]) / std[channel],
    }
  }
}

/// 形状为 [1, 3, H, W] 的平面 RGB 浮点张量
#[derive(Debug, Clone, PartialEq)]
pub struct RgbNchwTensor {
  data: Array4<f32>,
}

impl RgbNchwTensor {
  /// 将交错排列的 RGBA 缓冲转换为平面 NCHW 张量，丢弃 alpha 通道
  pub fn from_rgba(
    rgba: &[u8],
    width: u32,
    height: u32,
    normalization: &Normalization,
  ) -> Result<Self, FrameError> {
    if width == 0 || height == 0 {
      return Err(FrameError::InvalidInput(format!(
        "张量尺寸必须为正数: {}x{}",
        width, height
      )));
    }

    let (width, height) = (width as usize, height as usize);
    let expected = width * height * RGBA_CHANNELS;
    if rgba.len() != expected {
      return Err(FrameError::ShapeMismatch {
        expected,
        actual: rgba.len(),
      });
    }

    let source = ArrayView3::from_shape((height, width, RGBA_CHANNELS), rgba).map_err(|e| {
      FrameError::InvalidInput(format!("无法构造像素视图: {}", e))
    })?;

    let mut data = Array4::<f32>::zeros((1, RGB_CHANNELS, height, width));
    for c in 0..RGB_CHANNELS {
      let plane = source.slice(s![.., .., c]);
      data
        .slice_mut(s![0, c, .., ..])
        .zip_mut_with(&plane, |dst, &src| *dst = normalization.apply(c, src));
    }

    Ok(Self { data })
  }

  pub fn height(&self) -> usize {
    self.data.dim().2
  }

  pub fn width(&self) -> usize {
    self.data.dim().3
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  pub fn shape(&self) -> [usize; 4] {
    let (n, c, h, w) = self.data.dim();
    [n, c, h, w]
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  pub fn view(&self) -> ArrayView4<'_, f32> {
    self.data.view()
  }

  /// 按内存顺序排列的数据（全部 R，然后全部 G，然后全部 B）
  pub fn as_slice(&self) -> &[f32] {
    // 由 zeros 构造，始终为标准布局
    self
      .data
      .as_slice()
      .unwrap_or_default()
  }

  pub fn into_raw(self) -> ([usize; 4], Vec<f32>) {
    let shape = self.shape();
    let data = if self.data.is_standard_layout() {
      self.data.into_raw_vec_and_offset().0
    } else {
      self.data.iter().copied().collect()
    };
    (shape, data)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_single_pixel_goes_to_channel_planes() {
    let tensor = RgbNchwTensor::from_rgba(&[10, 20, 30, 255], 1, 1, &Normalization::Raw).unwrap();
    assert_eq!(tensor.shape(), [1, 3, 1, 1]);
    assert_eq!(tensor.as_slice(), &[10.0, 20.0, 30.0]);
  }

  #[test]
  fn test_planar_layout_and_alpha_dropped() {
    // 2x3 图像，alpha 取一个不会出现在 RGB 中的值
    let (w, h) = (3u32, 2u32);
    let mut rgba = Vec::new();
    for i in 0..(w * h) as u8 {
      rgba.extend_from_slice(&[i, 100 + i, 200 + i, 77]);
    }
    let tensor = RgbNchwTensor::from_rgba(&rgba, w, h, &Normalization::Raw).unwrap();
    let plane = (w * h) as usize;

    assert_eq!(tensor.len(), 3 * plane);
    assert_eq!(tensor.height(), 2);
    assert_eq!(tensor.width(), 3);
    assert!(!tensor.as_slice().contains(&77.0));

    let data = tensor.as_slice();
    for i in 0..plane {
      assert_eq!(data[i], i as f32);
      assert_eq!(data[plane + i], 100.0 + i as f32);
      assert_eq!(data[2 * plane + i], 200.0 + i as f32);
    }

    // (y=1, x=2) 位于每个平面的 1*3+2 处
    assert_eq!(tensor.view()[[0, 0, 1, 2]], 5.0);
  }

  #[test]
  fn test_length_mismatch() {
    let err = RgbNchwTensor::from_rgba(&[0; 15], 2, 2, &Normalization::Raw).unwrap_err();
    assert_eq!(
      err,
      FrameError::ShapeMismatch {
        expected: 16,
        actual: 15
      }
    );
  }

  #[test]
  fn test_zero_dimension() {
    let err = RgbNchwTensor::from_rgba(&[], 0, 4, &Normalization::Raw).unwrap_err();
    assert!(matches!(err, FrameError::InvalidInput(_)));
  }

  #[test]
  fn test_mean_std_normalization() {
    let norm = Normalization::MeanStd {
      scale: 1.0,
      mean: [10.0, 20.0, 30.0],
      std: [2.0, 4.0, 5.0],
    };
    let tensor = RgbNchwTensor::from_rgba(&[12, 28, 40, 0], 1, 1, &norm).unwrap();
    assert_eq!(tensor.as_slice(), &[1.0, 2.0, 2.0]);
  }

  #[test]
  fn test_into_raw_keeps_order() {
    let tensor = RgbNchwTensor::from_rgba(&[1, 2, 3, 4, 5, 6, 7, 8], 2, 1, &Normalization::Raw).unwrap();
    let (shape, data) = tensor.into_raw();
    assert_eq!(shape, [1, 3, 1, 2]);
    assert_eq!(data, vec![1.0, 5.0, 2.0, 6.0, 3.0, 7.0]);
  }
}
