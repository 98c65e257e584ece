//! 顾客签字图片编解码
//!
//! 画布采集到的 RGBA 像素先无损编码为 PNG，再转为 base64 文本存入
//! `transactions.signature`；解码过程完全可逆。

use crate::error::{AppError, AppResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

const MAX_DIMENSION: u32 = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRaster {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl SignatureRaster {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> AppResult<Self> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(AppError::ValidationError(format!(
                "签字图片尺寸无效: {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(AppError::ValidationError(format!(
                "签字像素长度不匹配: 期望 {expected} 字节, 实际 {} 字节",
                rgba.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// 客户端以 base64 传输原始 RGBA 像素
    pub fn from_base64_rgba(width: u32, height: u32, rgba_base64: &str) -> AppResult<Self> {
        let rgba = STANDARD
            .decode(rgba_base64.trim())
            .map_err(|e| AppError::ValidationError(format!("签字数据不是有效的 base64: {e}")))?;
        Self::new(width, height, rgba)
    }
}

/// RGBA -> PNG -> base64
pub fn encode_signature(raster: &SignatureRaster) -> AppResult<String> {
    let img = RgbaImage::from_raw(raster.width, raster.height, raster.rgba.clone())
        .ok_or_else(|| AppError::ValidationError("签字像素长度不匹配".to_string()))?;

    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| AppError::InternalError(format!("签字图片编码失败: {e}")))?;

    Ok(STANDARD.encode(png))
}

/// base64 -> PNG 字节（用于直接返回 image/png）
pub fn decode_signature_png(encoded: &str) -> AppResult<Vec<u8>> {
    let png = STANDARD
        .decode(encoded.trim())
        .map_err(|e| AppError::InternalError(format!("签字数据损坏: {e}")))?;
    // 确认确实是 PNG
    image::load_from_memory_with_format(&png, ImageFormat::Png)
        .map_err(|e| AppError::InternalError(format!("签字图片解码失败: {e}")))?;
    Ok(png)
}

/// base64 -> PNG -> RGBA
pub fn decode_signature(encoded: &str) -> AppResult<SignatureRaster> {
    let png = STANDARD
        .decode(encoded.trim())
        .map_err(|e| AppError::InternalError(format!("签字数据损坏: {e}")))?;
    let img = image::load_from_memory_with_format(&png, ImageFormat::Png)
        .map_err(|e| AppError::InternalError(format!("签字图片解码失败: {e}")))?
        .into_rgba8();
    let (width, height) = img.dimensions();
    Ok(SignatureRaster {
        width,
        height,
        rgba: img.into_raw(),
    })
}
