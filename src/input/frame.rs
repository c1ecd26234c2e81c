//! 相机帧 - YUV_420 平面数据与格式转换
//!
//! 相机回调给出三个平面 (Y, U, V); 会话先将其打包为 NV21 交给引擎,
//! 需要 RGB 的引擎再自行解码。

use anyhow::{bail, Context, Result};
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// 单个图像平面
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plane {
    pub bytes: Vec<u8>,
    /// 行跨度 (缺省为紧凑排列)
    #[serde(default)]
    pub bytes_per_row: Option<usize>,
    /// 像素跨度 (缺省为 1)
    #[serde(default)]
    pub bytes_per_pixel: Option<usize>,
}

impl Plane {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            ..Default::default()
        }
    }

    fn row_stride(&self, plane_width: usize) -> usize {
        self.bytes_per_row.unwrap_or(plane_width)
    }

    fn pixel_stride(&self) -> usize {
        self.bytes_per_pixel.unwrap_or(1)
    }
}

/// 相机帧 (相机 → 检测会话)
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub planes: Vec<Plane>,
}

impl CameraFrame {
    pub fn new(width: u32, height: u32, planes: Vec<Plane>) -> Self {
        Self {
            width,
            height,
            planes,
        }
    }

    /// 全黑占位帧 (回放引擎不读取像素, 但帧仍需通过格式检查)
    pub fn blank(width: u32, height: u32) -> Self {
        let chroma = (width.div_ceil(2) * height.div_ceil(2)) as usize;
        Self::new(
            width,
            height,
            vec![
                Plane::new(vec![0; (width * height) as usize]),
                Plane::new(vec![128; chroma]),
                Plane::new(vec![128; chroma]),
            ],
        )
    }

    fn yuv_planes(&self) -> Result<(&Plane, &Plane, &Plane)> {
        match self.planes.as_slice() {
            [y, u, v, ..] => Ok((y, u, v)),
            planes => bail!("YUV_420 帧需要 3 个平面, 实际 {}", planes.len()),
        }
    }

    /// 打包为紧凑 NV21: Y 平面逐行去掉行填充, 之后 V/U 交错
    pub fn to_nv21(&self) -> Result<Nv21Image> {
        let (y_plane, u_plane, v_plane) = self.yuv_planes()?;
        let (w, h) = (self.width as usize, self.height as usize);
        let (chroma_w, chroma_h) = (w.div_ceil(2), h.div_ceil(2));

        let y_stride = y_plane.row_stride(w);
        let u_stride = u_plane.row_stride(chroma_w * u_plane.pixel_stride());
        let v_stride = v_plane.row_stride(chroma_w * v_plane.pixel_stride());

        let mut data = Vec::with_capacity(w * h + chroma_w * chroma_h * 2);
        for row in 0..h {
            let start = row * y_stride;
            let line = y_plane
                .bytes
                .get(start..start + w)
                .with_context(|| format!("Y 平面越界 (第 {row} 行)"))?;
            data.extend_from_slice(line);
        }

        for row in 0..chroma_h {
            for col in 0..chroma_w {
                let vi = row * v_stride + col * v_plane.pixel_stride();
                let ui = row * u_stride + col * u_plane.pixel_stride();
                let vv = *v_plane
                    .bytes
                    .get(vi)
                    .with_context(|| format!("V 平面越界 ({col}, {row})"))?;
                let uv = *u_plane
                    .bytes
                    .get(ui)
                    .with_context(|| format!("U 平面越界 ({col}, {row})"))?;
                data.push(vv);
                data.push(uv);
            }
        }

        Ok(Nv21Image {
            width: self.width,
            height: self.height,
            data,
        })
    }

    /// BT.601 YUV → RGB
    pub fn to_rgb_image(&self) -> Result<RgbImage> {
        self.to_nv21()?.to_rgb_image()
    }
}

/// 紧凑排列的 NV21 图像 (检测引擎的输入)
#[derive(Clone, Debug, PartialEq)]
pub struct Nv21Image {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Nv21Image {
    /// BT.601 解码为 RGB
    pub fn to_rgb_image(&self) -> Result<RgbImage> {
        let (w, h) = (self.width as usize, self.height as usize);
        let chroma_w = w.div_ceil(2);
        let chroma_len = chroma_w * h.div_ceil(2) * 2;
        if self.data.len() < w * h + chroma_len {
            bail!("NV21 数据不足: {} < {}", self.data.len(), w * h + chroma_len);
        }

        let (luma, chroma) = self.data.split_at(w * h);
        let mut img = RgbImage::new(self.width, self.height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let (col, row) = (x as usize, y as usize);
            let vu = ((row / 2) * chroma_w + col / 2) * 2;
            *pixel = yuv_to_rgb(luma[row * w + col], chroma[vu + 1], chroma[vu]);
        }

        Ok(img)
    }
}

fn yuv_to_rgb(y: u8, u: u8, v: u8) -> Rgb<u8> {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = y + 1.402 * v;
    let g = y - 0.344_136 * u - 0.714_136 * v;
    let b = y + 1.772 * u;

    Rgb([
        r.round().clamp(0.0, 255.0) as u8,
        g.round().clamp(0.0, 255.0) as u8,
        b.round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_frame(w: u32, h: u32, luma: u8) -> CameraFrame {
        let mut frame = CameraFrame::blank(w, h);
        frame.planes[0].bytes.fill(luma);
        frame
    }

    #[test]
    fn test_nv21_interleaves_v_then_u() {
        let frame = CameraFrame::new(
            2,
            2,
            vec![
                Plane::new(vec![1, 2, 3, 4]),
                Plane::new(vec![10]),
                Plane::new(vec![20]),
            ],
        );
        let nv21 = frame.to_nv21().unwrap();
        assert_eq!(nv21.data, vec![1, 2, 3, 4, 20, 10]);
        assert_eq!((nv21.width, nv21.height), (2, 2));
    }

    #[test]
    fn test_nv21_drops_row_padding() {
        let mut y = Plane::new(vec![1, 2, 0, 0, 3, 4, 0, 0]);
        y.bytes_per_row = Some(4);
        // 半平面交错格式: U/V 像素跨度 2
        let mut u = Plane::new(vec![10, 99]);
        u.bytes_per_pixel = Some(2);
        let mut v = Plane::new(vec![20, 99]);
        v.bytes_per_pixel = Some(2);

        let frame = CameraFrame::new(2, 2, vec![y, u, v]);
        assert_eq!(frame.to_nv21().unwrap().data, vec![1, 2, 3, 4, 20, 10]);
    }

    #[test]
    fn test_missing_planes_is_error() {
        let frame = CameraFrame::new(2, 2, vec![Plane::new(vec![0; 4])]);
        assert!(frame.to_nv21().is_err());
        assert!(frame.to_rgb_image().is_err());
    }

    #[test]
    fn test_gray_to_rgb() {
        let img = gray_frame(4, 2, 100).to_rgb_image().unwrap();
        assert_eq!(img.dimensions(), (4, 2));
        assert!(img.pixels().all(|p| *p == Rgb([100, 100, 100])));
    }

    #[test]
    fn test_odd_size_frame() {
        let img = gray_frame(3, 3, 40).to_rgb_image().unwrap();
        assert_eq!(img.dimensions(), (3, 3));
    }

    #[test]
    fn test_short_plane_is_error() {
        let mut frame = gray_frame(4, 4, 50);
        frame.planes[0].bytes.truncate(3);
        assert!(frame.to_nv21().is_err());
    }

    #[test]
    fn test_short_nv21_is_error() {
        let image = Nv21Image {
            width: 4,
            height: 4,
            data: vec![0; 10],
        };
        assert!(image.to_rgb_image().is_err());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let frame: CameraFrame = serde_json::from_str(
            r#"{"width": 2, "height": 2, "planes": [
                {"bytes": [1, 2, 3, 4], "bytesPerRow": 2},
                {"bytes": [5], "bytesPerPixel": 1},
                {"bytes": [6]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(frame.planes[0].bytes_per_row, Some(2));
        assert_eq!(frame.planes[2].bytes_per_pixel, None);
    }
}
