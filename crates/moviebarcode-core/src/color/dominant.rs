use image::Rgb;
use ndarray::{ArrayView3, Axis};

use crate::error::Result;

use super::kmeans::{cluster_colors, ColorPoint, KMeansParams};

/// The single most representative color of a frame.
///
/// Components are kept in the frame's channel order (B, G, R) and at the
/// precision produced by clustering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DominantColor {
    pub bgr: ColorPoint,
}

impl DominantColor {
    pub fn from_bgr(bgr: ColorPoint) -> Self {
        Self { bgr }
    }

    /// 8-bit RGB pixel, channels reversed from storage order. Components are
    /// clamped to [0, 255] and truncated.
    pub fn to_rgb8(&self) -> Rgb<u8> {
        let [b, g, r] = self.bgr;
        Rgb([to_u8(r), to_u8(g), to_u8(b)])
    }
}

fn to_u8(v: f32) -> u8 {
    v.clamp(0.0, 255.0) as u8
}

/// Flatten a `(height, width, 3)` view into one point per pixel, row-major.
pub fn pixel_points(view: ArrayView3<'_, u8>) -> Vec<ColorPoint> {
    view.lanes(Axis(2))
        .into_iter()
        .map(|px| [px[0] as f32, px[1] as f32, px[2] as f32])
        .collect()
}

/// Center of the most populated k-means cluster over the pixels of `view`.
pub fn dominant_color(view: ArrayView3<'_, u8>, params: &KMeansParams) -> Result<DominantColor> {
    let points = pixel_points(view);
    let clusters = cluster_colors(&points, params)?;
    Ok(DominantColor::from_bgr(clusters.dominant()))
}
