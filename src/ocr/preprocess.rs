//! Image variant generation for OCR.
//!
//! Each page image is rendered into a fixed sequence of preprocessed
//! variants. Different engines (and different documents) respond better
//! to different variants, so all of them are tried and the candidate
//! texts are compared afterwards.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::close;
use serde::{Deserialize, Serialize};

/// Sigma matching a 3x3 Gaussian kernel.
const BLUR_SIGMA: f32 = 0.8;

/// CLAHE clip limit, relative to a uniform histogram.
const CLAHE_CLIP_LIMIT: f32 = 2.0;

/// CLAHE tiles per axis.
const CLAHE_GRID: u32 = 8;

/// Index of the untouched source image.
pub const ORIGINAL_INDEX: usize = 0;

/// Index of the Otsu-binarized image.
pub const THRESHOLD_INDEX: usize = 3;

/// Transform applied to produce a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantTag {
    Original,
    Grayscale,
    Blurred,
    Threshold,
    Morphological,
    ContrastEnhanced,
}

impl VariantTag {
    /// All tags in generation order.
    pub const ALL: [VariantTag; 6] = [
        VariantTag::Original,
        VariantTag::Grayscale,
        VariantTag::Blurred,
        VariantTag::Threshold,
        VariantTag::Morphological,
        VariantTag::ContrastEnhanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VariantTag::Original => "original",
            VariantTag::Grayscale => "grayscale",
            VariantTag::Blurred => "blurred",
            VariantTag::Threshold => "threshold",
            VariantTag::Morphological => "morphological",
            VariantTag::ContrastEnhanced => "contrast_enhanced",
        }
    }
}

impl std::fmt::Display for VariantTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A preprocessed derivative of a source image.
#[derive(Debug, Clone)]
pub struct ImageVariant {
    pub tag: VariantTag,
    pub image: DynamicImage,
}

/// Produce the variant sequence for one image.
///
/// The order is fixed and matches [`VariantTag::ALL`]; callers rely on
/// [`ORIGINAL_INDEX`] and [`THRESHOLD_INDEX`] to pick neural-backend inputs.
pub fn generate_variants(image: &DynamicImage) -> Vec<ImageVariant> {
    let gray = to_grayscale(image);
    let blurred = gaussian_blur_f32(&gray, BLUR_SIGMA);
    let binary = binarize(&gray, otsu_level(&gray));
    let closed = close(&binary, Norm::LInf, 1);
    let enhanced = clahe(&gray, CLAHE_CLIP_LIMIT, CLAHE_GRID);

    vec![
        ImageVariant {
            tag: VariantTag::Original,
            image: image.clone(),
        },
        luma_variant(VariantTag::Grayscale, gray),
        luma_variant(VariantTag::Blurred, blurred),
        luma_variant(VariantTag::Threshold, binary),
        luma_variant(VariantTag::Morphological, closed),
        luma_variant(VariantTag::ContrastEnhanced, enhanced),
    ]
}

fn luma_variant(tag: VariantTag, image: GrayImage) -> ImageVariant {
    ImageVariant {
        tag,
        image: DynamicImage::ImageLuma8(image),
    }
}

/// Single-channel input is reused as-is; anything else goes through luma conversion.
fn to_grayscale(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => other.to_luma8(),
    }
}

/// Global binary threshold: pixels brighter than `level` become white.
fn binarize(gray: &GrayImage, level: u8) -> GrayImage {
    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > level { 255 } else { 0 };
    }
    out
}

/// Contrast-limited adaptive histogram equalization.
///
/// Histograms are computed per tile, clipped at `clip_limit` times the
/// uniform bin height, and the resulting lookup tables are blended
/// bilinearly between tile centers.
fn clahe(gray: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    let tile_w = width.div_ceil(grid.min(width));
    let tile_h = height.div_ceil(grid.min(height));
    // Recount so that no tile is empty
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let mut luts: Vec<[u8; 256]> = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);
            luts.push(tile_lut(gray, (x0, y0, x1, y1), clip_limit));
        }
    }

    let lut_at = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];

    let mut out = GrayImage::new(width, height);
    for (x, y, pixel) in gray.enumerate_pixels() {
        let value = pixel.0[0] as usize;

        let fx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
        let fy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let tx0 = (fx.floor().max(0.0) as u32).min(tiles_x - 1);
        let ty0 = (fy.floor().max(0.0) as u32).min(tiles_y - 1);
        let tx1 = (tx0 + 1).min(tiles_x - 1);
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let ax = (fx - tx0 as f32).clamp(0.0, 1.0);
        let ay = (fy - ty0 as f32).clamp(0.0, 1.0);

        let top = lut_at(tx0, ty0)[value] as f32 * (1.0 - ax) + lut_at(tx1, ty0)[value] as f32 * ax;
        let bottom =
            lut_at(tx0, ty1)[value] as f32 * (1.0 - ax) + lut_at(tx1, ty1)[value] as f32 * ax;
        let blended = top * (1.0 - ay) + bottom * ay;

        out.put_pixel(x, y, Luma([blended.round().clamp(0.0, 255.0) as u8]));
    }

    out
}

/// Equalization lookup table for one tile, with clipped histogram.
fn tile_lut(gray: &GrayImage, (x0, y0, x1, y1): (u32, u32, u32, u32), clip_limit: f32) -> [u8; 256] {
    let mut hist = [0u32; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            hist[gray.get_pixel(x, y).0[0] as usize] += 1;
        }
    }

    let area = (x1 - x0) * (y1 - y0);
    let limit = ((clip_limit * area as f32 / 256.0) as u32).max(1);

    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }

    let share = excess / 256;
    let remainder = (excess % 256) as usize;
    for (i, bin) in hist.iter_mut().enumerate() {
        *bin += share + u32::from(i < remainder);
    }

    let mut lut = [0u8; 256];
    let mut cumulative = 0u32;
    for (i, count) in hist.iter().enumerate() {
        cumulative += count;
        lut[i] = ((cumulative as f32 * 255.0 / area as f32).round()).min(255.0) as u8;
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn gradient(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| Luma([((x * 7 + y * 3) % 256) as u8]))
    }

    #[test]
    fn test_variant_order() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 16, Rgb([200, 10, 10])));
        let variants = generate_variants(&image);

        let tags: Vec<VariantTag> = variants.iter().map(|v| v.tag).collect();
        assert_eq!(tags, VariantTag::ALL.to_vec());
        assert_eq!(variants[ORIGINAL_INDEX].tag, VariantTag::Original);
        assert_eq!(variants[THRESHOLD_INDEX].tag, VariantTag::Threshold);
    }

    #[test]
    fn test_variants_keep_dimensions() {
        let image = DynamicImage::ImageLuma8(gradient(45, 23));
        for variant in generate_variants(&image) {
            assert_eq!(variant.image.width(), 45, "{}", variant.tag);
            assert_eq!(variant.image.height(), 23, "{}", variant.tag);
        }
    }

    #[test]
    fn test_grayscale_input_reused() {
        let gray = gradient(20, 20);
        let variants = generate_variants(&DynamicImage::ImageLuma8(gray.clone()));
        assert_eq!(variants[1].image.as_luma8(), Some(&gray));
    }

    #[test]
    fn test_threshold_is_binary() {
        let variants = generate_variants(&DynamicImage::ImageLuma8(gradient(64, 64)));
        for tag_index in [THRESHOLD_INDEX, 4] {
            let binary = variants[tag_index].image.as_luma8().unwrap();
            assert!(binary.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        }
    }

    #[test]
    fn test_binarize_splits_on_level() {
        let gray = GrayImage::from_fn(3, 1, |x, _| Luma([[10, 128, 200][x as usize]]));
        let binary = binarize(&gray, 128);
        let values: Vec<u8> = binary.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![0, 0, 255]);
    }

    #[test]
    fn test_clahe_uniform_image_stays_uniform() {
        let flat = GrayImage::from_pixel(40, 40, Luma([90]));
        let enhanced = clahe(&flat, CLAHE_CLIP_LIMIT, CLAHE_GRID);
        let first = enhanced.get_pixel(0, 0).0[0];
        assert!(enhanced.pixels().all(|p| p.0[0] == first));
    }

    #[test]
    fn test_tile_lut_is_monotonic() {
        let img = gradient(16, 16);
        let lut = tile_lut(&img, (0, 0, 16, 16), CLAHE_CLIP_LIMIT);
        assert!(lut.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(lut[255], 255);
    }

    #[test]
    fn test_tiny_images() {
        for (w, h) in [(1, 1), (1, 9), (9, 1), (3, 17)] {
            let image = DynamicImage::ImageLuma8(gradient(w, h));
            let variants = generate_variants(&image);
            assert_eq!(variants.len(), 6);
            assert_eq!(variants[5].image.width(), w);
        }
    }
}
