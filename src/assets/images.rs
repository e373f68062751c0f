use std::path::Path;

use half::f16;
use image::imageops::{self, FilterType};
use image::Rgba32FImage;

use super::AssetError;

/// Upper bound on the blur chain; the last level is a very rough average of
/// the whole sky.
pub const MAX_ENVIRONMENT_LEVELS: usize = 7;

/// One level of the pre-blurred environment chain, RGBA linear radiance.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentLevel {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<[f32; 4]>,
}

impl EnvironmentLevel {
    /// Half-float texel data ready for an `Rgba16Float` upload.
    pub fn to_f16_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.texels.len() * 8);
        for texel in &self.texels {
            for channel in texel {
                bytes.extend_from_slice(&f16::from_f32(*channel).to_le_bytes());
            }
        }
        bytes
    }
}

/// Equirectangular HDR environment with a mip chain used for rough
/// reflections.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentMap {
    pub levels: Vec<EnvironmentLevel>,
}

impl EnvironmentMap {
    pub fn from_image(image: &Rgba32FImage) -> Self {
        let mut levels = vec![level_from(image)];
        let (mut width, mut height) = image.dimensions();
        let mut current = image.clone();
        while levels.len() < MAX_ENVIRONMENT_LEVELS && width > 1 && height > 1 {
            width = (width / 2).max(1);
            height = (height / 2).max(1);
            current = imageops::resize(&current, width, height, FilterType::Triangle);
            levels.push(level_from(&current));
        }
        Self { levels }
    }

    pub fn width(&self) -> u32 {
        self.levels.first().map(|level| level.width).unwrap_or(0)
    }

    pub fn height(&self) -> u32 {
        self.levels.first().map(|level| level.height).unwrap_or(0)
    }
}

fn level_from(image: &Rgba32FImage) -> EnvironmentLevel {
    let (width, height) = image.dimensions();
    EnvironmentLevel {
        width,
        height,
        texels: image.pixels().map(|pixel| pixel.0).collect(),
    }
}

/// Grayscale projection mask for the spot light.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskImage {
    pub width: u32,
    pub height: u32,
    pub luma: Vec<u8>,
}

pub fn load_environment(path: &Path) -> Result<EnvironmentMap, AssetError> {
    let image = image::open(path).map_err(|source| AssetError::Image {
        path: path.display().to_string(),
        source,
    })?;
    let map = EnvironmentMap::from_image(&image.into_rgba32f());
    log::info!(
        "Loaded environment {}x{} with {} level(s) from {}",
        map.width(),
        map.height(),
        map.levels.len(),
        path.display()
    );
    Ok(map)
}

pub fn load_spot_mask(path: &Path) -> Result<MaskImage, AssetError> {
    let image = image::open(path).map_err(|source| AssetError::Image {
        path: path.display().to_string(),
        source,
    })?;
    let luma = image.to_luma8();
    let (width, height) = luma.dimensions();
    log::info!("Loaded spot mask {}x{} from {}", width, height, path.display());
    Ok(MaskImage {
        width,
        height,
        luma: luma.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba};

    #[test]
    fn mip_chain_halves_until_the_cap() {
        let image = Rgba32FImage::from_pixel(256, 128, Rgba([0.5, 1.0, 2.0, 1.0]));
        let map = EnvironmentMap::from_image(&image);
        assert_eq!(map.levels.len(), MAX_ENVIRONMENT_LEVELS);
        assert_eq!((map.width(), map.height()), (256, 128));
        let last = map.levels.last().unwrap();
        assert_eq!((last.width, last.height), (4, 2));
        // A constant image stays constant through the filter.
        for texel in &last.texels {
            assert!((texel[2] - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn tiny_images_stop_at_one_texel_high() {
        let image = Rgba32FImage::from_pixel(8, 2, Rgba([1.0; 4]));
        let map = EnvironmentMap::from_image(&image);
        assert_eq!(map.levels.len(), 2);
        assert_eq!((map.levels[1].width, map.levels[1].height), (4, 1));
    }

    #[test]
    fn f16_upload_bytes_encode_every_channel() {
        let level = EnvironmentLevel {
            width: 1,
            height: 1,
            texels: vec![[1.0, 0.5, 0.0, 1.0]],
        };
        let bytes = level.to_f16_bytes();
        assert_eq!(bytes.len(), 8);
        assert_eq!(f16::from_le_bytes([bytes[0], bytes[1]]).to_f32(), 1.0);
        assert_eq!(f16::from_le_bytes([bytes[2], bytes[3]]).to_f32(), 0.5);
    }

    #[test]
    fn mask_is_read_as_grayscale() {
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "candlelight_mask_{}_{}.png",
            std::process::id(),
            nonce
        ));
        let gradient = GrayImage::from_fn(4, 2, |x, _| Luma([(x * 60) as u8]));
        gradient.save(&path).unwrap();

        let mask = load_spot_mask(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!((mask.width, mask.height), (4, 2));
        assert_eq!(&mask.luma[..4], &[0, 60, 120, 180]);
    }

    #[test]
    fn unreadable_environment_is_an_image_error() {
        let err = load_environment(Path::new("/no/such/env.hdr")).unwrap_err();
        assert!(matches!(err, AssetError::Image { .. }));
    }
}
