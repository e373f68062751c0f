use serde::{Deserialize, Serialize};

/// RGB triple with components in [0, 1].
pub type Rgb = [f32; 3];

/// Converts an 8-bit `#rrggbb` color into normalized components, unchanged
/// in color space.
pub fn rgb8(r: u8, g: u8, b: u8) -> Rgb {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
}

/// Parses `#rrggbb` (leading `#` optional).
pub fn parse_hex_rgb(value: &str) -> Option<Rgb> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(rgb8(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

pub fn srgb_to_linear(color: Rgb) -> Rgb {
    color.map(|c| {
        if c < 0.04045 {
            c * 0.0773993808
        } else {
            (c * 0.9478672986 + 0.0521327014).powf(2.4)
        }
    })
}

/// Translucent wax shading parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslucentParams {
    pub transmission: f32,
    pub roughness: f32,
    pub internal_roughness: f32,
    pub ior: f32,
    pub attenuation_color: Rgb,
    pub attenuation_distance: f32,
    pub thickness: f32,
    pub scattering: f32,
    pub scattering_absorption: f32,
    pub roughness_blur_scale: f32,
    pub dithering: bool,
    pub double_sided: bool,
}

impl Default for TranslucentParams {
    fn default() -> Self {
        Self {
            transmission: 0.6,
            roughness: 1.0,
            internal_roughness: 0.72,
            ior: 2.9,
            attenuation_color: rgb8(0xff, 0xf5, 0xdb),
            attenuation_distance: 0.03,
            thickness: 2.0,
            scattering: 0.63,
            scattering_absorption: 1.0,
            roughness_blur_scale: 30.0,
            dithering: true,
            double_sided: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("{name} must be within [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f32 },
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
}

impl TranslucentParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        let unit = [
            ("transmission", self.transmission),
            ("roughness", self.roughness),
            ("internal_roughness", self.internal_roughness),
            ("scattering", self.scattering),
            ("scattering_absorption", self.scattering_absorption),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ParamError::OutOfUnitRange { name, value });
            }
        }
        for (index, value) in self.attenuation_color.iter().copied().enumerate() {
            if !(0.0..=1.0).contains(&value) {
                let name = ["attenuation_color.r", "attenuation_color.g", "attenuation_color.b"]
                    [index];
                return Err(ParamError::OutOfUnitRange { name, value });
            }
        }
        let positive = [
            ("ior", self.ior),
            ("attenuation_distance", self.attenuation_distance),
            ("thickness", self.thickness),
            ("roughness_blur_scale", self.roughness_blur_scale),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(ParamError::NotPositive { name, value });
            }
        }
        Ok(())
    }
}

/// Metallic-roughness material as imported from the glTF file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardMaterial {
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: Rgb,
    pub env_intensity: f32,
    pub double_sided: bool,
    /// Index into [`SceneGraph::textures`](super::SceneGraph::textures).
    pub base_color_texture: Option<usize>,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 1.0,
            emissive: [0.0, 0.0, 0.0],
            env_intensity: 1.0,
            double_sided: false,
            base_color_texture: None,
        }
    }
}

/// Uniforms injected into a material whose vertices sway in the wind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindPatch {
    pub time: f32,
    pub amplitude: f32,
    pub frequency: f32,
}

impl Default for WindPatch {
    fn default() -> Self {
        Self {
            time: 0.0,
            amplitude: 0.2,
            frequency: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    Standard(StandardMaterial),
    Translucent(TranslucentParams),
    Flame {
        base: StandardMaterial,
        wind: WindPatch,
    },
}

impl Default for Material {
    fn default() -> Self {
        Material::Standard(StandardMaterial::default())
    }
}

impl Material {
    pub fn wind_mut(&mut self) -> Option<&mut WindPatch> {
        match self {
            Material::Flame { wind, .. } => Some(wind),
            _ => None,
        }
    }

    pub fn wind(&self) -> Option<&WindPatch> {
        match self {
            Material::Flame { wind, .. } => Some(wind),
            _ => None,
        }
    }

    pub fn standard_mut(&mut self) -> Option<&mut StandardMaterial> {
        match self {
            Material::Standard(base) | Material::Flame { base, .. } => Some(base),
            Material::Translucent(_) => None,
        }
    }

    pub fn translucent(&self) -> Option<&TranslucentParams> {
        match self {
            Material::Translucent(params) => Some(params),
            _ => None,
        }
    }

    pub fn translucent_mut(&mut self) -> Option<&mut TranslucentParams> {
        match self {
            Material::Translucent(params) => Some(params),
            _ => None,
        }
    }

    pub fn is_double_sided(&self) -> bool {
        match self {
            Material::Standard(base) | Material::Flame { base, .. } => base.double_sided,
            Material::Translucent(params) => params.double_sided,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing_accepts_hash_prefix() {
        assert_eq!(parse_hex_rgb("#ffffff"), Some([1.0, 1.0, 1.0]));
        assert_eq!(parse_hex_rgb("000000"), Some([0.0, 0.0, 0.0]));
        assert_eq!(parse_hex_rgb("#fff"), None);
        assert_eq!(parse_hex_rgb("#gg0000"), None);
    }

    #[test]
    fn srgb_to_linear_preserves_endpoints() {
        let linear = srgb_to_linear([0.0, 1.0, 0.5]);
        assert_eq!(linear[0], 0.0);
        assert!((linear[1] - 1.0).abs() < 1e-5);
        assert!((linear[2] - 0.214).abs() < 1e-3);
    }

    #[test]
    fn default_translucent_params_are_valid() {
        assert_eq!(TranslucentParams::default().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let params = TranslucentParams {
            scattering: 1.5,
            ..TranslucentParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ParamError::OutOfUnitRange { name: "scattering", .. })
        ));

        let params = TranslucentParams {
            attenuation_distance: 0.0,
            ..TranslucentParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ParamError::NotPositive { name: "attenuation_distance", .. })
        ));
    }

    #[test]
    fn only_flame_carries_wind_uniforms() {
        let mut flame = Material::Flame {
            base: StandardMaterial::default(),
            wind: WindPatch::default(),
        };
        if let Some(wind) = flame.wind_mut() {
            wind.time = 3.0;
        }
        assert_eq!(flame.wind().map(|wind| wind.time), Some(3.0));
        assert!(Material::default().wind().is_none());
        assert!(Material::Translucent(TranslucentParams::default())
            .wind()
            .is_none());
    }
}
