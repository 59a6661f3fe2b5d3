use std::{
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
};

use json::JsonValue;

use crate::{
    error::{PixelizeError, Result},
    palette::Palette,
    transform::quantize::QuantizePolicy,
    utils::pixel::Rgb,
};

pub const DEFAULT_DOWNSCALE_FACTOR: u32 = 2;

/// Where the quantization palette comes from.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PaletteSource {
    /// [crate::palette::DEFAULT_PALETTE]
    #[default]
    Default,
    /// Comma delimited `r,g,b` resource
    File(PathBuf),
    /// Colors listed in the config itself
    Inline(Vec<Rgb>),
}

impl PaletteSource {
    pub fn load(&self) -> Result<Palette> {
        match self {
            PaletteSource::Default => Ok(Palette::default()),
            PaletteSource::File(path) => Palette::read(path),
            PaletteSource::Inline(colors) => Palette::new(colors.clone()),
        }
    }
}

/// Per-run parameters shared by every stage of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessConfig {
    /// Downscale factor, reused to upscale back. 1 disables both.
    pub downscale_factor: u32,
    pub quantization_policy: QuantizePolicy,
    /// Stop at the downscaled resolution.
    pub suppress_upscale: bool,
    pub enable_chroma_key: bool,
    /// Seed for [QuantizePolicy::Probabilistic]. Drawn per run when unset.
    pub seed: Option<u64>,
    pub palette: PaletteSource,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            downscale_factor: DEFAULT_DOWNSCALE_FACTOR,
            quantization_policy: QuantizePolicy::Flat,
            suppress_upscale: false,
            enable_chroma_key: false,
            seed: None,
            palette: PaletteSource::Default,
        }
    }
}

/// Validate a user supplied factor. Zero and negatives are rejected.
pub fn factor_from_i64(value: i64) -> Result<u32> {
    if value <= 0 {
        return Err(PixelizeError::invalid_argument(format!(
            "downscale factor must be a positive integer, got {value}"
        )));
    }
    u32::try_from(value).map_err(|_| {
        PixelizeError::invalid_argument(format!("downscale factor {value} is too large"))
    })
}

impl ProcessConfig {
    pub fn validate(&self) -> Result {
        factor_from_i64(i64::from(self.downscale_factor)).map(|_| ())
    }

    /// Missing keys keep their defaults.
    pub fn from_json(json_string: &str) -> Result<ProcessConfig> {
        let json = json::parse(json_string)?;
        if !json.is_object() {
            return Err(config_error("top level value must be an object"));
        }

        let mut config = ProcessConfig::default();

        let factor = &json["downscale_factor"];
        if !factor.is_null() {
            match factor.as_i64() {
                Some(val) => config.downscale_factor = factor_from_i64(val)?,
                None => return Err(config_error("Couldn't parse downscale_factor")),
            }
        }

        let policy = &json["quantization_policy"];
        if !policy.is_null() {
            match policy.as_str() {
                Some(val) => config.quantization_policy = val.parse()?,
                None => return Err(config_error("Couldn't parse quantization_policy")),
            }
        }

        config.suppress_upscale = read_bool(&json, "suppress_upscale")?;
        config.enable_chroma_key = read_bool(&json, "enable_chroma_key")?;

        let seed = &json["seed"];
        if !seed.is_null() {
            match seed.as_u64() {
                Some(val) => config.seed = Some(val),
                None => return Err(config_error("Couldn't parse seed")),
            }
        }

        config.palette = if !json["palette"].is_null() {
            if !json["palette"].is_array() {
                return Err(config_error("palette should be an array of #rrggbb strings"));
            }
            let colors = json["palette"]
                .members()
                .map(|color| match color.as_str() {
                    Some(hex) => Rgb::from_hex(hex).map_err(|_| {
                        config_error(&format!("Couldn't parse palette color {hex:?}"))
                    }),
                    None => Err(config_error("Couldn't parse palette.*")),
                })
                .collect::<Result<Vec<Rgb>>>()?;
            PaletteSource::Inline(colors)
        } else if let Some(path) = json["palette_path"].as_str() {
            PaletteSource::File(PathBuf::from(path))
        } else if !json["palette_path"].is_null() {
            return Err(config_error("Couldn't parse palette_path"));
        } else {
            PaletteSource::Default
        };

        Ok(config)
    }

    pub fn to_json(&self) -> String {
        let mut data = JsonValue::new_object();

        data["downscale_factor"] = self.downscale_factor.into();
        data["quantization_policy"] = self.quantization_policy.into();
        data["suppress_upscale"] = self.suppress_upscale.into();
        data["enable_chroma_key"] = self.enable_chroma_key.into();
        if let Some(seed) = self.seed {
            data["seed"] = seed.into();
        }
        match &self.palette {
            PaletteSource::Default => {}
            PaletteSource::File(path) => {
                data["palette_path"] = path.to_string_lossy().into_owned().into();
            }
            PaletteSource::Inline(colors) => data["palette"] = colors.clone().into(),
        }

        data.pretty(2)
    }

    pub fn read_config<P: AsRef<Path>>(path: P) -> Result<ProcessConfig> {
        let mut file = File::open(path)?;
        let mut buff = String::new();
        file.read_to_string(&mut buff)?;

        ProcessConfig::from_json(&buff)
    }

    pub fn write_config<P: AsRef<Path>>(&self, path: P) -> Result {
        let mut file = File::create(path)?;
        file.write_all(self.to_json().as_bytes())?;
        Ok(())
    }
}

fn read_bool(json: &JsonValue, key: &str) -> Result<bool> {
    let value = &json[key];
    if value.is_null() {
        return Ok(false);
    }
    value
        .as_bool()
        .ok_or_else(|| config_error(&format!("Couldn't parse {key}")))
}

fn config_error(msg: &str) -> PixelizeError {
    PixelizeError::Config(msg.to_string())
}

impl From<QuantizePolicy> for JsonValue {
    fn from(policy: QuantizePolicy) -> Self {
        JsonValue::String(policy.as_str().to_string())
    }
}

impl From<Rgb> for JsonValue {
    fn from(rgb: Rgb) -> Self {
        rgb.to_hex().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        assert_eq!(ProcessConfig::from_json("{}").unwrap(), ProcessConfig::default());
        let config = ProcessConfig::default();
        assert_eq!(config.downscale_factor, 2);
        assert_eq!(config.quantization_policy, QuantizePolicy::Flat);
        assert!(!config.suppress_upscale && !config.enable_chroma_key);
    }

    #[test]
    fn test_full_config() {
        let config = ProcessConfig::from_json(
            r##"{
                "downscale_factor": 4,
                "quantization_policy": "probabilistic",
                "suppress_upscale": true,
                "enable_chroma_key": true,
                "seed": 1234,
                "palette": ["#000000", "#ff004d"]
            }"##,
        )
        .unwrap();

        assert_eq!(config.downscale_factor, 4);
        assert_eq!(config.quantization_policy, QuantizePolicy::Probabilistic);
        assert!(config.suppress_upscale);
        assert!(config.enable_chroma_key);
        assert_eq!(config.seed, Some(1234));
        assert_eq!(
            config.palette,
            PaletteSource::Inline(vec![Rgb::BLACK, Rgb::new(255, 0, 77)])
        );
    }

    #[test]
    fn test_json_round_trip_keeps_palette_path() {
        let config = ProcessConfig {
            downscale_factor: 3,
            quantization_policy: QuantizePolicy::Ordered,
            palette: PaletteSource::File(PathBuf::from("palettes/pico8.csv")),
            ..Default::default()
        };
        assert_eq!(ProcessConfig::from_json(&config.to_json()).unwrap(), config);
    }

    #[test]
    fn test_non_positive_factor_is_invalid_argument() {
        for factor in ["0", "-2"] {
            let err = ProcessConfig::from_json(&format!("{{\"downscale_factor\": {factor}}}"))
                .unwrap_err();
            assert!(matches!(err, PixelizeError::InvalidArgument(_)), "{err}");
        }
        assert!(factor_from_i64(i64::from(u32::MAX) + 1).is_err());
        assert_eq!(factor_from_i64(5).unwrap(), 5);
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        for text in [
            r#"{"downscale_factor": "two"}"#,
            r#"{"suppress_upscale": 1}"#,
            r#"{"seed": -1}"#,
            r#"{"palette": "black"}"#,
            r#"{"palette": [1, 2]}"#,
            r##"{"palette": ["#00ff00", "#12345"]}"##,
            r##"{"palette": ["#gg0000"]}"##,
            r#"[]"#,
            r#"{ not json"#,
        ] {
            let err = ProcessConfig::from_json(text).unwrap_err();
            assert!(matches!(err, PixelizeError::Config(_)), "{text} -> {err}");
        }
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let err = ProcessConfig::from_json(r#"{"quantization_policy": "bayer"}"#).unwrap_err();
        assert!(matches!(err, PixelizeError::InvalidArgument(_)));
    }

    #[test]
    fn test_palette_sources_load() {
        assert_eq!(PaletteSource::Default.load().unwrap(), Palette::default());
        assert!(matches!(
            PaletteSource::Inline(Vec::new()).load(),
            Err(PixelizeError::InvalidArgument(_))
        ));
        assert!(matches!(
            PaletteSource::File(PathBuf::from("/definitely/not/here.csv")).load(),
            Err(PixelizeError::Io(_))
        ));
    }
}
