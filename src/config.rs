//! Cache settings for the demo, tunable from the environment.
//!
//! - `GLYPHS_SMALL_CACHE` / `GLYPHS_LARGE_CACHE`: `WIDTHxHEIGHT`
//! - `GLYPHS_GAMMA`: gamma applied to alpha glyphs
//! - `GLYPHS_CPU_PIXEL_BUFFERS`: stage glyphs in CPU memory (`1`/`true`)

use glyph_cache::{CacheConfig, GammaTable};

pub const SMALL_CACHE_VAR: &str = "GLYPHS_SMALL_CACHE";
pub const LARGE_CACHE_VAR: &str = "GLYPHS_LARGE_CACHE";
pub const GAMMA_VAR: &str = "GLYPHS_GAMMA";
pub const CPU_PIXEL_BUFFERS_VAR: &str = "GLYPHS_CPU_PIXEL_BUFFERS";

/// Settings of one demo run.
#[derive(Clone, Debug)]
pub struct DemoConfig {
    pub cache: CacheConfig,
    /// Size of the offscreen target text is drawn into.
    pub target_size: [u32; 2],
    /// Blur radius of the drop shadow, in pixels.
    pub shadow_radius: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            target_size: [800, 600],
            shadow_radius: 4.0,
        }
    }
}

impl DemoConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Apply overrides returned by `lookup`. Unparsable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some([w, h]) = parse_var(&lookup, SMALL_CACHE_VAR, parse_size) {
            config.cache = config.cache.with_small_cache(w, h);
        }
        if let Some([w, h]) = parse_var(&lookup, LARGE_CACHE_VAR, parse_size) {
            config.cache = config.cache.with_large_cache(w, h);
        }
        if let Some(gamma) = parse_var(&lookup, GAMMA_VAR, parse_gamma) {
            config.cache = config.cache.with_gamma(GammaTable::from_gamma(gamma));
        }
        if let Some(cpu) = parse_var(&lookup, CPU_PIXEL_BUFFERS_VAR, parse_bool) {
            config.cache = config.cache.with_gpu_pixel_buffers(!cpu);
        }

        config
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    parse: fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = lookup(name)?;
    let value = parse(raw.trim());
    if value.is_none() {
        log::warn!("Ignoring {name}={raw:?}: unrecognized value");
    }
    value
}

fn parse_size(value: &str) -> Option<[u32; 2]> {
    let (w, h) = value.split_once(['x', 'X'])?;
    let w = w.trim().parse::<u32>().ok()?;
    let h = h.trim().parse::<u32>().ok()?;
    (w > 0 && h > 0).then_some([w, h])
}

fn parse_gamma(value: &str) -> Option<f32> {
    value
        .parse::<f32>()
        .ok()
        .filter(|gamma| gamma.is_finite() && *gamma > 0.0)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn no_overrides_keeps_defaults() {
        let config = DemoConfig::from_lookup(|_| None);
        assert_eq!(config.cache.small_cache, [1024, 512]);
        assert_eq!(config.cache.large_cache, [2048, 512]);
        assert!(config.cache.gamma_table.is_none());
        assert!(config.cache.gpu_pixel_buffers);
    }

    #[test]
    fn overrides_are_applied() {
        let vars = [
            (SMALL_CACHE_VAR, "256x128"),
            (LARGE_CACHE_VAR, " 512X256 "),
            (GAMMA_VAR, "1.8"),
            (CPU_PIXEL_BUFFERS_VAR, "true"),
        ];
        let config = DemoConfig::from_lookup(lookup(&vars));
        assert_eq!(config.cache.small_cache, [256, 128]);
        assert_eq!(config.cache.large_cache, [512, 256]);
        assert!(config.cache.gamma_table.is_some());
        assert!(!config.cache.gpu_pixel_buffers);
    }

    #[test]
    fn bad_values_are_ignored() {
        let vars = [
            (SMALL_CACHE_VAR, "wide"),
            (LARGE_CACHE_VAR, "0x512"),
            (GAMMA_VAR, "-2"),
            (CPU_PIXEL_BUFFERS_VAR, "maybe"),
        ];
        let config = DemoConfig::from_lookup(lookup(&vars));
        assert_eq!(config.cache.small_cache, [1024, 512]);
        assert_eq!(config.cache.large_cache, [2048, 512]);
        assert!(config.cache.gamma_table.is_none());
        assert!(config.cache.gpu_pixel_buffers);
    }
}
