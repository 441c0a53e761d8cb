//! Scalar-to-colour lookup for slice textures.
//!
//! Mapping is a pure function of `(sample, clim)`, so changing the color
//! limits only recolours an already extracted slice.

use std::collections::BTreeMap;

use glam::Vec3;

/// Evenly spaced colour stops, interpolated linearly.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    pub name: String,
    /// Stops from `t = 0` to `t = 1`.
    pub colors: Vec<Vec3>,
}

impl ColorMap {
    pub fn new(name: impl Into<String>, colors: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            colors,
        }
    }

    /// Colour at `t`, clamped to `[0, 1]`.
    pub fn sample(&self, t: f32) -> Vec3 {
        let Some((&last, _)) = self.colors.split_last() else {
            return Vec3::ZERO;
        };
        let segments = self.colors.len() - 1;
        if segments == 0 {
            return last;
        }
        let x = t.clamp(0.0, 1.0) * segments as f32;
        let lower = (x as usize).min(segments - 1);
        self.colors[lower].lerp(self.colors[lower + 1], x - lower as f32)
    }

    /// Maps one sample to RGBA8 within `clim = (min, max)`.
    ///
    /// Background (NaN) samples are fully transparent. A degenerate range maps
    /// everything to the middle of the map.
    pub fn map_value(&self, value: f32, clim: (f32, f32)) -> [u8; 4] {
        if value.is_nan() {
            return [0, 0, 0, 0];
        }
        let (lo, hi) = clim;
        let t = if (hi - lo).abs() > f32::EPSILON {
            (value - lo) / (hi - lo)
        } else {
            0.5
        };
        let c = self.sample(t) * 255.0;
        [
            c.x.round() as u8,
            c.y.round() as u8,
            c.z.round() as u8,
            255,
        ]
    }

    /// Maps a slice of samples into a packed RGBA8 buffer.
    pub fn map_into(&self, samples: &[f32], clim: (f32, f32), rgba: &mut Vec<u8>) {
        rgba.clear();
        rgba.reserve(samples.len() * 4);
        for &s in samples {
            rgba.extend_from_slice(&self.map_value(s, clim));
        }
    }
}

/// Named color maps, listed in name order.
#[derive(Debug, Default)]
pub struct ColorMapRegistry {
    maps: BTreeMap<String, ColorMap>,
}

impl ColorMapRegistry {
    /// A registry holding the built-in maps.
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_builtin();
        registry
    }

    fn register_builtin(&mut self) {
        self.register(ColorMap::new(
            "grays",
            vec![Vec3::ZERO, Vec3::ONE],
        ));

        // Blue-white-red, the usual choice for seismic amplitudes
        self.register(ColorMap::new(
            "seismic",
            vec![
                Vec3::new(0.0, 0.0, 0.3),
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(1.0, 1.0, 1.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.5, 0.0, 0.0),
            ],
        ));

        self.register(ColorMap::new(
            "viridis",
            vec![
                Vec3::new(0.267, 0.004, 0.329),
                Vec3::new(0.282, 0.140, 0.457),
                Vec3::new(0.253, 0.265, 0.529),
                Vec3::new(0.206, 0.371, 0.553),
                Vec3::new(0.163, 0.471, 0.558),
                Vec3::new(0.127, 0.566, 0.550),
                Vec3::new(0.134, 0.658, 0.517),
                Vec3::new(0.266, 0.749, 0.440),
                Vec3::new(0.477, 0.821, 0.318),
                Vec3::new(0.741, 0.873, 0.150),
                Vec3::new(0.993, 0.906, 0.144),
            ],
        ));

        self.register(ColorMap::new(
            "coolwarm",
            vec![
                Vec3::new(0.230, 0.299, 0.754),
                Vec3::new(0.552, 0.690, 0.996),
                Vec3::new(0.866, 0.866, 0.866),
                Vec3::new(0.956, 0.604, 0.486),
                Vec3::new(0.706, 0.016, 0.150),
            ],
        ));

        self.register(ColorMap::new(
            "rainbow",
            vec![
                Vec3::new(0.5, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(0.0, 1.0, 1.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
            ],
        ));
    }

    /// Adds a map, replacing any map with the same name.
    pub fn register(&mut self, map: ColorMap) {
        self.maps.insert(map.name.clone(), map);
    }

    pub fn get(&self, name: &str) -> Option<&ColorMap> {
        self.maps.get(name)
    }

    /// Looks a map up by name, falling back to `grays`.
    pub fn get_or_default(&self, name: &str) -> ColorMap {
        match self.get(name).or_else(|| self.get("grays")) {
            Some(map) => map.clone(),
            None => ColorMap::new("grays", vec![Vec3::ZERO, Vec3::ONE]),
        }
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }
}
