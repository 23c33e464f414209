//! Named colormaps
//!
//! Each map is a short table of control points interpolated linearly in RGB.
//! Values outside [0, 1] clamp to the endpoint colors.

use serde::{Deserialize, Serialize};

/// One control point: position in [0, 1] and an RGB color in [0, 1]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlPoint {
    pub pos: f32,
    pub rgb: [f32; 3],
}

const fn cp(pos: f32, r: f32, g: f32, b: f32) -> ControlPoint {
    ControlPoint { pos, rgb: [r, g, b] }
}

const VIRIDIS: &[ControlPoint] = &[
    cp(0.0, 0.267, 0.005, 0.329),
    cp(0.25, 0.283, 0.141, 0.458),
    cp(0.5, 0.128, 0.567, 0.551),
    cp(0.75, 0.369, 0.788, 0.383),
    cp(1.0, 0.993, 0.906, 0.144),
];

const PLASMA: &[ControlPoint] = &[
    cp(0.0, 0.051, 0.029, 0.528),
    cp(0.25, 0.507, 0.006, 0.658),
    cp(0.5, 0.849, 0.203, 0.478),
    cp(0.75, 0.966, 0.544, 0.235),
    cp(1.0, 0.940, 0.976, 0.131),
];

const INFERNO: &[ControlPoint] = &[
    cp(0.0, 0.001, 0.000, 0.014),
    cp(0.25, 0.258, 0.039, 0.407),
    cp(0.5, 0.610, 0.157, 0.379),
    cp(0.75, 0.941, 0.459, 0.153),
    cp(1.0, 0.988, 0.998, 0.645),
];

const MAGMA: &[ControlPoint] = &[
    cp(0.0, 0.001, 0.000, 0.014),
    cp(0.25, 0.282, 0.088, 0.472),
    cp(0.5, 0.717, 0.215, 0.475),
    cp(0.75, 0.989, 0.527, 0.384),
    cp(1.0, 0.987, 0.991, 0.750),
];

// black, red, yellow, white
const HOT: &[ControlPoint] = &[
    cp(0.0, 0.0, 0.0, 0.0),
    cp(0.375, 1.0, 0.0, 0.0),
    cp(0.75, 1.0, 1.0, 0.0),
    cp(1.0, 1.0, 1.0, 1.0),
];

const COOL: &[ControlPoint] = &[
    cp(0.0, 0.0, 1.0, 1.0),
    cp(0.5, 0.5, 0.5, 1.0),
    cp(1.0, 1.0, 0.0, 1.0),
];

const JET: &[ControlPoint] = &[
    cp(0.0, 0.0, 0.0, 0.5),
    cp(0.125, 0.0, 0.0, 1.0),
    cp(0.375, 0.0, 1.0, 1.0),
    cp(0.625, 1.0, 1.0, 0.0),
    cp(0.875, 1.0, 0.0, 0.0),
    cp(1.0, 0.5, 0.0, 0.0),
];

const TURBO: &[ControlPoint] = &[
    cp(0.0, 0.19, 0.07, 0.23),
    cp(0.13, 0.09, 0.44, 0.71),
    cp(0.25, 0.11, 0.64, 0.85),
    cp(0.38, 0.25, 0.83, 0.78),
    cp(0.50, 0.52, 0.90, 0.52),
    cp(0.63, 0.83, 0.89, 0.21),
    cp(0.75, 0.99, 0.72, 0.15),
    cp(0.88, 0.99, 0.38, 0.12),
    cp(1.0, 0.90, 0.15, 0.12),
];

const OCEAN: &[ControlPoint] = &[
    cp(0.0, 0.0, 0.5, 0.0),
    cp(0.5, 0.0, 0.5, 1.0),
    cp(1.0, 1.0, 1.0, 1.0),
];

// violet through red; stops short of wrapping back to violet
const RAINBOW: &[ControlPoint] = &[
    cp(0.0, 0.5, 0.0, 1.0),
    cp(0.16, 0.0, 0.0, 1.0),
    cp(0.33, 0.0, 1.0, 1.0),
    cp(0.50, 0.0, 1.0, 0.0),
    cp(0.66, 1.0, 1.0, 0.0),
    cp(0.83, 1.0, 0.5, 0.0),
    cp(1.0, 1.0, 0.0, 0.0),
];

const GRAYSCALE: &[ControlPoint] = &[cp(0.0, 0.0, 0.0, 0.0), cp(1.0, 1.0, 1.0, 1.0)];

const ICE: &[ControlPoint] = &[
    cp(0.0, 0.0, 0.0, 0.2),
    cp(0.5, 0.0, 0.5, 1.0),
    cp(1.0, 1.0, 1.0, 1.0),
];

const FIRE: &[ControlPoint] = &[
    cp(0.0, 0.0, 0.0, 0.0),
    cp(0.33, 0.5, 0.0, 0.0),
    cp(0.66, 1.0, 0.5, 0.0),
    cp(1.0, 1.0, 1.0, 0.5),
];

const SEISMIC: &[ControlPoint] = &[
    cp(0.0, 0.0, 0.0, 0.3),
    cp(0.25, 0.0, 0.0, 1.0),
    cp(0.5, 1.0, 1.0, 1.0),
    cp(0.75, 1.0, 0.0, 0.0),
    cp(1.0, 0.5, 0.0, 0.0),
];

const TWILIGHT: &[ControlPoint] = &[
    cp(0.0, 0.886, 0.859, 0.937),
    cp(0.25, 0.329, 0.153, 0.533),
    cp(0.5, 0.051, 0.039, 0.090),
    cp(0.75, 0.345, 0.537, 0.686),
    cp(1.0, 0.886, 0.859, 0.937),
];

const CIVIDIS: &[ControlPoint] = &[
    cp(0.0, 0.0, 0.135, 0.304),
    cp(0.25, 0.184, 0.310, 0.424),
    cp(0.5, 0.467, 0.479, 0.408),
    cp(0.75, 0.796, 0.674, 0.424),
    cp(1.0, 0.992, 0.906, 0.574),
];

/// Available colormaps
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Colormap {
    Viridis,
    Plasma,
    #[default]
    Inferno,
    Magma,
    Hot,
    Cool,
    Jet,
    Turbo,
    Ocean,
    Rainbow,
    Grayscale,
    Ice,
    Fire,
    Seismic,
    Twilight,
    Cividis,
}

impl Colormap {
    pub const ALL: [Colormap; 16] = [
        Colormap::Viridis,
        Colormap::Plasma,
        Colormap::Inferno,
        Colormap::Magma,
        Colormap::Hot,
        Colormap::Cool,
        Colormap::Jet,
        Colormap::Turbo,
        Colormap::Ocean,
        Colormap::Rainbow,
        Colormap::Grayscale,
        Colormap::Ice,
        Colormap::Fire,
        Colormap::Seismic,
        Colormap::Twilight,
        Colormap::Cividis,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Colormap::Viridis => "Viridis",
            Colormap::Plasma => "Plasma",
            Colormap::Inferno => "Inferno",
            Colormap::Magma => "Magma",
            Colormap::Hot => "Hot",
            Colormap::Cool => "Cool",
            Colormap::Jet => "Jet",
            Colormap::Turbo => "Turbo",
            Colormap::Ocean => "Ocean",
            Colormap::Rainbow => "Rainbow",
            Colormap::Grayscale => "Grayscale",
            Colormap::Ice => "Ice",
            Colormap::Fire => "Fire",
            Colormap::Seismic => "Seismic",
            Colormap::Twilight => "Twilight",
            Colormap::Cividis => "Cividis",
        }
    }

    /// Control-point table, sorted by position
    pub fn points(&self) -> &'static [ControlPoint] {
        match self {
            Colormap::Viridis => VIRIDIS,
            Colormap::Plasma => PLASMA,
            Colormap::Inferno => INFERNO,
            Colormap::Magma => MAGMA,
            Colormap::Hot => HOT,
            Colormap::Cool => COOL,
            Colormap::Jet => JET,
            Colormap::Turbo => TURBO,
            Colormap::Ocean => OCEAN,
            Colormap::Rainbow => RAINBOW,
            Colormap::Grayscale => GRAYSCALE,
            Colormap::Ice => ICE,
            Colormap::Fire => FIRE,
            Colormap::Seismic => SEISMIC,
            Colormap::Twilight => TWILIGHT,
            Colormap::Cividis => CIVIDIS,
        }
    }

    /// Interpolated RGB at `value`, clamped to [0, 1]
    pub fn color_at(&self, value: f32) -> [f32; 3] {
        let points = self.points();
        let v = value.clamp(0.0, 1.0);

        let first = points[0];
        let last = points[points.len() - 1];
        if v <= first.pos {
            return first.rgb;
        }
        if v >= last.pos {
            return last.rgb;
        }

        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if v >= a.pos && v <= b.pos {
                let t = (v - a.pos) / (b.pos - a.pos);
                return [
                    a.rgb[0] + t * (b.rgb[0] - a.rgb[0]),
                    a.rgb[1] + t * (b.rgb[1] - a.rgb[1]),
                    a.rgb[2] + t * (b.rgb[2] - a.rgb[2]),
                ];
            }
        }
        last.rgb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_exact() {
        for map in Colormap::ALL {
            let points = map.points();
            assert_eq!(map.color_at(0.0), points[0].rgb, "{}", map.name());
            assert_eq!(map.color_at(1.0), points[points.len() - 1].rgb, "{}", map.name());
        }
    }

    #[test]
    fn test_out_of_range_clamps() {
        for map in Colormap::ALL {
            assert_eq!(map.color_at(-3.0), map.color_at(0.0));
            assert_eq!(map.color_at(7.5), map.color_at(1.0));
        }
    }

    #[test]
    fn test_tables_sorted_and_span_unit_range() {
        for map in Colormap::ALL {
            let points = map.points();
            assert!(points.len() >= 2);
            assert_eq!(points[0].pos, 0.0);
            assert_eq!(points[points.len() - 1].pos, 1.0);
            for pair in points.windows(2) {
                assert!(pair[1].pos > pair[0].pos);
            }
        }
    }

    #[test]
    fn test_midpoint_interpolation() {
        let c = Colormap::Grayscale.color_at(0.5);
        for ch in c {
            assert!((ch - 0.5).abs() < 1e-6);
        }
        // Exactly on an interior control point
        assert_eq!(Colormap::Hot.color_at(0.375), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_names_unique() {
        let mut names: Vec<_> = Colormap::ALL.iter().map(|m| m.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Colormap::ALL.len());
    }
}
