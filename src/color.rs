use serde::Serialize;

use crate::math::{remap, remap_clamped};
use crate::motion::MotionKind;

/// Canonical intensity band consumed by the colour mapping stage.
pub const COLOR_BAND_MIN: f64 = 0.3;
pub const COLOR_BAND_MAX: f64 = 2.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorNormalizationRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ColorNormalizationRange {
    fn default() -> Self {
        Self {
            min: COLOR_BAND_MIN,
            max: COLOR_BAND_MAX,
        }
    }
}

impl ColorNormalizationRange {
    /// Range override for motions whose weight products overshoot the
    /// canonical band.
    pub fn override_for(kind: MotionKind) -> Option<Self> {
        let (min, max) = match kind {
            MotionKind::Circulation => (1.0, 10.0),
            MotionKind::Scan | MotionKind::Slash => (1.0, 20.0),
            MotionKind::Pulfunte => (1.0, 30.0),
            _ => return None,
        };
        Some(Self { min, max })
    }

    pub fn for_motion(kind: MotionKind) -> Self {
        Self::override_for(kind).unwrap_or_default()
    }
}

/// Rescale a raw area product into the canonical band. Motions without an
/// override pass through unchanged. No clamping happens here.
pub fn normalize_intensity(kind: MotionKind, raw: f64) -> f64 {
    match ColorNormalizationRange::override_for(kind) {
        Some(range) => remap(raw, range.min, range.max, COLOR_BAND_MIN, COLOR_BAND_MAX),
        None => raw,
    }
}

/// Map a canonical-band intensity to the `[0, 1]` gradient parameter,
/// saturating at both ends.
pub fn color_parameter(intensity: f64) -> f64 {
    remap_clamped(intensity, COLOR_BAND_MIN, COLOR_BAND_MAX, 0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColorScheme {
    Greys,
    Viridis,
    Magma,
    Inferno,
    Plasma,
    Cividis,
    Turbo,
    Cool,
    Warm,
    Blues,
    Greens,
    Oranges,
    Purples,
    Reds,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 14] = [
        Self::Greys,
        Self::Viridis,
        Self::Magma,
        Self::Inferno,
        Self::Plasma,
        Self::Cividis,
        Self::Turbo,
        Self::Cool,
        Self::Warm,
        Self::Blues,
        Self::Greens,
        Self::Oranges,
        Self::Purples,
        Self::Reds,
    ];

    /// Exact, case-sensitive scheme name lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|scheme| scheme.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Greys => "Greys",
            Self::Viridis => "Viridis",
            Self::Magma => "Magma",
            Self::Inferno => "Inferno",
            Self::Plasma => "Plasma",
            Self::Cividis => "Cividis",
            Self::Turbo => "Turbo",
            Self::Cool => "Cool",
            Self::Warm => "Warm",
            Self::Blues => "Blues",
            Self::Greens => "Greens",
            Self::Oranges => "Oranges",
            Self::Purples => "Purples",
            Self::Reds => "Reds",
        }
    }

    fn gradient(self) -> colorous::Gradient {
        match self {
            Self::Greys => colorous::GREYS,
            Self::Viridis => colorous::VIRIDIS,
            Self::Magma => colorous::MAGMA,
            Self::Inferno => colorous::INFERNO,
            Self::Plasma => colorous::PLASMA,
            Self::Cividis => colorous::CIVIDIS,
            Self::Turbo => colorous::TURBO,
            Self::Cool => colorous::COOL,
            Self::Warm => colorous::WARM,
            Self::Blues => colorous::BLUES,
            Self::Greens => colorous::GREENS,
            Self::Oranges => colorous::ORANGES,
            Self::Purples => colorous::PURPLES,
            Self::Reds => colorous::REDS,
        }
    }

    pub fn eval(self, t: f64) -> Rgb {
        let color = self.gradient().eval_continuous(t.clamp(0.0, 1.0));
        Rgb {
            r: color.r,
            g: color.g,
            b: color.b,
        }
    }
}

/// Colour for `t` in the named scheme, or `None` if the name is unknown.
pub fn lookup(scheme_name: &str, t: f64) -> Option<Rgb> {
    ColorScheme::from_name(scheme_name).map(|scheme| scheme.eval(t))
}
