use std::collections::HashSet;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::color::ColorScheme;
use crate::error_codes::{CodedError, DUPLICATE_LABEL, EMPTY_LABEL, INVALID_SPEED, NO_GRIDS};
use crate::motion::{MotionKind, Orientation};

pub const DEFAULT_SCHEME: &str = "Viridis";
pub const DEFAULT_SPEED: f64 = 0.05;
pub const RECOMMENDED_SPEED_MAX: f64 = 0.1;

/// Process-wide parameters read by every grid on every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalParams {
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_speed")]
    pub speed: f64,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            speed: default_speed(),
        }
    }
}

fn default_scheme() -> String {
    DEFAULT_SCHEME.to_owned()
}

fn default_speed() -> f64 {
    DEFAULT_SPEED
}

impl GlobalParams {
    pub fn validate(&self) -> Result<()> {
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(anyhow!(CodedError::config(
                INVALID_SPEED,
                format!("speed must be a finite value >= 0, got {}", self.speed),
            )
            .with_details(json!({ "provided": self.speed }))));
        }

        if self.speed > RECOMMENDED_SPEED_MAX {
            warn!(
                speed = self.speed,
                max = RECOMMENDED_SPEED_MAX,
                "speed is above the recommended range"
            );
        }

        if self.color_scheme().is_none() {
            warn!(
                scheme = %self.scheme,
                "unknown colour scheme; cells will keep their previous colour"
            );
        }

        Ok(())
    }

    pub fn color_scheme(&self) -> Option<ColorScheme> {
        ColorScheme::from_name(&self.scheme)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridDescriptor {
    pub label: String,
    pub motion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
}

impl GridDescriptor {
    pub fn new(label: &str, motion: &str) -> Self {
        Self {
            label: label.to_owned(),
            motion: motion.to_owned(),
            orientation: None,
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation.keyword().to_owned());
        self
    }

    pub fn motion_kind(&self) -> MotionKind {
        MotionKind::resolve(&self.motion)
    }

    /// Parsed orientation keyword, `None` when omitted.
    pub fn orientation(&self) -> Result<Option<Orientation>> {
        self.orientation
            .as_deref()
            .map(Orientation::from_keyword)
            .transpose()
            .with_context(|| format!("grid '{}'", self.label))
    }

    /// Orientation after applying the motion's natural default.
    pub fn resolved_orientation(&self) -> Result<Orientation> {
        Ok(self
            .orientation()?
            .unwrap_or_else(|| self.motion_kind().natural_orientation()))
    }
}

/// Startup configuration: global parameters and the ordered grid list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridConfig {
    #[serde(default)]
    pub params: GlobalParams,
    pub grids: Vec<GridDescriptor>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            params: GlobalParams::default(),
            grids: vec![
                GridDescriptor::new("POLAR", "Polar"),
                GridDescriptor::new("TB FLOW", "TB Flow"),
                GridDescriptor::new("LR FLOW", "LR Flow"),
                GridDescriptor::new("ALT TB FLOW", "AltTBFlow"),
                GridDescriptor::new("ALT LR FLOW", "AltLRFlow")
                    .with_orientation(Orientation::RowMajor),
                GridDescriptor::new("ORTHOGONAL", "Orthogonal"),
                GridDescriptor::new("CIRCULATION", "Circulation"),
                GridDescriptor::new("BACK SLASH", "Scan"),
                GridDescriptor::new("SLASH", "Slash"),
                GridDescriptor::new("PULFUNTE", "Pulfunte"),
            ],
        }
    }
}

impl GridConfig {
    /// Reject malformed entries before any grid is built. Unknown motion
    /// names are accepted and logged; they animate with the fallback motion.
    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;

        if self.grids.is_empty() {
            return Err(anyhow!(CodedError::config(
                NO_GRIDS,
                "configuration must define at least one grid",
            )));
        }

        let mut seen = HashSet::with_capacity(self.grids.len());
        for (index, grid) in self.grids.iter().enumerate() {
            if grid.label.trim().is_empty() {
                return Err(anyhow!(CodedError::config(
                    EMPTY_LABEL,
                    format!("grid #{index} has an empty label"),
                )
                .with_details(json!({ "index": index }))));
            }

            if !seen.insert(grid.label.as_str()) {
                return Err(anyhow!(CodedError::config(
                    DUPLICATE_LABEL,
                    format!("duplicate grid label '{}'", grid.label),
                )
                .with_details(json!({ "index": index, "label": grid.label }))));
            }

            grid.orientation()?;

            if MotionKind::parse(&grid.motion).is_none() {
                warn!(
                    grid = %grid.label,
                    motion = %grid.motion,
                    "unknown motion; using the fallback motion"
                );
            }
        }

        Ok(())
    }
}
