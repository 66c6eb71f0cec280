use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::json;

use crate::error_codes::{CodedError, INVALID_ORIENTATION};

/// Cells per axis. Every weight vector has this many entries.
pub const GRID_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MotionKind {
    Orthogonal,
    Polar,
    #[serde(rename = "TBFlow")]
    TbFlow,
    #[serde(rename = "LRFlow")]
    LrFlow,
    #[serde(rename = "AltTBFlow")]
    AltTbFlow,
    #[serde(rename = "AltLRFlow")]
    AltLrFlow,
    Circulation,
    Pulfunte,
    Noise,
    Scan,
    Slash,
    Wave,
    Breath,
    /// Generic sinusoidal field used for any unrecognised motion name.
    Fallback,
}

impl MotionKind {
    pub const ALL: [MotionKind; 14] = [
        Self::Orthogonal,
        Self::Polar,
        Self::TbFlow,
        Self::LrFlow,
        Self::AltTbFlow,
        Self::AltLrFlow,
        Self::Circulation,
        Self::Pulfunte,
        Self::Noise,
        Self::Scan,
        Self::Slash,
        Self::Wave,
        Self::Breath,
        Self::Fallback,
    ];

    /// Resolve a configured motion name. Matching ignores case, spaces,
    /// `-` and `_`, so `"TB Flow"` and `"TBFlow"` name the same motion.
    /// Returns `None` for names with no registered motion.
    pub fn parse(name: &str) -> Option<Self> {
        let key = name
            .chars()
            .filter(|ch| !matches!(ch, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        let kind = match key.as_str() {
            "orthogonal" => Self::Orthogonal,
            "polar" => Self::Polar,
            "tbflow" => Self::TbFlow,
            "lrflow" => Self::LrFlow,
            "alttbflow" => Self::AltTbFlow,
            "altlrflow" => Self::AltLrFlow,
            "circulation" => Self::Circulation,
            "pulfunte" => Self::Pulfunte,
            "noise" => Self::Noise,
            "scan" => Self::Scan,
            "slash" => Self::Slash,
            "wave" => Self::Wave,
            "breath" => Self::Breath,
            _ => return None,
        };
        Some(kind)
    }

    /// Like [`MotionKind::parse`] but total: unknown names become [`MotionKind::Fallback`].
    pub fn resolve(name: &str) -> Self {
        Self::parse(name).unwrap_or(Self::Fallback)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Orthogonal => "Orthogonal",
            Self::Polar => "Polar",
            Self::TbFlow => "TBFlow",
            Self::LrFlow => "LRFlow",
            Self::AltTbFlow => "AltTBFlow",
            Self::AltLrFlow => "AltLRFlow",
            Self::Circulation => "Circulation",
            Self::Pulfunte => "Pulfunte",
            Self::Noise => "Noise",
            Self::Scan => "Scan",
            Self::Slash => "Slash",
            Self::Wave => "Wave",
            Self::Breath => "Breath",
            Self::Fallback => "Fallback",
        }
    }

    /// Orientation used when a grid descriptor does not name one.
    pub fn natural_orientation(self) -> Orientation {
        match self {
            Self::AltLrFlow => Orientation::RowMajor,
            _ => Orientation::ColumnMajor,
        }
    }

    /// The only orientation this motion can be projected in, if it is restricted.
    pub fn required_orientation(self) -> Option<Orientation> {
        match self {
            Self::AltTbFlow => Some(Orientation::ColumnMajor),
            Self::AltLrFlow => Some(Orientation::RowMajor),
            _ => None,
        }
    }
}

/// Which axis carries the global weights.
///
/// Column-major: global column widths, row heights computed per column.
/// Row-major: global row heights, column widths computed per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    ColumnMajor,
    RowMajor,
}

impl Orientation {
    pub fn from_keyword(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "col" | "column" | "column_major" | "col_major" | "column-major" => {
                Ok(Self::ColumnMajor)
            }
            "row" | "row_major" | "row-major" => Ok(Self::RowMajor),
            _ => Err(anyhow!(CodedError::usage(
                INVALID_ORIENTATION,
                format!("invalid orientation '{value}'"),
            )
            .with_details(json!({
                "provided": value,
                "allowed": ["col", "row"]
            })))),
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::ColumnMajor => "col",
            Self::RowMajor => "row",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MotionKind, Orientation};
    use crate::error_codes::{find_coded_error, INVALID_ORIENTATION};

    #[test]
    fn parse_accepts_spaced_aliases_and_case() {
        assert_eq!(MotionKind::parse("TB Flow"), Some(MotionKind::TbFlow));
        assert_eq!(MotionKind::parse("LR Flow"), Some(MotionKind::LrFlow));
        assert_eq!(MotionKind::parse("alttbflow"), Some(MotionKind::AltTbFlow));
        assert_eq!(MotionKind::parse("Alt-LR_Flow"), Some(MotionKind::AltLrFlow));
        assert_eq!(MotionKind::parse("Spiral"), None);
    }

    #[test]
    fn unknown_names_resolve_to_fallback() {
        assert_eq!(MotionKind::resolve("Spiral"), MotionKind::Fallback);
        assert_eq!(MotionKind::resolve(""), MotionKind::Fallback);
    }

    #[test]
    fn canonical_names_round_trip_through_parse() {
        for kind in MotionKind::ALL {
            if kind == MotionKind::Fallback {
                continue;
            }
            assert_eq!(MotionKind::parse(kind.name()), Some(kind));
        }
    }

    #[test]
    fn only_alt_lr_flow_is_naturally_row_major() {
        for kind in MotionKind::ALL {
            let expected = if kind == MotionKind::AltLrFlow {
                Orientation::RowMajor
            } else {
                Orientation::ColumnMajor
            };
            assert_eq!(kind.natural_orientation(), expected, "{}", kind.name());
        }
    }

    #[test]
    fn orientation_keywords() {
        assert_eq!(
            Orientation::from_keyword(" Row ").expect("row should parse"),
            Orientation::RowMajor
        );
        assert_eq!(
            Orientation::from_keyword("column_major").expect("column should parse"),
            Orientation::ColumnMajor
        );
        let error = Orientation::from_keyword("diagonal").expect_err("should reject");
        assert_eq!(
            find_coded_error(&error).map(|coded| coded.code),
            Some(INVALID_ORIENTATION)
        );
    }
}
