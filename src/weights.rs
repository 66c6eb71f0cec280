//! Per-motion weight generation.
//!
//! Every motion maps an accumulated time value to one [`WeightVector`] per
//! axis. Entries are `baseline + non-negative term` with a positive
//! baseline, so totals are always positive and percentages never divide by
//! zero. The alternating flows additionally override the inner axis per
//! stripe through [`local_weights`].

use std::f64::consts::PI;

use noise::{NoiseFn, Perlin};
use serde::Serialize;

use crate::math::{gaussian_weight, pseudo_random, remap, smoothstep};
use crate::motion::{MotionKind, GRID_SIZE};

const BASELINE: f64 = 1.0;

const AMPLITUDE_STRONG: f64 = 0.6;
const AMPLITUDE_GENTLE: f64 = 0.3;
const AMPLITUDE_PEAK: f64 = 4.0;
const AMPLITUDE_INTENSE: f64 = 5.0;

const PHASE_SLOW: f64 = 1.5;
const PHASE_NORMAL: f64 = 2.0;
const PHASE_FAST: f64 = 2.5;

const FALLOFF_GENTLE: f64 = 0.4;
const FALLOFF_NORMAL: f64 = 0.5;
const FALLOFF_SHARP: f64 = 1.5;

const CIRCULATION_RADIUS: f64 = 2.5;
const CIRCULATION_CENTER: f64 = 2.0;
const CIRCULATION_ORBIT_SPEED: f64 = 0.5;

const PULFUNTE_STEP_DURATION: f64 = 1.0;
const PULFUNTE_ROW_SEED: f64 = 123.456;
const PULFUNTE_COL_SEED: f64 = 789.012;

pub const DIAGONAL_CYCLE_LENGTH: f64 = 6.0;
pub const DIAGONAL_PHASE_SPEED: f64 = 1.5;
pub const DIAGONAL_PHASE_OFFSET: f64 = 0.5;

const NOISE_SEED: u32 = 0;
const NOISE_TIME_SPEED: f64 = 0.5;
const NOISE_SPATIAL_STRIDE: f64 = 10.0;
const NOISE_AXIS_OFFSET: f64 = 100.0;
const NOISE_WEIGHT_MIN: f64 = 0.4;
const NOISE_WEIGHT_MAX: f64 = 2.0;

/// `GRID_SIZE` positive weights and their sum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightVector {
    values: [f64; GRID_SIZE],
    total: f64,
}

impl WeightVector {
    pub fn from_fn(mut weight: impl FnMut(usize) -> f64) -> Self {
        let mut values = [0.0; GRID_SIZE];
        for (index, value) in values.iter_mut().enumerate() {
            *value = weight(index);
        }
        Self::from_values(values)
    }

    pub fn from_values(values: [f64; GRID_SIZE]) -> Self {
        let total = values.iter().sum();
        Self { values, total }
    }

    pub fn uniform(value: f64) -> Self {
        Self::from_values([value; GRID_SIZE])
    }

    pub fn values(&self) -> &[f64; GRID_SIZE] {
        &self.values
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn get(&self, index: usize) -> f64 {
        self.values[index]
    }

    /// Share of each entry as a percentage of the total.
    pub fn percentages(&self) -> [f64; GRID_SIZE] {
        self.values.map(|value| value / self.total * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisWeights {
    pub rows: WeightVector,
    pub cols: WeightVector,
}

/// Continuous `(row, col)` centre of a Gaussian field. May lie off-grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FocusPoint {
    pub row: f64,
    pub col: f64,
}

/// Last Pulfunte field, rewritten in full on every evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct PulfunteCache {
    field: [[f64; GRID_SIZE]; GRID_SIZE],
}

impl Default for PulfunteCache {
    fn default() -> Self {
        Self {
            field: [[BASELINE; GRID_SIZE]; GRID_SIZE],
        }
    }
}

impl PulfunteCache {
    pub fn field(&self) -> &[[f64; GRID_SIZE]; GRID_SIZE] {
        &self.field
    }

    fn fill(&mut self, focus: FocusPoint) {
        for (row, cells) in self.field.iter_mut().enumerate() {
            for (col, cell) in cells.iter_mut().enumerate() {
                let dr = row as f64 - focus.row;
                let dc = col as f64 - focus.col;
                let distance = (dr * dr + dc * dc).sqrt();
                *cell = gaussian_weight(distance, AMPLITUDE_INTENSE, FALLOFF_GENTLE, BASELINE);
            }
        }
    }

    fn row_max(&self, row: usize) -> f64 {
        self.field[row].iter().copied().fold(f64::MIN, f64::max)
    }

    fn col_max(&self, col: usize) -> f64 {
        self.field
            .iter()
            .map(|cells| cells[col])
            .fold(f64::MIN, f64::max)
    }
}

/// Per-instance data some motions carry between frames.
#[derive(Debug, Clone)]
pub enum MotionState {
    Stateless,
    Pulfunte(PulfunteCache),
    Noise(Perlin),
}

impl MotionState {
    pub fn for_kind(kind: MotionKind) -> Self {
        match kind {
            MotionKind::Pulfunte => Self::Pulfunte(PulfunteCache::default()),
            MotionKind::Noise => Self::Noise(Perlin::new(NOISE_SEED)),
            _ => Self::Stateless,
        }
    }

    pub fn pulfunte_cache(&self) -> Option<&PulfunteCache> {
        match self {
            Self::Pulfunte(cache) => Some(cache),
            _ => None,
        }
    }

    fn pulfunte_cache_mut(&mut self) -> &mut PulfunteCache {
        if !matches!(self, Self::Pulfunte(_)) {
            *self = Self::Pulfunte(PulfunteCache::default());
        }
        match self {
            Self::Pulfunte(cache) => cache,
            _ => unreachable!("state was just replaced with a pulfunte cache"),
        }
    }

    fn noise(&mut self) -> &Perlin {
        if !matches!(self, Self::Noise(_)) {
            *self = Self::Noise(Perlin::new(NOISE_SEED));
        }
        match self {
            Self::Noise(perlin) => perlin,
            _ => unreachable!("state was just replaced with a noise source"),
        }
    }
}

/// Global row and column weights for `kind` at time `t`.
pub fn compute_weights(kind: MotionKind, t: f64, state: &mut MotionState) -> AxisWeights {
    match kind {
        MotionKind::Orthogonal => orthogonal(t),
        MotionKind::Polar => polar(t),
        MotionKind::TbFlow => tb_flow(t),
        MotionKind::LrFlow => lr_flow(t),
        MotionKind::AltTbFlow => alt_tb_flow(t),
        MotionKind::AltLrFlow => alt_lr_flow(),
        MotionKind::Circulation => circulation(t),
        MotionKind::Pulfunte => pulfunte(t, state.pulfunte_cache_mut()),
        MotionKind::Noise => noise_field(t, state.noise()),
        MotionKind::Scan => diagonal(t, DiagonalDirection::Forward),
        MotionKind::Slash => diagonal(t, DiagonalDirection::Reverse),
        MotionKind::Wave => wave(t),
        MotionKind::Breath => breath(t),
        MotionKind::Fallback => fallback(t),
    }
}

/// Inner-axis weights recomputed for one stripe, or `None` when the stripe
/// shares the global inner-axis weights.
///
/// For AltTBFlow the stripe is a column and the result replaces the row
/// weights; for AltLRFlow the stripe is a row and the result replaces the
/// column weights.
pub fn local_weights(kind: MotionKind, t: f64, stripe: usize) -> Option<WeightVector> {
    match kind {
        MotionKind::AltTbFlow | MotionKind::AltLrFlow => Some(alternating_stripe(t, stripe)),
        _ => None,
    }
}

/// Even stripes travel toward higher indices, odd stripes toward lower ones.
pub fn alternating_stripe(t: f64, stripe: usize) -> WeightVector {
    let direction = if stripe % 2 == 0 { -1.0 } else { 1.0 };
    WeightVector::from_fn(|i| {
        sine_weight(
            AMPLITUDE_STRONG,
            t * PHASE_NORMAL + direction * i as f64 * 0.8,
        )
    })
}

fn sine_weight(amplitude: f64, phase: f64) -> f64 {
    BASELINE + amplitude * phase.sin()
}

fn orthogonal(t: f64) -> AxisWeights {
    let axis = WeightVector::from_fn(|i| {
        sine_weight(AMPLITUDE_STRONG, t * PHASE_SLOW + i as f64 * 0.8)
    });
    AxisWeights {
        rows: axis.clone(),
        cols: axis,
    }
}

fn polar(t: f64) -> AxisWeights {
    let center = (GRID_SIZE / 2) as f64;
    let axis = WeightVector::from_fn(|i| {
        let distance = (i as f64 - center).abs();
        sine_weight(AMPLITUDE_STRONG, t * PHASE_NORMAL - distance)
    });
    AxisWeights {
        rows: axis.clone(),
        cols: axis,
    }
}

fn strong_flow(t: f64) -> WeightVector {
    WeightVector::from_fn(|i| sine_weight(AMPLITUDE_STRONG, t * PHASE_NORMAL - i as f64 * 0.8))
}

fn gentle_breathing(t: f64) -> WeightVector {
    WeightVector::from_fn(|i| sine_weight(AMPLITUDE_GENTLE, t * PHASE_SLOW + i as f64 * 0.2))
}

fn tb_flow(t: f64) -> AxisWeights {
    AxisWeights {
        rows: strong_flow(t),
        cols: gentle_breathing(t),
    }
}

fn lr_flow(t: f64) -> AxisWeights {
    AxisWeights {
        rows: gentle_breathing(t),
        cols: strong_flow(t),
    }
}

// Row weights are replaced per column by `local_weights`.
fn alt_tb_flow(t: f64) -> AxisWeights {
    AxisWeights {
        rows: WeightVector::uniform(BASELINE),
        cols: gentle_breathing(t),
    }
}

// Fixed row heights; column weights are replaced per row by `local_weights`.
fn alt_lr_flow() -> AxisWeights {
    AxisWeights {
        rows: WeightVector::uniform(BASELINE),
        cols: WeightVector::uniform(BASELINE),
    }
}

/// Clockwise orbit around the grid centre, starting near the top-left.
pub fn circulation_focus(t: f64) -> FocusPoint {
    let angle = t * CIRCULATION_ORBIT_SPEED - PI * 0.75;
    FocusPoint {
        row: CIRCULATION_CENTER + CIRCULATION_RADIUS * angle.sin(),
        col: CIRCULATION_CENTER + CIRCULATION_RADIUS * angle.cos(),
    }
}

fn circulation(t: f64) -> AxisWeights {
    let focus = circulation_focus(t);
    AxisWeights {
        rows: WeightVector::from_fn(|r| {
            gaussian_weight(r as f64 - focus.row, AMPLITUDE_PEAK, FALLOFF_NORMAL, BASELINE)
        }),
        cols: WeightVector::from_fn(|c| {
            gaussian_weight(c as f64 - focus.col, AMPLITUDE_PEAK, FALLOFF_NORMAL, BASELINE)
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PulfunteFocus {
    pub step: f64,
    pub progress: f64,
    pub current: FocusPoint,
    pub next: FocusPoint,
    pub focus: FocusPoint,
}

fn pulfunte_cell(step: f64) -> FocusPoint {
    let size = GRID_SIZE as f64;
    FocusPoint {
        row: (pseudo_random(step * PULFUNTE_ROW_SEED) * size).floor(),
        col: (pseudo_random(step * PULFUNTE_COL_SEED) * size).floor(),
    }
}

/// Focus cell for the current step eased toward the next step's cell.
pub fn pulfunte_focus(t: f64) -> PulfunteFocus {
    let scaled = t * PULFUNTE_STEP_DURATION;
    let step = scaled.floor();
    let progress = scaled - step;
    let current = pulfunte_cell(step);
    let next = pulfunte_cell(step + 1.0);
    let ease = smoothstep(progress);
    PulfunteFocus {
        step,
        progress,
        current,
        next,
        focus: FocusPoint {
            row: current.row + (next.row - current.row) * ease,
            col: current.col + (next.col - current.col) * ease,
        },
    }
}

// Axis weights take the per-row / per-column maximum of the field so the
// single 2-D peak dominates both its row and its column.
fn pulfunte(t: f64, cache: &mut PulfunteCache) -> AxisWeights {
    cache.fill(pulfunte_focus(t).focus);
    AxisWeights {
        rows: WeightVector::from_fn(|r| cache.row_max(r)),
        cols: WeightVector::from_fn(|c| cache.col_max(c)),
    }
}

fn noise_sample(perlin: &Perlin, x: f64, y: f64) -> f64 {
    let unit = (perlin.get([x, y]) * 0.5 + 0.5).clamp(0.0, 1.0);
    remap(unit, 0.0, 1.0, NOISE_WEIGHT_MIN, NOISE_WEIGHT_MAX)
}

fn noise_field(t: f64, perlin: &Perlin) -> AxisWeights {
    let x = t * NOISE_TIME_SPEED;
    AxisWeights {
        rows: WeightVector::from_fn(|r| noise_sample(perlin, x, r as f64 * NOISE_SPATIAL_STRIDE)),
        cols: WeightVector::from_fn(|c| {
            noise_sample(perlin, x, c as f64 * NOISE_SPATIAL_STRIDE + NOISE_AXIS_OFFSET)
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagonalDirection {
    /// Top-left to bottom-right (Scan).
    Forward,
    /// Top-right to bottom-left (Slash).
    Reverse,
}

/// Sweep position in `[-0.5, 5.5)`, half a cell past the grid on each side.
pub fn diagonal_phase(t: f64) -> f64 {
    (t * DIAGONAL_PHASE_SPEED).rem_euclid(DIAGONAL_CYCLE_LENGTH) - DIAGONAL_PHASE_OFFSET
}

pub fn diagonal(t: f64, direction: DiagonalDirection) -> AxisWeights {
    let phase = diagonal_phase(t);
    let col_phase = match direction {
        DiagonalDirection::Forward => phase,
        DiagonalDirection::Reverse => DIAGONAL_CYCLE_LENGTH - DIAGONAL_PHASE_OFFSET - phase,
    };
    AxisWeights {
        rows: WeightVector::from_fn(|r| {
            gaussian_weight(r as f64 - phase, AMPLITUDE_PEAK, FALLOFF_SHARP, BASELINE)
        }),
        cols: WeightVector::from_fn(|c| {
            gaussian_weight(c as f64 - col_phase, AMPLITUDE_PEAK, FALLOFF_SHARP, BASELINE)
        }),
    }
}

fn wave(t: f64) -> AxisWeights {
    AxisWeights {
        rows: WeightVector::from_fn(|r| {
            sine_weight(AMPLITUDE_STRONG, t * PHASE_SLOW + r as f64 * 0.8)
        }),
        cols: WeightVector::from_fn(|c| {
            sine_weight(AMPLITUDE_STRONG, t * PHASE_FAST + c as f64 * 0.8)
        }),
    }
}

fn breath(t: f64) -> AxisWeights {
    AxisWeights {
        rows: WeightVector::uniform(sine_weight(AMPLITUDE_STRONG, t * PHASE_SLOW)),
        cols: WeightVector::uniform(sine_weight(AMPLITUDE_STRONG, t * PHASE_NORMAL)),
    }
}

fn fallback(t: f64) -> AxisWeights {
    AxisWeights {
        rows: WeightVector::from_fn(|r| sine_weight(AMPLITUDE_STRONG, t * 0.7 + r as f64 * 1.2)),
        cols: WeightVector::from_fn(|c| sine_weight(AMPLITUDE_STRONG, t * 1.1 + c as f64 * 0.8)),
    }
}
