//! One animated grid: time accumulation, weight projection, cell colouring.

use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::color::{color_parameter, lookup, normalize_intensity, Rgb};
use crate::error_codes::{CodedError, ORIENTATION_MISMATCH};
use crate::motion::{MotionKind, Orientation, GRID_SIZE};
use crate::schema::GlobalParams;
use crate::weights::{compute_weights, local_weights, AxisWeights, MotionState, WeightVector};

/// Visual attributes of one cell after the latest update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellState {
    pub width_percent: f64,
    pub height_percent: f64,
    /// Canonical-band intensity before clamping.
    pub intensity: f64,
    /// Last colour written. Stays unchanged on frames whose scheme did not resolve.
    pub color: Option<Rgb>,
}

impl Default for CellState {
    fn default() -> Self {
        let share = 100.0 / GRID_SIZE as f64;
        Self {
            width_percent: share,
            height_percent: share,
            intensity: 0.0,
            color: None,
        }
    }
}

/// Weights and intensities for one projected frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedFrame {
    pub motion: MotionKind,
    pub orientation: Orientation,
    pub time: f64,
    /// Global weights (column widths in column-major, row heights in row-major).
    pub outer: WeightVector,
    /// Inner-axis weights per stripe, indexed by outer position.
    pub inner: Vec<WeightVector>,
    /// Raw area products, `[row][col]`.
    pub raw_intensity: [[f64; GRID_SIZE]; GRID_SIZE],
    /// Band-normalised intensities, `[row][col]`.
    pub intensity: [[f64; GRID_SIZE]; GRID_SIZE],
}

impl ProjectedFrame {
    pub fn outer_percentages(&self) -> [f64; GRID_SIZE] {
        self.outer.percentages()
    }

    /// `(width%, height%)` of the cell at `(row, col)`.
    pub fn cell_size_percent(&self, row: usize, col: usize) -> (f64, f64) {
        match self.orientation {
            Orientation::ColumnMajor => (
                self.outer.percentages()[col],
                self.inner[col].percentages()[row],
            ),
            Orientation::RowMajor => (
                self.inner[row].percentages()[col],
                self.outer.percentages()[row],
            ),
        }
    }
}

/// Project motion weights onto the grid for the given orientation.
pub fn project(
    kind: MotionKind,
    orientation: Orientation,
    t: f64,
    weights: &AxisWeights,
) -> ProjectedFrame {
    let (outer, shared_inner) = match orientation {
        Orientation::ColumnMajor => (&weights.cols, &weights.rows),
        Orientation::RowMajor => (&weights.rows, &weights.cols),
    };

    let inner = (0..GRID_SIZE)
        .map(|stripe| local_weights(kind, t, stripe).unwrap_or_else(|| shared_inner.clone()))
        .collect::<Vec<_>>();

    let mut raw_intensity = [[0.0; GRID_SIZE]; GRID_SIZE];
    let mut intensity = [[0.0; GRID_SIZE]; GRID_SIZE];
    for row in 0..GRID_SIZE {
        for col in 0..GRID_SIZE {
            let (stripe, position) = match orientation {
                Orientation::ColumnMajor => (col, row),
                Orientation::RowMajor => (row, col),
            };
            let area = inner[stripe].get(position) * outer.get(stripe);
            raw_intensity[row][col] = area;
            intensity[row][col] = normalize_intensity(kind, area);
        }
    }

    ProjectedFrame {
        motion: kind,
        orientation,
        time: t,
        outer: outer.clone(),
        inner,
        raw_intensity,
        intensity,
    }
}

/// Evaluate a motion at an absolute time with fresh per-instance state.
pub fn sample_motion(kind: MotionKind, orientation: Orientation, t: f64) -> ProjectedFrame {
    let mut state = MotionState::for_kind(kind);
    let weights = compute_weights(kind, t, &mut state);
    project(kind, orientation, t, &weights)
}

#[derive(Debug, Clone)]
pub struct GridInstance {
    label: String,
    motion_name: String,
    kind: MotionKind,
    orientation: Orientation,
    time: f64,
    state: MotionState,
    stripes: [f64; GRID_SIZE],
    cells: [[CellState; GRID_SIZE]; GRID_SIZE],
    last_frame: Option<ProjectedFrame>,
}

impl GridInstance {
    /// Build an instance. `motion_name` is kept for display; unknown names
    /// resolve to the fallback motion.
    pub fn new(
        label: impl Into<String>,
        motion_name: impl Into<String>,
        orientation: Option<Orientation>,
    ) -> Result<Self> {
        let label = label.into();
        let motion_name = motion_name.into();
        let kind = MotionKind::resolve(&motion_name);
        let orientation = orientation.unwrap_or_else(|| kind.natural_orientation());

        if let Some(required) = kind.required_orientation() {
            if required != orientation {
                return Err(anyhow!(CodedError::config(
                    ORIENTATION_MISMATCH,
                    format!(
                        "grid '{label}': motion {} only supports orientation '{}'",
                        kind.name(),
                        required.keyword()
                    ),
                )
                .with_details(json!({
                    "label": label,
                    "motion": kind.name(),
                    "provided": orientation.keyword(),
                    "required": required.keyword()
                }))));
            }
        }

        Ok(Self {
            label,
            motion_name,
            kind,
            orientation,
            time: 0.0,
            state: MotionState::for_kind(kind),
            stripes: [100.0 / GRID_SIZE as f64; GRID_SIZE],
            cells: [[CellState::default(); GRID_SIZE]; GRID_SIZE],
            last_frame: None,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn motion_name(&self) -> &str {
        &self.motion_name
    }

    pub fn kind(&self) -> MotionKind {
        self.kind
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn motion_state(&self) -> &MotionState {
        &self.state
    }

    /// Cell at `(row, col)`.
    pub fn cell(&self, row: usize, col: usize) -> &CellState {
        &self.cells[row][col]
    }

    /// Outer-axis percentage of stripe `index` (column width in
    /// column-major, row height in row-major).
    pub fn stripe_percent(&self, index: usize) -> f64 {
        self.stripes[index]
    }

    pub fn last_frame(&self) -> Option<&ProjectedFrame> {
        self.last_frame.as_ref()
    }

    /// Advance time by the global speed and recompute every cell.
    /// Returns `false` when the colour scheme did not resolve and colours
    /// were left untouched.
    pub fn update(&mut self, params: &GlobalParams) -> bool {
        self.time += params.speed;
        let weights = compute_weights(self.kind, self.time, &mut self.state);
        let frame = project(self.kind, self.orientation, self.time, &weights);

        self.stripes = frame.outer_percentages();
        let mut colored = true;
        for row in 0..GRID_SIZE {
            for col in 0..GRID_SIZE {
                let (width_percent, height_percent) = frame.cell_size_percent(row, col);
                let intensity = frame.intensity[row][col];
                let cell = &mut self.cells[row][col];
                cell.width_percent = width_percent;
                cell.height_percent = height_percent;
                cell.intensity = intensity;
                match lookup(&params.scheme, color_parameter(intensity)) {
                    Some(color) => cell.color = Some(color),
                    None => colored = false,
                }
            }
        }

        if !colored {
            debug!(
                grid = %self.label,
                scheme = %params.scheme,
                "unknown colour scheme; colour write skipped"
            );
        }
        self.last_frame = Some(frame);
        colored
    }
}

#[cfg(test)]
mod tests {
    use super::{project, sample_motion, GridInstance};
    use crate::color::{color_parameter, lookup, normalize_intensity};
    use crate::error_codes::{find_coded_error, ORIENTATION_MISMATCH};
    use crate::motion::{MotionKind, Orientation, GRID_SIZE};
    use crate::schema::GlobalParams;
    use crate::weights::{alternating_stripe, compute_weights, MotionState};

    fn params(scheme: &str, speed: f64) -> GlobalParams {
        GlobalParams {
            scheme: scheme.to_owned(),
            speed,
        }
    }

    #[test]
    fn update_accumulates_time_incrementally() {
        let mut grid = GridInstance::new("POLAR", "Polar", None).expect("grid should build");
        grid.update(&params("Viridis", 0.05));
        grid.update(&params("Viridis", 0.1));
        grid.update(&params("Viridis", 0.0));
        assert!((grid.time() - 0.15).abs() < 1e-12);
    }

    #[test]
    fn column_major_sizes_sum_to_one_hundred() {
        let mut grid = GridInstance::new("CIRC", "Circulation", None).expect("grid should build");
        for _ in 0..40 {
            grid.update(&params("Magma", 0.07));
        }
        let widths: f64 = (0..GRID_SIZE).map(|col| grid.stripe_percent(col)).sum();
        assert!((widths - 100.0).abs() < 1e-9);
        for col in 0..GRID_SIZE {
            let heights: f64 = (0..GRID_SIZE).map(|row| grid.cell(row, col).height_percent).sum();
            assert!((heights - 100.0).abs() < 1e-9);
            assert_eq!(grid.cell(0, col).width_percent, grid.stripe_percent(col));
        }
    }

    #[test]
    fn alt_tb_flow_rows_alternate_per_column() {
        let t = 0.4;
        let frame = sample_motion(MotionKind::AltTbFlow, Orientation::ColumnMajor, t);
        assert_eq!(frame.inner[0], alternating_stripe(t, 0));
        assert_eq!(frame.inner[1], alternating_stripe(t, 1));
        let (_, even_height) = frame.cell_size_percent(1, 0);
        assert_eq!(even_height, alternating_stripe(t, 0).percentages()[1]);
        for c in 0..GRID_SIZE {
            let expected = 1.0 + 0.3 * (1.5 * t + 0.2 * c as f64).sin();
            assert_eq!(frame.outer.get(c), expected);
        }
    }

    #[test]
    fn alt_lr_flow_is_row_major_with_fixed_row_heights() {
        let mut grid = GridInstance::new("ALT LR", "AltLRFlow", None).expect("grid should build");
        assert_eq!(grid.orientation(), Orientation::RowMajor);
        grid.update(&params("Cool", 0.9));
        for row in 0..GRID_SIZE {
            assert!((grid.stripe_percent(row) - 20.0).abs() < 1e-12);
            let widths: f64 = (0..GRID_SIZE).map(|col| grid.cell(row, col).width_percent).sum();
            assert!((widths - 100.0).abs() < 1e-9);
        }
        let frame = grid.last_frame().expect("frame should be recorded");
        assert_eq!(frame.inner[1], alternating_stripe(grid.time(), 1));
    }

    #[test]
    fn intensity_is_area_product_then_normalized() {
        let t = 2.3;
        let kind = MotionKind::Scan;
        let mut state = MotionState::for_kind(kind);
        let weights = compute_weights(kind, t, &mut state);
        let frame = project(kind, Orientation::ColumnMajor, t, &weights);
        for row in 0..GRID_SIZE {
            for col in 0..GRID_SIZE {
                let area = weights.rows.get(row) * weights.cols.get(col);
                assert_eq!(frame.raw_intensity[row][col], area);
                assert_eq!(frame.intensity[row][col], normalize_intensity(kind, area));
            }
        }
    }

    #[test]
    fn row_major_projection_swaps_axes() {
        let t = 1.1;
        let column = sample_motion(MotionKind::TbFlow, Orientation::ColumnMajor, t);
        let row = sample_motion(MotionKind::TbFlow, Orientation::RowMajor, t);
        for r in 0..GRID_SIZE {
            for c in 0..GRID_SIZE {
                let (cw, ch) = column.cell_size_percent(r, c);
                let (rw, rh) = row.cell_size_percent(r, c);
                assert!((cw - rw).abs() < 1e-9);
                assert!((ch - rh).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn cell_colors_follow_the_scheme() {
        let mut grid = GridInstance::new("ORTHO", "Orthogonal", None).expect("grid should build");
        assert!(grid.update(&params("Plasma", 0.05)));
        let cell = grid.cell(2, 3);
        assert_eq!(cell.color, lookup("Plasma", color_parameter(cell.intensity)));
    }

    #[test]
    fn unknown_scheme_keeps_previous_colors() {
        let mut grid = GridInstance::new("ORTHO", "Orthogonal", None).expect("grid should build");
        grid.update(&params("Viridis", 0.05));
        let before = grid.cell(1, 1).color;
        assert!(before.is_some());

        assert!(!grid.update(&params("Sepia", 0.5)));
        assert_eq!(grid.cell(1, 1).color, before);
        assert!((grid.time() - 0.55).abs() < 1e-12);
    }

    #[test]
    fn unknown_motion_falls_back_and_keeps_name() {
        let mut grid = GridInstance::new("X", "Spiral", None).expect("unknown motion should build");
        assert_eq!(grid.kind(), MotionKind::Fallback);
        assert_eq!(grid.motion_name(), "Spiral");
        assert!(grid.update(&params("Reds", 0.05)));
    }

    #[test]
    fn alternating_flows_reject_wrong_orientation() {
        let error = GridInstance::new("A", "AltTBFlow", Some(Orientation::RowMajor))
            .expect_err("row-major AltTBFlow should be rejected");
        assert_eq!(
            find_coded_error(&error).map(|coded| coded.code),
            Some(ORIENTATION_MISMATCH)
        );
        assert!(GridInstance::new("B", "AltLRFlow", Some(Orientation::ColumnMajor)).is_err());
        assert!(GridInstance::new("C", "Scan", Some(Orientation::RowMajor)).is_ok());
    }

    #[test]
    fn pulfunte_instance_owns_its_cache() {
        let mut grid = GridInstance::new("P", "Pulfunte", None).expect("grid should build");
        assert!(grid.motion_state().pulfunte_cache().is_some());
        grid.update(&params("Turbo", 0.5));
        let peak = grid
            .motion_state()
            .pulfunte_cache()
            .expect("cache should persist")
            .field()
            .iter()
            .flatten()
            .copied()
            .fold(f64::MIN, f64::max);
        assert!(peak > 1.0);
    }
}
