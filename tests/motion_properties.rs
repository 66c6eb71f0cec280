use reactive_grid::color::{color_parameter, normalize_intensity};
use reactive_grid::grid::{sample_motion, GridInstance};
use reactive_grid::motion::{MotionKind, Orientation, GRID_SIZE};
use reactive_grid::schema::GlobalParams;

#[test]
fn orthogonal_end_to_end_at_time_zero() {
    let frame = sample_motion(MotionKind::Orthogonal, Orientation::ColumnMajor, 0.0);
    for i in 0..GRID_SIZE {
        let expected = 1.0 + 0.6 * (0.8 * i as f64).sin();
        assert_eq!(frame.outer.get(i), expected);
        assert_eq!(frame.inner[0].get(i), expected);
    }
    let approx = [1.0, 1.430, 1.600, 1.405, 0.965];
    for (value, expected) in frame.outer.values().iter().zip(approx) {
        assert!((value - expected).abs() < 5e-3, "{value} vs {expected}");
    }
}

#[test]
fn every_motion_keeps_proportions_whole_over_a_long_run() {
    let params = GlobalParams {
        speed: 0.1,
        ..GlobalParams::default()
    };
    for kind in MotionKind::ALL {
        let mut grid =
            GridInstance::new(kind.name(), kind.name(), None).expect("grid should build");
        for _ in 0..600 {
            grid.update(&params);
            for stripe in 0..GRID_SIZE {
                let outer: f64 = (0..GRID_SIZE).map(|i| grid.stripe_percent(i)).sum();
                assert!((outer - 100.0).abs() < 1e-9, "{}", kind.name());
                let inner: f64 = (0..GRID_SIZE)
                    .map(|position| match grid.orientation() {
                        Orientation::ColumnMajor => grid.cell(position, stripe).height_percent,
                        Orientation::RowMajor => grid.cell(stripe, position).width_percent,
                    })
                    .sum();
                assert!((inner - 100.0).abs() < 1e-9, "{}", kind.name());
            }
        }
    }
}

#[test]
fn peaked_motions_saturate_instead_of_wrapping() {
    // Scan peaks at 5 x 5 = 25, beyond its [1, 20] normalisation range.
    let peak = normalize_intensity(MotionKind::Scan, 25.0);
    assert!(peak > 2.2);
    assert_eq!(color_parameter(peak), 1.0);
}

#[test]
fn pulfunte_peak_dominates_its_row_and_column() {
    // Step boundaries put the focus exactly on a cell.
    let frame = sample_motion(MotionKind::Pulfunte, Orientation::ColumnMajor, 4.0);
    let (mut best_row, mut best_col, mut best) = (0, 0, f64::MIN);
    for row in 0..GRID_SIZE {
        for col in 0..GRID_SIZE {
            if frame.raw_intensity[row][col] > best {
                best = frame.raw_intensity[row][col];
                best_row = row;
                best_col = col;
            }
        }
    }
    assert!((best - 36.0).abs() < 1e-9, "peak product should be 6 x 6, got {best}");
    let widest = (0..GRID_SIZE)
        .max_by(|a, b| frame.outer.get(*a).total_cmp(&frame.outer.get(*b)))
        .expect("grid is non-empty");
    assert_eq!(widest, best_col);
    let tallest = (0..GRID_SIZE)
        .max_by(|a, b| frame.inner[0].get(*a).total_cmp(&frame.inner[0].get(*b)))
        .expect("grid is non-empty");
    assert_eq!(tallest, best_row);
}
