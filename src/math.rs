//! Scalar helpers shared by every motion.

/// Bell curve over a signed or unsigned distance:
/// `baseline + amplitude * exp(-distance^2 * falloff)`.
pub fn gaussian_weight(distance: f64, amplitude: f64, falloff: f64, baseline: f64) -> f64 {
    baseline + amplitude * (-distance * distance * falloff).exp()
}

/// Deterministic hash-like value in `[0, 1)` from `frac(sin(seed) * 10000)`.
///
/// Not a random number generator. Identical seeds always give identical
/// output, and nearby seeds are not guaranteed to decorrelate.
pub fn pseudo_random(seed: f64) -> f64 {
    let x = seed.sin() * 10_000.0;
    let frac = x - x.floor();
    // floor() on a large negative value can round the difference up to 1.0.
    if frac >= 1.0 {
        0.0
    } else {
        frac
    }
}

/// Hermite ease `x^2 (3 - 2x)`.
pub fn smoothstep(x: f64) -> f64 {
    x * x * (3.0 - 2.0 * x)
}

/// Linear remap of `value` from `[in_min, in_max]` to `[out_min, out_max]`.
/// Values outside the input range extrapolate.
pub fn remap(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    out_min + (value - in_min) / (in_max - in_min) * (out_max - out_min)
}

/// [`remap`] followed by a clamp into the output range.
pub fn remap_clamped(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    let mapped = remap(value, in_min, in_max, out_min, out_max);
    let (low, high) = if out_min <= out_max {
        (out_min, out_max)
    } else {
        (out_max, out_min)
    };
    mapped.clamp(low, high)
}

#[cfg(test)]
mod tests {
    use super::{gaussian_weight, pseudo_random, remap, remap_clamped, smoothstep};

    #[test]
    fn gaussian_peaks_at_zero_distance() {
        assert_eq!(gaussian_weight(0.0, 4.0, 0.5, 1.0), 5.0);
        assert_eq!(gaussian_weight(0.0, 5.0, 0.4, 2.5), 7.5);
    }

    #[test]
    fn gaussian_is_symmetric_and_decays_to_baseline() {
        for distance in [0.25, 1.0, 2.5, 7.0] {
            assert_eq!(
                gaussian_weight(distance, 4.0, 1.5, 1.0),
                gaussian_weight(-distance, 4.0, 1.5, 1.0)
            );
        }
        let far = gaussian_weight(40.0, 4.0, 1.5, 1.0);
        assert!((far - 1.0).abs() < 1e-12);
    }

    #[test]
    fn smoothstep_endpoints_and_midpoint() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert_eq!(smoothstep(0.5), 0.5);
    }

    #[test]
    fn smoothstep_is_monotonic_on_unit_interval() {
        let mut previous = smoothstep(0.0);
        for step in 1..=1000 {
            let value = smoothstep(step as f64 / 1000.0);
            assert!(value >= previous, "smoothstep decreased at step {step}");
            previous = value;
        }
    }

    #[test]
    fn pseudo_random_is_reproducible_and_in_unit_range() {
        for step in 0..500 {
            let seed = step as f64 * 123.456;
            let first = pseudo_random(seed);
            assert_eq!(first, pseudo_random(seed));
            assert!((0.0..1.0).contains(&first), "seed {seed} gave {first}");
        }
    }

    #[test]
    fn remap_extrapolates_and_clamped_variant_saturates() {
        assert!((remap(5.5, 1.0, 10.0, 0.3, 2.2) - 1.25).abs() < 1e-12);
        assert!(remap(20.0, 1.0, 10.0, 0.3, 2.2) > 2.2);
        assert_eq!(remap_clamped(3.0, 0.3, 2.2, 0.0, 1.0), 1.0);
        assert_eq!(remap_clamped(-1.0, 0.3, 2.2, 0.0, 1.0), 0.0);
    }
}
