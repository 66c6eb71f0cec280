use std::collections::HashSet;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::grid::GridInstance;
use crate::schema::{GlobalParams, GridConfig};

/// Every configured grid, in display order.
#[derive(Debug, Clone)]
pub struct GridCollection {
    grids: Vec<GridInstance>,
    reported_schemes: HashSet<String>,
}

impl GridCollection {
    /// Build one instance per descriptor. `config` is expected to have
    /// passed through `manifest::finalize_config`; only orientations are
    /// checked here.
    pub fn from_config(config: &GridConfig) -> Result<Self> {
        let grids = config
            .grids
            .iter()
            .map(|descriptor| {
                GridInstance::new(
                    descriptor.label.clone(),
                    descriptor.motion.clone(),
                    Some(descriptor.resolved_orientation()?),
                )
                .with_context(|| format!("failed building grid '{}'", descriptor.label))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            grids,
            reported_schemes: HashSet::new(),
        })
    }

    pub fn grids(&self) -> &[GridInstance] {
        &self.grids
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    /// Advance every grid by one frame. Returns the number of grids whose
    /// colour write was skipped. An unresolved scheme is warned about once.
    pub fn tick(&mut self, params: &GlobalParams) -> usize {
        let skipped = self
            .grids
            .iter_mut()
            .map(|grid| grid.update(params))
            .filter(|colored| !colored)
            .count();
        if skipped > 0 {
            if self.reported_schemes.insert(params.scheme.clone()) {
                warn!(
                    scheme = %params.scheme,
                    skipped,
                    "colour scheme did not resolve; colours left unchanged"
                );
            } else {
                debug!(scheme = %params.scheme, skipped, "colour write skipped");
            }
        }
        skipped
    }

    pub fn run(&mut self, frames: u32, params: &GlobalParams) {
        for _ in 0..frames {
            self.tick(params);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GridCollection;
    use crate::error_codes::{find_coded_error, ORIENTATION_MISMATCH};
    use crate::grid::GridInstance;
    use crate::motion::{MotionKind, Orientation};
    use crate::schema::{GlobalParams, GridConfig, GridDescriptor};

    #[test]
    fn builds_default_collection_in_order() {
        let collection =
            GridCollection::from_config(&GridConfig::default()).expect("collection should build");
        assert_eq!(collection.len(), 10);
        assert_eq!(collection.grids()[4].kind(), MotionKind::AltLrFlow);
        assert_eq!(collection.grids()[4].orientation(), Orientation::RowMajor);
        assert_eq!(collection.grids()[7].label(), "BACK SLASH");
        assert_eq!(collection.grids()[7].kind(), MotionKind::Scan);
    }

    #[test]
    fn orientation_mismatch_is_a_construction_error() {
        let mut config = GridConfig::default();
        config.grids[3] =
            GridDescriptor::new("ALT TB FLOW", "AltTBFlow").with_orientation(Orientation::RowMajor);
        let error = GridCollection::from_config(&config).expect_err("mismatch should fail");
        assert_eq!(
            find_coded_error(&error).map(|coded| coded.code),
            Some(ORIENTATION_MISMATCH)
        );
        assert!(format!("{error:#}").contains("ALT TB FLOW"));
    }

    #[test]
    fn instances_are_independent_of_update_order() {
        let params = GlobalParams::default();
        let mut collection =
            GridCollection::from_config(&GridConfig::default()).expect("collection should build");
        collection.run(25, &params);

        for built in collection.grids() {
            let mut alone =
                GridInstance::new(built.label(), built.motion_name(), Some(built.orientation()))
                    .expect("grid should build");
            for _ in 0..25 {
                alone.update(&params);
            }
            assert_eq!(alone.last_frame(), built.last_frame(), "{}", built.label());
        }
    }

    #[test]
    fn tick_reports_skipped_color_writes() {
        let mut collection =
            GridCollection::from_config(&GridConfig::default()).expect("collection should build");
        assert_eq!(collection.tick(&GlobalParams::default()), 0);
        let unknown = GlobalParams {
            scheme: "Sepia".to_owned(),
            speed: 0.05,
        };
        assert_eq!(collection.tick(&unknown), collection.len());
        assert_eq!(collection.tick(&unknown), collection.len());
        assert_eq!(collection.reported_schemes.len(), 1);
        assert!(collection.reported_schemes.contains("Sepia"));
    }

    #[test]
    fn omitted_orientation_takes_natural_default() {
        let config = GridConfig {
            params: GlobalParams::default(),
            grids: vec![GridDescriptor::new("ALT LR", "alt-lr-flow")],
        };
        let collection = GridCollection::from_config(&config).expect("collection should build");
        assert_eq!(collection.grids()[0].orientation(), Orientation::RowMajor);
    }
}
