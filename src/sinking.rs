//! Gravitational sinking of particulate tracers.
//!
//! Each sinking tracer exports mass through the bottom face of every wet
//! cell and imports the export of the cell above, scaled by the thickness
//! ratio so the exchanged quantity is a depth-integrated amount. The deepest
//! wet cell of each column exports into `bottom_export`, where the
//! integrator either remineralizes it back into the column or drops it.

use ndarray::Array2;

use crate::grid::{Field3, Grid, Mask3};
use crate::tracer::{TracerId, TracerRegistry};

/// Sinking fluxes of one tracer for one sub-step.
#[derive(Debug)]
pub struct SinkingFluxes {
    /// Export through the bottom face of each cell (concentration/s).
    pub export: Field3,
    /// Export leaving the deepest wet cell of each column
    /// (depth-integrated, mmol/m^2/s).
    pub bottom_export: Array2<f64>,
    /// Net concentration tendency: import minus export.
    pub divergence: Field3,
}

/// Compute the sinking fluxes for every tracer with a sinking speed.
/// Slots without a sinking speed stay `None`.
pub fn sinking_fluxes(
    grid: &Grid,
    tracers: &TracerRegistry,
    working: &[Field3],
    flags: &[Mask3],
) -> Vec<Option<SinkingFluxes>> {
    tracers
        .iter()
        .map(|(id, descriptor)| {
            descriptor
                .sinking_speed
                .as_ref()
                .map(|speed| tracer_sinking(grid, id, speed, working, flags))
        })
        .collect()
}

fn tracer_sinking(
    grid: &Grid,
    id: TracerId,
    speed: &Field3,
    working: &[Field3],
    flags: &[Mask3],
) -> SinkingFluxes {
    let (nx, ny, nz) = (grid.nx, grid.ny, grid.nz);
    let concentration = &working[id.index()];
    let flag = &flags[id.index()];

    let mut export = Field3::zeros((nx, ny, nz));
    for ((i, j, k), value) in export.indexed_iter_mut() {
        if flag[[i, j, k]] {
            *value = speed[[i, j, k]] * concentration[[i, j, k]] / grid.dzt[k];
        }
    }

    let mut bottom_export = Array2::zeros((nx, ny));
    let mut divergence = Field3::zeros((nx, ny, nz));
    for i in 0..nx {
        for j in 0..ny {
            let kbot = grid.kbot[[i, j]];
            if kbot == 0 {
                continue;
            }
            let deepest = kbot - 1;
            for k in deepest..nz {
                // Import from the layer above; the surface imports nothing.
                let import = if k + 1 < nz {
                    export[[i, j, k + 1]] * grid.dzt[k + 1] / grid.dzt[k]
                } else {
                    0.0
                };
                divergence[[i, j, k]] = import - export[[i, j, k]];
            }
            bottom_export[[i, j]] = export[[i, j, deepest]] * grid.dzt[deepest];
        }
    }

    SinkingFluxes {
        export,
        bottom_export,
        divergence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracer::TracerDescriptor;
    use approx::assert_relative_eq;

    fn setup() -> (Grid, TracerRegistry, Vec<Field3>, Vec<Mask3>) {
        let grid = Grid::column(10.0, 4, 0.0);
        let mut registry = TracerRegistry::new();
        registry
            .register(
                TracerDescriptor::new("detritus")
                    .with_sinking_speed(Field3::from_elem((1, 1, 4), 2e-5)),
            )
            .unwrap();
        let working = vec![Field3::from_elem((1, 1, 4), 0.5)];
        let flags = vec![Mask3::from_elem((1, 1, 4), true)];
        (grid, registry, working, flags)
    }

    #[test]
    fn interior_divergence_telescopes_to_bottom_export() {
        let (grid, registry, working, flags) = setup();
        let fluxes = sinking_fluxes(&grid, &registry, &working, &flags);
        let det = fluxes[0].as_ref().unwrap();

        // Column-integrated divergence equals minus the bottom export.
        let mut integral = 0.0;
        for k in 0..4 {
            integral += det.divergence[[0, 0, k]] * grid.dzt[k];
        }
        assert_relative_eq!(integral, -det.bottom_export[[0, 0]], max_relative = 1e-12);
    }

    #[test]
    fn export_scales_with_speed_and_concentration() {
        let (grid, registry, working, flags) = setup();
        let fluxes = sinking_fluxes(&grid, &registry, &working, &flags);
        let det = fluxes[0].as_ref().unwrap();
        assert_relative_eq!(det.export[[0, 0, 3]], 2e-5 * 0.5 / 10.0);
    }

    #[test]
    fn flagged_out_cells_export_nothing() {
        let (grid, registry, working, mut flags) = setup();
        flags[0].fill(false);
        let fluxes = sinking_fluxes(&grid, &registry, &working, &flags);
        let det = fluxes[0].as_ref().unwrap();
        assert_eq!(det.export.iter().copied().sum::<f64>(), 0.0);
        assert_eq!(det.bottom_export[[0, 0]], 0.0);
    }

    #[test]
    fn land_columns_are_skipped() {
        let (mut grid, registry, working, flags) = setup();
        grid.kbot[[0, 0]] = 0;
        let fluxes = sinking_fluxes(&grid, &registry, &working, &flags);
        let det = fluxes[0].as_ref().unwrap();
        assert_eq!(det.divergence.iter().copied().sum::<f64>(), 0.0);
        assert_eq!(det.bottom_export[[0, 0]], 0.0);
    }

    #[test]
    fn non_sinking_tracers_have_no_fluxes() {
        let grid = Grid::column(10.0, 2, 0.0);
        let mut registry = TracerRegistry::new();
        registry.register(TracerDescriptor::new("po4")).unwrap();
        let working = vec![Field3::from_elem((1, 1, 2), 1.0)];
        let flags = vec![Mask3::from_elem((1, 1, 2), true)];
        let fluxes = sinking_fluxes(&grid, &registry, &working, &flags);
        assert!(fluxes[0].is_none());
    }
}
