//! Physical transport driver for the reaction step.
//!
//! The circulation model owns the velocity and diffusivity fields; this
//! module only defines the seam. A [`TransportOperators`] implementation
//! supplies tendencies on the engine's grid, and [`advance`] combines them
//! with the reaction increments into one outer tracer step: explicit
//! Adams-Bashforth advection, optional lateral diffusion tendencies, then an
//! implicit solve for vertical mixing so strong diffusivities cannot
//! destabilize the step.

use ndarray::Array2;

use crate::errors::BgcResult;
use crate::grid::{Field3, Forcing, Grid};
use crate::integrator::biogeochemistry;
use crate::setup::NpzdModel;
use crate::tracer::TracerId;

/// Tendencies supplied by the outer circulation model.
///
/// Only advection is mandatory. The lateral diffusion operators default to
/// `None`; [`advance`] adds each one that is both enabled in the parameters
/// and actually provided.
pub trait TransportOperators {
    /// Advective tendency of one tracer (concentration/s).
    fn advect(&self, grid: &Grid, field: &Field3) -> Field3;

    /// Lateral Laplacian diffusion tendency.
    fn horizontal_diffusion(&self, _grid: &Grid, _field: &Field3) -> Option<Field3> {
        None
    }

    /// Biharmonic mixing tendency.
    fn biharmonic_mixing(&self, _grid: &Grid, _field: &Field3) -> Option<Field3> {
        None
    }

    /// Isoneutral diffusion tendency.
    fn isoneutral_diffusion(&self, _grid: &Grid, _field: &Field3) -> Option<Field3> {
        None
    }

    /// Skew diffusion tendency, only used together with isoneutral
    /// diffusion.
    fn skew_diffusion(&self, _grid: &Grid, _field: &Field3) -> Option<Field3> {
        None
    }

    /// Implicit vertical-diffusion solve for one tracer, in place. The
    /// default is the per-column Thomas solve below; a circulation model
    /// that carries its own banded solver can substitute it here.
    fn solve_implicit(&self, grid: &Grid, kappa: &Field3, dt: f64, field: &mut Field3) {
        implicit_vertical_mixing(grid, kappa, dt, field);
    }

    /// Re-establish the cyclic boundary in x after a step. The default is a
    /// no-op for non-cyclic or single-column domains.
    fn set_cyclic(&self, _grid: &Grid, _field: &mut Field3) {}
}

/// Transport for a stand-alone water column: no lateral motion at all.
/// Vertical mixing still applies through the implicit solve in [`advance`].
#[derive(Debug, Default)]
pub struct NullTransport;

impl TransportOperators for NullTransport {
    fn advect(&self, grid: &Grid, _field: &Field3) -> Field3 {
        Field3::zeros((grid.nx, grid.ny, grid.nz))
    }
}

/// Tracer concentrations across the time levels of the stepping scheme.
#[derive(Debug)]
pub struct NpzdState {
    /// Concentrations at the current time level, in registration order.
    pub tau: Vec<Field3>,
    adv_tau: Vec<Field3>,
    adv_taum1: Vec<Field3>,
    steps: u64,
}

impl NpzdState {
    /// A state with every tracer resting on the floor over wet cells. The
    /// reaction network leaves such a state unchanged, so it is the natural
    /// blank slate to seed concentrations into.
    pub fn new(model: &NpzdModel, grid: &Grid) -> Self {
        let dim = (grid.nx, grid.ny, grid.nz);
        let floor = Field3::from_shape_fn(dim, |(i, j, k)| {
            if grid.mask[[i, j, k]] {
                model.params.trcmin
            } else {
                0.0
            }
        });
        let count = model.tracers.len();
        Self {
            tau: vec![floor; count],
            adv_tau: vec![Field3::zeros(dim); count],
            adv_taum1: vec![Field3::zeros(dim); count],
            steps: 0,
        }
    }

    pub fn concentration(&self, id: TracerId) -> &Field3 {
        &self.tau[id.index()]
    }

    pub fn set_concentration(&mut self, id: TracerId, field: Field3) {
        self.tau[id.index()] = field;
    }
}

/// Per-step diagnostics reported by [`advance`].
#[derive(Debug)]
pub struct StepDiagnostics {
    /// Depth-integrated detritus export through the sea floor (mmol N / m^2).
    pub detritus_export: Array2<f64>,
}

/// Advance the tracer state by one outer step: reactions, explicit lateral
/// transport and implicit vertical mixing.
pub fn advance(
    model: &NpzdModel,
    grid: &Grid,
    forcing: Forcing,
    state: &mut NpzdState,
    operators: &impl TransportOperators,
) -> BgcResult<StepDiagnostics> {
    let params = &model.params;
    let reactions = biogeochemistry(model, grid, forcing, &state.tau)?;

    for &id in model.tracers.transported() {
        let t = id.index();
        state.adv_tau[t] = operators.advect(grid, &state.tau[t]);
    }
    if state.steps == 0 {
        // No previous tendency to extrapolate from; fall back to Euler.
        state.adv_taum1 = state.adv_tau.clone();
    }

    for &id in model.tracers.transported() {
        let t = id.index();
        let mut next = state.tau[t].clone();

        // Adams-Bashforth extrapolation of the advective tendency, slightly
        // off-centered for stability.
        let (now, before) = (1.5 + params.ab_eps, 0.5 + params.ab_eps);
        for ((i, j, k), value) in next.indexed_iter_mut() {
            if grid.mask[[i, j, k]] {
                *value += params.dt_tracer
                    * (now * state.adv_tau[t][[i, j, k]]
                        - before * state.adv_taum1[t][[i, j, k]]);
            }
        }

        let mut lateral: Vec<Field3> = Vec::new();
        if params.enable_horizontal_diffusion {
            lateral.extend(operators.horizontal_diffusion(grid, &state.tau[t]));
        }
        if params.enable_biharmonic_mixing {
            lateral.extend(operators.biharmonic_mixing(grid, &state.tau[t]));
        }
        if params.enable_neutral_diffusion {
            lateral.extend(operators.isoneutral_diffusion(grid, &state.tau[t]));
            if params.enable_skew_diffusion {
                lateral.extend(operators.skew_diffusion(grid, &state.tau[t]));
            }
        }
        for tendency in &lateral {
            for ((i, j, k), value) in next.indexed_iter_mut() {
                if grid.mask[[i, j, k]] {
                    *value += params.dt_tracer * tendency[[i, j, k]];
                }
            }
        }

        next += &reactions.increments[t];
        operators.solve_implicit(grid, forcing.kappa, params.dt_tracer, &mut next);
        clamp(grid, params.trcmin, &mut next);
        operators.set_cyclic(grid, &mut next);
        state.tau[t] = next;
    }

    // Tracers outside transport are updated by their reaction increments
    // alone.
    for (id, descriptor) in model.tracers.iter() {
        if descriptor.transport {
            continue;
        }
        let t = id.index();
        let mut next = state.tau[t].clone();
        next += &reactions.increments[t];
        clamp(grid, params.trcmin, &mut next);
        state.tau[t] = next;
    }

    std::mem::swap(&mut state.adv_tau, &mut state.adv_taum1);
    state.steps += 1;
    log::trace!(
        "step {}: advanced {} transported tracers",
        state.steps,
        model.tracers.transported().len()
    );

    Ok(StepDiagnostics {
        detritus_export: reactions.detritus_export,
    })
}

fn clamp(grid: &Grid, trcmin: f64, field: &mut Field3) {
    for ((i, j, k), value) in field.indexed_iter_mut() {
        *value = if grid.mask[[i, j, k]] {
            value.max(trcmin)
        } else {
            0.0
        };
    }
}

/// Solve `(I - dt * d/dz kappa d/dz) next = field` column by column with the
/// Thomas algorithm. No-flux boundaries at the surface and the sea floor, so
/// the depth-integrated content of each column is preserved.
pub(crate) fn implicit_vertical_mixing(
    grid: &Grid,
    kappa: &Field3,
    dt: f64,
    field: &mut Field3,
) {
    let nz = grid.nz;
    let mut delta = vec![0.0; nz];
    let mut lower = vec![0.0; nz];
    let mut diag = vec![0.0; nz];
    let mut upper = vec![0.0; nz];
    let mut rhs = vec![0.0; nz];

    for i in 0..grid.nx {
        for j in 0..grid.ny {
            let kbot = grid.kbot[[i, j]];
            if kbot == 0 {
                continue;
            }
            let ks = kbot - 1;
            if ks == nz - 1 {
                // Single wet cell; mixing cannot change it.
                continue;
            }

            // delta[k] couples cell k to the cell above through the top face.
            for k in ks..nz - 1 {
                delta[k] = dt / grid.dzw[k] * kappa[[i, j, k]];
            }
            delta[nz - 1] = 0.0;

            for k in ks..nz {
                let below = if k > ks { delta[k - 1] } else { 0.0 };
                lower[k] = -below / grid.dzt[k];
                diag[k] = 1.0 + (delta[k] + below) / grid.dzt[k];
                upper[k] = -delta[k] / grid.dzt[k];
                rhs[k] = field[[i, j, k]];
            }

            // Thomas forward sweep and back substitution over ks..nz.
            for k in ks + 1..nz {
                let w = lower[k] / diag[k - 1];
                diag[k] -= w * upper[k - 1];
                rhs[k] -= w * rhs[k - 1];
            }
            field[[i, j, nz - 1]] = rhs[nz - 1] / diag[nz - 1];
            for k in (ks..nz - 1).rev() {
                field[[i, j, k]] = (rhs[k] - upper[k] * field[[i, j, k + 1]]) / diag[k];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mixing_preserves_column_content() {
        let grid = Grid::column(10.0, 5, 0.0);
        let kappa = Field3::from_elem((1, 1, 5), 1e-3);
        let mut field = Field3::zeros((1, 1, 5));
        for k in 0..5 {
            field[[0, 0, k]] = (k as f64) * 0.3 + 0.1;
        }
        let before: f64 = (0..5).map(|k| field[[0, 0, k]] * grid.dzt[k]).sum();

        implicit_vertical_mixing(&grid, &kappa, 86400.0, &mut field);
        let after: f64 = (0..5).map(|k| field[[0, 0, k]] * grid.dzt[k]).sum();
        assert_relative_eq!(before, after, max_relative = 1e-12);
    }

    #[test]
    fn mixing_relaxes_towards_the_column_mean() {
        let grid = Grid::column(10.0, 4, 0.0);
        let kappa = Field3::from_elem((1, 1, 4), 1e-2);
        let mut field = Field3::zeros((1, 1, 4));
        field[[0, 0, 3]] = 1.0;

        implicit_vertical_mixing(&grid, &kappa, 86400.0, &mut field);
        // The perturbation spreads downward and shrinks at the source.
        assert!(field[[0, 0, 3]] < 1.0);
        assert!(field[[0, 0, 2]] > 0.0);
        // A very long implicit step homogenizes the column completely.
        implicit_vertical_mixing(&grid, &kappa, 1e12, &mut field);
        for k in 0..4 {
            assert_relative_eq!(field[[0, 0, k]], 0.25, max_relative = 1e-6);
        }
    }

    #[test]
    fn uniform_profiles_are_fixed_points_of_mixing() {
        let grid = Grid::column(25.0, 6, 0.0);
        let kappa = Field3::from_elem((1, 1, 6), 5e-3);
        let mut field = Field3::from_elem((1, 1, 6), 0.7);
        implicit_vertical_mixing(&grid, &kappa, 86400.0, &mut field);
        for k in 0..6 {
            assert_relative_eq!(field[[0, 0, k]], 0.7, max_relative = 1e-12);
        }
    }

    #[test]
    fn land_columns_are_untouched() {
        let mut grid = Grid::column(10.0, 3, 0.0);
        grid.kbot[[0, 0]] = 0;
        let kappa = Field3::from_elem((1, 1, 3), 1e-2);
        let mut field = Field3::zeros((1, 1, 3));
        field[[0, 0, 1]] = 2.0;
        implicit_vertical_mixing(&grid, &kappa, 86400.0, &mut field);
        assert_eq!(field[[0, 0, 1]], 2.0);
    }
}
