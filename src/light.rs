//! Light penetration and temperature response.
//!
//! Evaluated once per outer timestep: the time of year and the incoming
//! radiation do not change across biogeochemistry sub-steps. The water column
//! is self-shading, so light at the top of a layer depends on the attenuating
//! plankton mass in all layers strictly above it.

use ndarray::Array1;

use crate::grid::{Field3, Forcing, Grid};
use crate::parameters::NpzdParameters;
use crate::tracer::TracerRegistry;

/// Sea surface temperatures below this mark possible ice cover (degC).
const ICE_THRESHOLD_TEMP: f64 = -1.8;
/// Refractive index of sea water, from Snell's law at the air-sea interface.
const REFRACTIVE_INDEX: f64 = 1.33;
/// Phase shift of the sinusoidal declination cycle (fraction of a year).
const DECLINATION_PHASE: f64 = 0.72;
/// Amplitude of the declination cycle (rad).
const DECLINATION_AMPLITUDE: f64 = 0.4;

/// Per-timestep light and temperature fields consumed by the growth model.
#[derive(Debug)]
pub struct LightEnvironment {
    /// Photosynthetically active light at the top of each grid cell (W/m^2).
    pub grid_light: Field3,
    /// Light attenuation across each cell: water plus self-shading plankton.
    pub light_attenuation: Field3,
    /// Eppley temperature factor `bbio^(cbio * T)`.
    pub bct: Field3,
    /// Temperature-limited maximum grazing rate (1/s).
    pub gmax: Field3,
    /// Fraction of the day with daylight, per latitude.
    pub dayfrac: Array1<f64>,
}

/// Evaluate light penetration, day length and temperature response for the
/// current outer timestep.
pub fn evaluate_light(
    params: &NpzdParameters,
    grid: &Grid,
    forcing: &Forcing,
    tracers: &TracerRegistry,
    working: &[Field3],
) -> LightEnvironment {
    let (nx, ny, nz) = (grid.nx, grid.ny, grid.nz);
    let surface = grid.surface();

    // Depth-integrated self-shading per layer: concentration times
    // attenuation coefficient times layer thickness, for every tracer that
    // attenuates light.
    let mut shading = Field3::zeros((nx, ny, nz));
    for (id, descriptor) in tracers.iter() {
        if let Some(coefficient) = descriptor.light_attenuation {
            let field = &working[id.index()];
            for i in 0..nx {
                for j in 0..ny {
                    for k in 0..nz {
                        shading[[i, j, k]] += coefficient * field[[i, j, k]] * grid.dzt[k];
                    }
                }
            }
        }
    }

    // Solar declination and derived per-latitude quantities. The phase shift
    // aligns the equinoxes with the model calendar convention.
    let declination = ((forcing.time_of_year - DECLINATION_PHASE) * 2.0 * std::f64::consts::PI)
        .sin()
        * DECLINATION_AMPLITUDE;
    let radian = std::f64::consts::PI / 180.0;

    let mut rctheta = Array1::zeros(ny);
    let mut dayfrac = Array1::zeros(ny);
    for j in 0..ny {
        let theta = (grid.yt[j] * radian - declination).clamp(-1.5, 1.5);
        // Snell refraction of the zenith angle stretches the effective light
        // path through the water column.
        rctheta[j] = params.light_attenuation_water
            / (1.0 - (1.0 - theta.cos().powi(2)) / REFRACTIVE_INDEX.powi(2)).sqrt();
        let frac = (-(radian * grid.yt[j]).tan() * declination.tan()).min(1.0);
        dayfrac[j] = (frac.max(-1.0).acos() / std::f64::consts::PI).max(1e-12);
    }

    let mut grid_light = Field3::zeros((nx, ny, nz));
    let mut light_attenuation = Field3::zeros((nx, ny, nz));
    for i in 0..nx {
        for j in 0..ny {
            // Ice cover attenuates the incoming radiation where the surface
            // is near freezing and the atmosphere is below zero.
            let sst = forcing.temperature[[i, j, surface]] * grid.mask_value(i, j, surface);
            let iced =
                sst < ICE_THRESHOLD_TEMP && forcing.surface_air_temperature[[i, j]] < 0.0;
            let surface_light = if iced {
                forcing.swr[[i, j]] * (-params.light_attenuation_ice).exp()
            } else {
                forcing.swr[[i, j]]
            };

            // Walk down from the surface accumulating the attenuating mass
            // strictly above each layer.
            let mut above = 0.0_f64;
            for k in (0..nz).rev() {
                let swr_top = surface_light * (-above).exp();
                grid_light[[i, j, k]] = swr_top * (grid.zw[k] * rctheta[j]).exp();
                light_attenuation[[i, j, k]] =
                    grid.dzt[k] * params.light_attenuation_water + shading[[i, j, k]];
                above += shading[[i, j, k]];
            }
        }
    }

    // Temperature responses: growth uses the full Eppley curve, grazing is
    // capped at the zooplankton maximum-growth temperature.
    let mut bct = Field3::zeros((nx, ny, nz));
    let mut gmax = Field3::zeros((nx, ny, nz));
    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                let temp = forcing.temperature[[i, j, k]];
                bct[[i, j, k]] = params.bbio.powf(params.cbio * temp);
                let capped = temp.min(params.zooplankton_max_growth_temp);
                gmax[[i, j, k]] = params.gbio * params.bbio.powf(params.cbio * capped);
            }
        }
    }

    LightEnvironment {
        grid_light,
        light_attenuation,
        bct,
        gmax,
        dayfrac,
    }
}
