//! Potential growth and nutrient limitation of plankton.
//!
//! Potential growth combines the Eppley temperature response with a
//! day-averaged, light-saturation-corrected growth rate from the closed-form
//! integral of the Platt photosynthesis-irradiance curve over one day. The
//! realized growth each sub-step is the minimum of this light-limited rate
//! and the nutrient-limited maximum, with Michaelis-Menten limitation terms.

use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::grid::{Field3, Mask3};
use crate::light::LightEnvironment;
use crate::parameters::NpzdParameters;
use crate::setup::CoreIds;

/// Growth-rate law of a plankton type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthFunction {
    /// Standard light- and temperature-dependent growth.
    Phytoplankton,
    /// As phytoplankton, with the coccolithophore growth parameter.
    Coccolithophore,
    /// Handicapped growth that shuts off below a minimum temperature factor
    /// and floors the growth bound.
    Diazotroph,
}

impl GrowthFunction {
    /// Evaluate the light-saturated maximum growth `jmax` and the
    /// day-averaged growth `avej` for every grid cell.
    pub fn evaluate(
        &self,
        params: &NpzdParameters,
        env: &LightEnvironment,
    ) -> (Field3, Field3) {
        match self {
            GrowthFunction::Phytoplankton => potential_growth(params, env, params.abio_p),
            GrowthFunction::Coccolithophore => potential_growth(params, env, params.abio_c),
            GrowthFunction::Diazotroph => {
                let dim = env.bct.dim();
                let mut jmax = Field3::zeros(dim);
                let mut gd = Field3::zeros(dim);
                for ((i, j, k), value) in jmax.indexed_iter_mut() {
                    *value = (params.abio_p
                        * params.jdiar
                        * (env.bct[[i, j, k]] - params.bct_min_diaz))
                        .max(0.0);
                    gd[[i, j, k]] = value.max(params.gd_min_diaz);
                }
                let avej = average_daily_growth(params, env, &gd);
                (jmax, avej)
            }
        }
    }
}

fn potential_growth(
    params: &NpzdParameters,
    env: &LightEnvironment,
    growth_parameter: f64,
) -> (Field3, Field3) {
    let dim = env.bct.dim();
    let mut jmax = Field3::zeros(dim);
    let mut gd = Field3::zeros(dim);
    for ((i, j, k), value) in jmax.indexed_iter_mut() {
        *value = growth_parameter * env.bct[[i, j, k]];
        gd[[i, j, k]] = *value * env.dayfrac[j];
    }
    let avej = average_daily_growth(params, env, &gd);
    (jmax, avej)
}

/// Closed-form day average of the Platt photosynthesis-irradiance curve,
/// evaluated at the top and bottom of the light-attenuating column and
/// combined as `gd * (phi1 - phi2) / attenuation`.
///
/// The approximation is valid for saturation arguments `u < 20`; this is an
/// accepted numerical domain restriction, not a guarded error path.
fn average_daily_growth(
    params: &NpzdParameters,
    env: &LightEnvironment,
    gd: &Field3,
) -> Field3 {
    let mut avej = Field3::zeros(env.grid_light.dim());
    for ((i, j, k), value) in avej.indexed_iter_mut() {
        let attenuation = env.light_attenuation[[i, j, k]];
        let u1 = (env.grid_light[[i, j, k]] / gd[[i, j, k]]).max(params.u1_min);
        let u2 = u1 * (-attenuation).exp();
        *value = gd[[i, j, k]] * (phi(u1) - phi(u2)) / attenuation;
    }
    avej
}

fn phi(u: f64) -> f64 {
    let root = (1.0 + u * u).sqrt();
    (u + root).ln() - (root - 1.0) / u
}

/// Nutrient limitation term of a plankton type.
///
/// Each variant is a Michaelis-Menten saturation function of one nutrient
/// pool; the OR variants take the per-cell maximum of two alternative pools
/// and (for the standard phytoplankton form) record which pool was selected
/// for the switching consumption rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Limitation {
    /// Phosphate limitation with the standard saturation constant.
    Phosphate,
    /// Phosphate limitation with the coccolithophore saturation constant.
    PhosphateCocco,
    /// Nitrate limitation.
    Nitrate,
    /// Maximum of phosphate and handicapped DOP limitation; records the
    /// selected pool per cell.
    DopOrPhosphate,
    /// As [`DopOrPhosphate`](Self::DopOrPhosphate) with coccolithophore
    /// constants, without recording the selection.
    DopOrPhosphateCocco,
}

fn saturation(nutrient: f64, constant: f64) -> f64 {
    nutrient / (constant + nutrient)
}

impl Limitation {
    /// Evaluate the limitation term over the grid. `dop_selected` is
    /// populated by the recording OR variant.
    pub fn evaluate(
        &self,
        params: &NpzdParameters,
        working: &[Field3],
        ids: &CoreIds,
        dop_selected: &mut Option<Mask3>,
    ) -> Field3 {
        let po4 = &working[ids.po4.index()];
        match self {
            Limitation::Phosphate => po4.mapv(|n| {
                saturation(n, params.saturation_constant_n * params.redfield_ratio_pn)
            }),
            Limitation::PhosphateCocco => po4.mapv(|n| {
                saturation(n, params.saturation_constant_nc * params.redfield_ratio_pn)
            }),
            Limitation::Nitrate => {
                let no3 = &working[ids.no3.expect("nitrate limitation without no3").index()];
                no3.mapv(|n| saturation(n, params.saturation_constant_n))
            }
            Limitation::DopOrPhosphate => {
                let dop = &working[ids.dop.expect("DOP limitation without DOP").index()];
                let mut selected = Mask3::from_elem(po4.dim(), false);
                let mut limit = Field3::zeros(po4.dim());
                for ((i, j, k), value) in limit.indexed_iter_mut() {
                    let lim_po4 = saturation(
                        po4[[i, j, k]],
                        params.saturation_constant_n * params.redfield_ratio_pn,
                    );
                    let lim_dop = params.hdop
                        * saturation(
                            dop[[i, j, k]],
                            params.saturation_constant_n / params.redfield_ratio_pn,
                        );
                    if lim_dop > lim_po4 {
                        selected[[i, j, k]] = true;
                        *value = lim_dop;
                    } else {
                        *value = lim_po4;
                    }
                }
                *dop_selected = Some(selected);
                limit
            }
            Limitation::DopOrPhosphateCocco => {
                let dop = &working[ids.dop.expect("DOP limitation without DOP").index()];
                let mut limit = Field3::zeros(po4.dim());
                for ((i, j, k), value) in limit.indexed_iter_mut() {
                    let lim_po4 = saturation(
                        po4[[i, j, k]],
                        params.saturation_constant_nc * params.redfield_ratio_pn,
                    );
                    let lim_dop = params.hdop
                        * saturation(
                            dop[[i, j, k]],
                            params.saturation_constant_nc / params.redfield_ratio_pn,
                        );
                    *value = lim_dop.max(lim_po4);
                }
                limit
            }
        }
    }
}

/// Realized net primary production of one plankton type for a sub-step:
/// the minimum of the light-limited day-averaged growth and the
/// nutrient-limited maximum, gated by the plankton and phosphate validity
/// flags.
pub(crate) fn net_primary_production(
    jmax: &Field3,
    avej: &Field3,
    limit: &Field3,
    concentration: &Field3,
    plankton_flag: &Mask3,
    po4_flag: &Mask3,
) -> Field3 {
    let mut npp = Array3::zeros(concentration.dim());
    for ((i, j, k), value) in npp.indexed_iter_mut() {
        if plankton_flag[[i, j, k]] && po4_flag[[i, j, k]] {
            *value = avej[[i, j, k]]
                .min(limit[[i, j, k]] * jmax[[i, j, k]])
                * concentration[[i, j, k]];
        }
    }
    npp
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn phi_is_monotone() {
        assert!(phi(0.5) < phi(1.0));
        assert!(phi(1.0) < phi(5.0));
    }

    #[test]
    fn saturation_is_half_at_constant() {
        assert_relative_eq!(saturation(0.7, 0.7), 0.5);
        assert_relative_eq!(saturation(0.0, 0.7), 0.0);
    }

    #[test]
    fn no_production_where_flags_are_false() {
        let dim = (1, 1, 2);
        let ones = Field3::from_elem(dim, 1.0);
        let flags_on = Mask3::from_elem(dim, true);
        let flags_off = Mask3::from_elem(dim, false);

        let npp = net_primary_production(&ones, &ones, &ones, &ones, &flags_off, &flags_on);
        assert_eq!(npp.iter().copied().sum::<f64>(), 0.0);

        let npp = net_primary_production(&ones, &ones, &ones, &ones, &flags_on, &flags_on);
        assert!(npp.iter().all(|&v| v > 0.0));
    }

    #[test]
    fn production_takes_the_weaker_of_light_and_nutrients() {
        let dim = (1, 1, 1);
        let jmax = Field3::from_elem(dim, 2.0);
        let avej = Field3::from_elem(dim, 1.5);
        let limit = Field3::from_elem(dim, 0.25); // nutrient-limited: 0.5
        let conc = Field3::from_elem(dim, 1.0);
        let flags = Mask3::from_elem(dim, true);

        let npp = net_primary_production(&jmax, &avej, &limit, &conc, &flags, &flags);
        assert_relative_eq!(npp[[0, 0, 0]], 0.5);
    }
}
