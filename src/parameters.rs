//! NPZD model parameters.
//!
//! All rate parameters are stored in per-second units so they combine directly
//! with the model timesteps; the documented defaults are quoted per day where
//! that is the conventional unit in the literature.

use serde::{Deserialize, Serialize};

use crate::errors::BgcResult;

const SECONDS_PER_DAY: f64 = 86400.0;

/// Parameters for the NPZD reaction network and its vertical transport.
///
/// Tracer currencies follow the usual convention: plankton and detritus are
/// carried in nitrogen units (mmol N / m^3), phosphate in phosphorus units
/// (mmol P / m^3), with [`redfield_ratio_pn`](Self::redfield_ratio_pn)
/// converting between the two and
/// [`redfield_ratio_cn`](Self::redfield_ratio_cn) converting to carbon when
/// the carbon extension is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NpzdParameters {
    /// Outer tracer timestep (s). The transport driver advances one such step
    /// per call. Default: 86400 s.
    pub dt_tracer: f64,
    /// Biogeochemistry sub-timestep (s). The reaction integrator performs
    /// `floor(dt_tracer / dt_bio)` sub-steps per outer step. Default: 3600 s.
    pub dt_bio: f64,
    /// Minimum tracer concentration. Working values are clamped to this floor
    /// wherever their validity flag is false. Default: 1e-13.
    pub trcmin: f64,

    /// Base of the Eppley temperature response `bbio^(cbio * T)`.
    /// Default: 1.066.
    pub bbio: f64,
    /// Exponent scale of the Eppley temperature response (1/degC).
    /// Default: 1.0.
    pub cbio: f64,
    /// Maximum phytoplankton growth parameter at 0 degC (1/s).
    /// Default: 0.6/day.
    pub abio_p: f64,
    /// Maximum coccolithophore growth parameter at 0 degC (1/s).
    /// Default: 0.52/day.
    pub abio_c: f64,
    /// Maximum zooplankton grazing rate at 0 degC (1/s). Default: 0.1/day.
    pub gbio: f64,
    /// Temperature cap (degC) on the grazing temperature response.
    /// Default: 20.0.
    pub zooplankton_max_growth_temp: f64,

    /// Half-saturation constant for nitrogen uptake (mmol N / m^3).
    /// Default: 0.7.
    pub saturation_constant_n: f64,
    /// Half-saturation constant for coccolithophore nitrogen uptake
    /// (mmol N / m^3). Default: 0.5.
    pub saturation_constant_nc: f64,
    /// Half-saturation constant for zooplankton grazing (mmol N / m^3).
    /// Default: 0.15.
    pub saturation_constant_z_grazing: f64,
    /// Redfield P:N ratio. Default: 1/16.
    pub redfield_ratio_pn: f64,
    /// Redfield C:N ratio. Default: 7.1.
    pub redfield_ratio_cn: f64,

    /// Fraction of grazed material actually digested by zooplankton; the
    /// remainder is lost as sloppy feeding. Default: 0.7.
    pub assimilation_efficiency: f64,
    /// Fraction of digested material converted to zooplankton growth; the
    /// remainder is excreted. Default: 0.7.
    pub zooplankton_growth_efficiency: f64,
    /// Quadratic zooplankton mortality coefficient (1/s per mmol N / m^3).
    /// Default: 0.06/day.
    pub quadric_mortality_zooplankton: f64,
    /// Linear phytoplankton mortality rate (1/s). Default: 0.03/day.
    pub specific_mortality_phytoplankton: f64,
    /// Fast recycling rate of phytoplankton at 0 degC (1/s).
    /// Default: 0.02/day.
    pub nupt0: f64,
    /// Detritus remineralization rate at 0 degC (1/s). Default: 0.07/day.
    pub nud0: f64,

    /// Detritus sinking speed at the surface (m/s). Default: 7 m/day.
    pub wd0: f64,
    /// Increase of detritus sinking speed with depth (1/s).
    /// Default: 0.02/day.
    pub mw: f64,
    /// Depth below which sinking speed stops increasing (m). Default: 1000.
    pub mwz: f64,

    /// Light attenuation of sea water (1/m). Default: 0.04.
    pub light_attenuation_water: f64,
    /// Light attenuation per unit phytoplankton (1/m per mmol N / m^3).
    /// Default: 0.047.
    pub light_attenuation_phytoplankton: f64,
    /// Additional dimensionless light attenuation under sea ice. Default: 5.0.
    pub light_attenuation_ice: f64,
    /// Floor on the light saturation argument in the day-averaged growth
    /// integral. Default: 1e-6.
    pub u1_min: f64,

    /// Unnormalized zooplankton grazing preference for phytoplankton.
    /// Default: 0.35.
    pub zprefp: f64,
    /// Unnormalized zooplankton preference for self-predation. Default: 0.35.
    pub zprefz: f64,
    /// Unnormalized zooplankton preference for detritus. Default: 0.30.
    pub zprefdet: f64,
    /// Unnormalized zooplankton preference for coccolithophores.
    /// Default: 0.10.
    pub zprefc: f64,
    /// Unnormalized zooplankton preference for diazotrophs. Default: 0.10.
    pub zprefd: f64,

    /// Calcite production fraction of primary-producer losses. Default: 0.022.
    pub capr: f64,
    /// E-folding depth of the calcite dissolution profile (m). Default: 3500.
    pub dcaco3: f64,
    /// Calcite sinking speed at the surface (m/s). Default: 30 m/day.
    pub wc0: f64,
    /// Increase of calcite sinking speed with depth (1/s). Default: 0.03/day.
    pub mw_c: f64,

    /// Diazotroph growth handicap relative to phytoplankton. Default: 0.5.
    pub jdiar: f64,
    /// Minimum temperature factor for diazotroph growth; growth is zero where
    /// `bbio^(cbio*T)` falls below this value. Default: 2.6.
    pub bct_min_diaz: f64,
    /// Floor on the diazotroph growth bound (1/s). Default: 1e-14.
    pub gd_min_diaz: f64,
    /// Handicap on growth fuelled by dissolved organic phosphate.
    /// Default: 0.4.
    pub hdop: f64,
    /// Linear diazotroph mortality rate (1/s). Default: 0.025/day.
    pub specific_mortality_diazotroph: f64,
    /// Fast recycling rate of diazotrophs at 0 degC (1/s). Default: 0.01/day.
    pub nupt0_d: f64,
    /// Remineralization rate of DOP at 0 degC (1/s). Default: 0.001/day.
    pub nudop0: f64,
    /// Remineralization rate of DON at 0 degC (1/s). Default: 0.001/day.
    pub nudon0: f64,

    /// Linear coccolithophore mortality rate (1/s). Default: 0.03/day.
    pub specific_mortality_coccolitophore: f64,
    /// Fast recycling rate of coccolithophores at 0 degC (1/s).
    /// Default: 0.02/day.
    pub nuct0: f64,

    /// Adams-Bashforth off-centering for the advection extrapolation.
    /// Default: 0.1.
    pub ab_eps: f64,
    /// Add the externally computed horizontal diffusion rate during transport.
    pub enable_horizontal_diffusion: bool,
    /// Add the externally computed biharmonic mixing rate during transport.
    pub enable_biharmonic_mixing: bool,
    /// Add the externally computed isoneutral diffusion rate during transport.
    pub enable_neutral_diffusion: bool,
    /// Add the externally computed skew diffusion rate during transport.
    /// Only honoured when neutral diffusion is enabled as well.
    pub enable_skew_diffusion: bool,
}

impl Default for NpzdParameters {
    fn default() -> Self {
        Self {
            dt_tracer: 86400.0,
            dt_bio: 3600.0,
            trcmin: 1e-13,
            bbio: 1.066,
            cbio: 1.0,
            abio_p: 0.6 / SECONDS_PER_DAY,
            abio_c: 0.52 / SECONDS_PER_DAY,
            gbio: 0.1 / SECONDS_PER_DAY,
            zooplankton_max_growth_temp: 20.0,
            saturation_constant_n: 0.7,
            saturation_constant_nc: 0.5,
            saturation_constant_z_grazing: 0.15,
            redfield_ratio_pn: 1.0 / 16.0,
            redfield_ratio_cn: 7.1,
            assimilation_efficiency: 0.7,
            zooplankton_growth_efficiency: 0.7,
            quadric_mortality_zooplankton: 0.06 / SECONDS_PER_DAY,
            specific_mortality_phytoplankton: 0.03 / SECONDS_PER_DAY,
            nupt0: 0.02 / SECONDS_PER_DAY,
            nud0: 0.07 / SECONDS_PER_DAY,
            wd0: 7.0 / SECONDS_PER_DAY,
            mw: 0.02 / SECONDS_PER_DAY,
            mwz: 1000.0,
            light_attenuation_water: 0.04,
            light_attenuation_phytoplankton: 0.047,
            light_attenuation_ice: 5.0,
            u1_min: 1e-6,
            zprefp: 0.35,
            zprefz: 0.35,
            zprefdet: 0.30,
            zprefc: 0.10,
            zprefd: 0.10,
            capr: 0.022,
            dcaco3: 3500.0,
            wc0: 30.0 / SECONDS_PER_DAY,
            mw_c: 0.03 / SECONDS_PER_DAY,
            jdiar: 0.5,
            bct_min_diaz: 2.6,
            gd_min_diaz: 1e-14,
            hdop: 0.4,
            specific_mortality_diazotroph: 0.025 / SECONDS_PER_DAY,
            nupt0_d: 0.01 / SECONDS_PER_DAY,
            nudop0: 0.001 / SECONDS_PER_DAY,
            nudon0: 0.001 / SECONDS_PER_DAY,
            specific_mortality_coccolitophore: 0.03 / SECONDS_PER_DAY,
            nuct0: 0.02 / SECONDS_PER_DAY,
            ab_eps: 0.1,
            enable_horizontal_diffusion: false,
            enable_biharmonic_mixing: false,
            enable_neutral_diffusion: false,
            enable_skew_diffusion: false,
        }
    }
}

impl NpzdParameters {
    /// Parse parameters from a TOML document. Missing keys take their
    /// defaults.
    pub fn from_toml_str(input: &str) -> BgcResult<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Number of biogeochemistry sub-steps per outer tracer step.
    pub fn substeps(&self) -> usize {
        (self.dt_tracer / self.dt_bio).floor() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_are_sensible() {
        let params = NpzdParameters::default();
        assert_eq!(params.substeps(), 24);
        assert_relative_eq!(params.redfield_ratio_pn, 0.0625);
        assert!(params.trcmin > 0.0);
        assert!(params.assimilation_efficiency <= 1.0);
    }

    #[test]
    fn toml_overrides_defaults() {
        let params = NpzdParameters::from_toml_str(
            r#"
            dt_tracer = 43200.0
            dt_bio = 1800.0
            bbio = 1.1
            "#,
        )
        .unwrap();
        assert_eq!(params.substeps(), 24);
        assert_relative_eq!(params.bbio, 1.1);
        // Untouched keys keep their defaults
        assert_relative_eq!(params.cbio, 1.0);
    }

    #[test]
    fn invalid_toml_is_a_configuration_error() {
        assert!(NpzdParameters::from_toml_str("dt_tracer = \"fast\"").is_err());
    }

    #[test]
    fn serde_round_trip() {
        let params = NpzdParameters::default();
        let json = serde_json::to_string(&params).unwrap();
        let back: NpzdParameters = serde_json::from_str(&json).unwrap();
        assert_relative_eq!(back.gbio, params.gbio);
        assert_relative_eq!(back.dcaco3, params.dcaco3);
    }
}
