//! Multi-prey zooplankton grazing.
//!
//! Preference-weighted Holling type II saturation kinetics: every registered
//! prey contributes to a common prey-availability pool, and each prey is
//! ingested in proportion to its preference weight. Grazing splits into the
//! digested fraction (available for zooplankton growth), excretion and the
//! ungrazed remainder lost as sloppy feeding. All four flux sets are valid
//! for the current sub-step only.

use crate::grid::{Field3, Mask3};
use crate::parameters::NpzdParameters;
use crate::tracer::TracerId;

/// Per-prey grazing fluxes for one sub-step, indexed by tracer arena slot.
#[derive(Debug)]
pub struct GrazingFluxes {
    pub grazing: Vec<Option<Field3>>,
    pub digestion: Vec<Option<Field3>>,
    pub excretion: Vec<Option<Field3>>,
    pub sloppy_feeding: Vec<Option<Field3>>,
    /// Sum of excretion over all prey.
    pub excretion_total: Field3,
}

impl GrazingFluxes {
    fn field<'a>(slot: &'a [Option<Field3>], prey: TracerId, what: &str) -> &'a Field3 {
        slot[prey.index()]
            .as_ref()
            .unwrap_or_else(|| panic!("no {what} flux for tracer {}: not a registered prey", prey.index()))
    }

    pub fn grazing_of(&self, prey: TracerId) -> &Field3 {
        Self::field(&self.grazing, prey, "grazing")
    }

    pub fn digestion_of(&self, prey: TracerId) -> &Field3 {
        Self::field(&self.digestion, prey, "digestion")
    }

    pub fn sloppy_feeding_of(&self, prey: TracerId) -> &Field3 {
        Self::field(&self.sloppy_feeding, prey, "sloppy feeding")
    }
}

/// Compute the grazing, digestion, excretion and sloppy-feeding fluxes for
/// every registered prey.
///
/// `preferences` carries normalized weights summing to one; `gmax` is the
/// temperature-limited maximum grazing rate from the light environment.
pub fn zooplankton_grazing(
    params: &NpzdParameters,
    preferences: &[(TracerId, f64)],
    zooplankton: TracerId,
    working: &[Field3],
    flags: &[Mask3],
    gmax: &Field3,
    tracer_count: usize,
) -> GrazingFluxes {
    let dim = gmax.dim();

    // Total prey availability, saturated so the denominator never vanishes.
    let mut theta_z = Field3::from_elem(
        dim,
        params.saturation_constant_z_grazing * params.redfield_ratio_pn,
    );
    for &(prey, weight) in preferences {
        let concentration = &working[prey.index()];
        for ((i, j, k), value) in theta_z.indexed_iter_mut() {
            *value += weight * concentration[[i, j, k]];
        }
    }

    let mut fluxes = GrazingFluxes {
        grazing: vec![None; tracer_count],
        digestion: vec![None; tracer_count],
        excretion: vec![None; tracer_count],
        sloppy_feeding: vec![None; tracer_count],
        excretion_total: Field3::zeros(dim),
    };

    let zoo = &working[zooplankton.index()];
    let zoo_flag = &flags[zooplankton.index()];
    for &(prey, weight) in preferences {
        let concentration = &working[prey.index()];
        let prey_flag = &flags[prey.index()];

        let mut grazing = Field3::zeros(dim);
        let mut digestion = Field3::zeros(dim);
        let mut excretion = Field3::zeros(dim);
        let mut sloppy = Field3::zeros(dim);
        for ((i, j, k), value) in grazing.indexed_iter_mut() {
            if prey_flag[[i, j, k]] && zoo_flag[[i, j, k]] {
                let ingestion = weight / theta_z[[i, j, k]];
                *value = gmax[[i, j, k]]
                    * ingestion
                    * concentration[[i, j, k]]
                    * zoo[[i, j, k]];
            }
            let digested = params.assimilation_efficiency * *value;
            digestion[[i, j, k]] = digested;
            excretion[[i, j, k]] = (1.0 - params.zooplankton_growth_efficiency) * digested;
            sloppy[[i, j, k]] = *value - digested;
            fluxes.excretion_total[[i, j, k]] += excretion[[i, j, k]];
        }

        fluxes.grazing[prey.index()] = Some(grazing);
        fluxes.digestion[prey.index()] = Some(digestion);
        fluxes.excretion[prey.index()] = Some(excretion);
        fluxes.sloppy_feeding[prey.index()] = Some(sloppy);
    }

    fluxes
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn setup(
        prey_conc: f64,
        zoo_conc: f64,
    ) -> (NpzdParameters, Vec<Field3>, Vec<Mask3>, Field3) {
        let params = NpzdParameters::default();
        let dim = (1, 1, 2);
        let working = vec![
            Field3::from_elem(dim, prey_conc),
            Field3::from_elem(dim, zoo_conc),
        ];
        let flags = vec![Mask3::from_elem(dim, true), Mask3::from_elem(dim, true)];
        let gmax = Field3::from_elem(dim, params.gbio);
        (params, working, flags, gmax)
    }

    #[test]
    fn grazing_splits_into_digestion_and_sloppy_feeding() {
        let (params, working, flags, gmax) = setup(0.4, 0.1);
        let prey = TracerId(0);
        let zoo = TracerId(1);
        let preferences = vec![(prey, 0.6), (zoo, 0.4)];

        let fluxes =
            zooplankton_grazing(&params, &preferences, zoo, &working, &flags, &gmax, 2);

        for id in [prey, zoo] {
            let grazing = fluxes.grazing_of(id);
            let digestion = fluxes.digestion_of(id);
            let sloppy = fluxes.sloppy_feeding_of(id);
            for idx in [[0, 0, 0], [0, 0, 1]] {
                assert_relative_eq!(
                    grazing[idx],
                    digestion[idx] + sloppy[idx],
                    max_relative = 1e-14
                );
                assert_relative_eq!(
                    digestion[idx],
                    params.assimilation_efficiency * grazing[idx],
                    max_relative = 1e-14
                );
            }
        }
    }

    #[test]
    fn no_grazing_without_valid_prey() {
        let (params, working, mut flags, gmax) = setup(0.4, 0.1);
        let prey = TracerId(0);
        let zoo = TracerId(1);
        flags[0].fill(false);
        let preferences = vec![(prey, 1.0)];

        let fluxes =
            zooplankton_grazing(&params, &preferences, zoo, &working, &flags, &gmax, 2);
        assert_eq!(fluxes.grazing_of(prey).iter().copied().sum::<f64>(), 0.0);
    }

    #[test]
    fn ingestion_saturates_with_prey_availability() {
        let prey = TracerId(0);
        let zoo = TracerId(1);
        let preferences = vec![(prey, 1.0)];

        let (params, sparse, flags, gmax) = setup(0.1, 0.1);
        let lean = zooplankton_grazing(&params, &preferences, zoo, &sparse, &flags, &gmax, 2);
        let (_, dense, ..) = setup(10.0, 0.1);
        let rich = zooplankton_grazing(&params, &preferences, zoo, &dense, &flags, &gmax, 2);

        // Per-unit-prey grazing drops as the pool saturates.
        let lean_rate = lean.grazing_of(prey)[[0, 0, 0]] / 0.1;
        let rich_rate = rich.grazing_of(prey)[[0, 0, 0]] / 10.0;
        assert!(rich_rate < lean_rate);
    }
}
