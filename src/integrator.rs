//! Sub-stepped integration of the reaction network.
//!
//! One outer tracer step runs as an explicit phase sequence: pre rules are
//! applied once, the primary rules and sinking are integrated over
//! `dt_tracer / dt_bio` forward-Euler sub-steps, and post rules are applied
//! once at the end. [`ReactionStepper`] exposes the phases one at a time so a
//! caller can inspect intermediate state; [`biogeochemistry`] drives a whole
//! step in one call.
//!
//! Every sub-step starts by refreshing the validity flags: a tracer
//! participates in a reaction at a grid cell only while its working value
//! exceeds the floor there. Every sub-step ends by clamping the working
//! values back onto the floor over wet cells, and tracers touched by post
//! rules are re-floored afterwards, so concentrations leave the step at or
//! above the floor everywhere. Process rates are always evaluated from the
//! working values of the current sub-step and applied together, so rule
//! order within a phase cannot change the result.

use ndarray::Array2;

use crate::errors::{BgcError, BgcResult};
use crate::grazing::{zooplankton_grazing, GrazingFluxes};
use crate::grid::{Field3, Forcing, Grid, Mask3};
use crate::growth::net_primary_production;
use crate::light::{evaluate_light, LightEnvironment};
use crate::rules::{Boundary, ReactionKind, Rule};
use crate::setup::{NpzdModel, PlanktonEntry};
use crate::sinking::{sinking_fluxes, SinkingFluxes};
use crate::tracer::{Mortality, TracerId};

/// Phase most recently completed by a [`ReactionStepper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    /// Working copies prepared, nothing executed yet.
    Init,
    /// Pre rules applied and the light environment evaluated.
    Pre,
    /// The given number of sub-steps completed (1-based).
    Substep(usize),
    /// Post rules applied.
    Post,
    /// The step is finished and the result can be taken.
    Done,
}

/// Outcome of one outer reaction step.
#[derive(Debug)]
pub struct StepResult {
    /// Per-tracer concentration change over the outer step, in registration
    /// order. Includes the lift onto the tracer floor where the input was
    /// below it.
    pub increments: Vec<Field3>,
    /// Depth-integrated detritus export through the sea floor over the outer
    /// step (mmol N / m^2).
    pub detritus_export: Array2<f64>,
}

/// Process rates of one sub-step, shared by every primary rule.
pub(crate) struct ReactionRates {
    /// Net primary production per plankton tracer (own currency / s).
    npp: Vec<Option<Field3>>,
    /// Temperature-scaled fast recycling per recycling tracer.
    recycled: Vec<Option<Field3>>,
    /// Mortality loss per plankton tracer with a mortality policy.
    mortality: Vec<Option<Field3>>,
    grazing: GrazingFluxes,
    sinking: Vec<Option<SinkingFluxes>>,
    /// Cells where the colimitation selection picked DOP over phosphate.
    dop_consumption: Option<Mask3>,
    /// Calcite production rate (mmol C / m^3 / s), present with a calcite
    /// tracer.
    dprca: Option<Field3>,
}

impl ReactionRates {
    fn npp_of(&self, id: TracerId) -> &Field3 {
        self.npp[id.index()]
            .as_ref()
            .expect("production rule names a tracer without a growth function")
    }

    fn recycled_of(&self, id: TracerId) -> &Field3 {
        self.recycled[id.index()]
            .as_ref()
            .expect("recycling rule names a tracer without a recycling rate")
    }

    fn mortality_of(&self, id: TracerId) -> &Field3 {
        self.mortality[id.index()]
            .as_ref()
            .expect("mortality rule names a tracer without a mortality policy")
    }

    fn export_of(&self, id: TracerId) -> &Field3 {
        &self.sinking[id.index()]
            .as_ref()
            .expect("bottom remineralization names a tracer without a sinking speed")
            .export
    }

    fn dprca(&self) -> &Field3 {
        self.dprca
            .as_ref()
            .expect("calcite rule selected without a calcite tracer")
    }
}

/// Drives one outer reaction step phase by phase.
pub struct ReactionStepper<'a> {
    model: &'a NpzdModel,
    grid: &'a Grid,
    forcing: Forcing<'a>,
    /// Working concentrations, floored over wet cells and zero on land.
    working: Vec<Field3>,
    /// Input concentrations, kept to express the result as increments.
    initial: Vec<Field3>,
    /// DIC after the pre phase, the reference for the alkalinity coupling.
    dic_reference: Option<Field3>,
    env: Option<LightEnvironment>,
    phase: StepPhase,
    detritus_export: Array2<f64>,
}

impl<'a> ReactionStepper<'a> {
    /// Prepare a step from the tracer concentrations at the current time
    /// level, given in registration order.
    pub fn new(
        model: &'a NpzdModel,
        grid: &'a Grid,
        forcing: Forcing<'a>,
        concentrations: &[Field3],
    ) -> Self {
        let initial: Vec<Field3> = concentrations.to_vec();
        let mut working = initial.clone();
        clamp_to_floor(&mut working, grid, model.params.trcmin);
        Self {
            model,
            grid,
            forcing,
            working,
            initial,
            dic_reference: None,
            env: None,
            phase: StepPhase::Init,
            detritus_export: Array2::zeros((grid.nx, grid.ny)),
        }
    }

    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    /// Working concentration of one tracer in the current phase.
    pub fn working(&self, id: TracerId) -> &Field3 {
        &self.working[id.index()]
    }

    /// Execute the next phase and report it.
    pub fn advance(&mut self) -> BgcResult<StepPhase> {
        let substeps = self.model.params.substeps();
        self.phase = match self.phase {
            StepPhase::Init => {
                self.apply_pre_rules()?;
                self.env = Some(evaluate_light(
                    &self.model.params,
                    self.grid,
                    &self.forcing,
                    &self.model.tracers,
                    &self.working,
                ));
                self.dic_reference = self
                    .model
                    .ids
                    .dic
                    .map(|dic| self.working[dic.index()].clone());
                StepPhase::Pre
            }
            StepPhase::Pre if substeps == 0 => {
                self.apply_post_rules();
                StepPhase::Post
            }
            StepPhase::Pre => {
                self.substep();
                StepPhase::Substep(1)
            }
            StepPhase::Substep(done) if done < substeps => {
                self.substep();
                StepPhase::Substep(done + 1)
            }
            StepPhase::Substep(_) => {
                self.apply_post_rules();
                StepPhase::Post
            }
            StepPhase::Post => StepPhase::Done,
            StepPhase::Done => StepPhase::Done,
        };
        Ok(self.phase)
    }

    /// Express the final working values as increments over the input.
    pub fn into_result(self) -> StepResult {
        debug_assert_eq!(self.phase, StepPhase::Done, "step is not finished");
        let increments = self
            .working
            .into_iter()
            .zip(self.initial)
            .map(|(after, before)| after - before)
            .collect();
        StepResult {
            increments,
            detritus_export: self.detritus_export,
        }
    }

    /// Pre rules apply absolute per-outer-step amounts.
    fn apply_pre_rules(&mut self) -> BgcResult<()> {
        let params = &self.model.params;
        let surface = self.grid.surface();
        for rule in self.model.rules.pre_rules() {
            match rule.kind {
                ReactionKind::Co2SurfaceFlux => {
                    let flux = self
                        .forcing
                        .carbon_flux
                        .ok_or(BgcError::MissingCarbonFlux)?;
                    let target = &mut self.working[rule.destination.index()];
                    for i in 0..self.grid.nx {
                        for j in 0..self.grid.ny {
                            if self.grid.mask[[i, j, surface]]
                                && in_boundary(self.grid, rule.boundary, i, j, surface)
                            {
                                target[[i, j, surface]] +=
                                    flux[[i, j]] * params.dt_tracer / self.grid.dzt[surface];
                            }
                        }
                    }
                }
                ReactionKind::ResetCalcite => {
                    let target = &mut self.working[rule.source.index()];
                    for ((i, j, k), value) in target.indexed_iter_mut() {
                        *value = if self.grid.mask[[i, j, k]] {
                            params.trcmin
                        } else {
                            0.0
                        };
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// One forward-Euler sub-step over the primary rules and sinking.
    fn substep(&mut self) {
        let params = &self.model.params;
        let flags = validity_flags(&self.working, self.grid, params.trcmin);

        let env = self
            .env
            .as_ref()
            .expect("light environment is evaluated in the pre phase");
        let rates = compute_rates(self.model, self.grid, env, &self.working, &flags);

        let dim = (self.grid.nx, self.grid.ny, self.grid.nz);
        let mut tendency: Vec<Field3> = (0..self.model.tracers.len())
            .map(|_| Field3::zeros(dim))
            .collect();
        for rule in self.model.rules.primary_rules() {
            apply_primary_rule(self.model, self.grid, rule, &rates, &mut tendency);
        }

        for (slot, contribution) in self.working.iter_mut().zip(&tendency) {
            slot.scaled_add(params.dt_bio, contribution);
        }
        for (slot, fluxes) in self.working.iter_mut().zip(&rates.sinking) {
            if let Some(fluxes) = fluxes {
                slot.scaled_add(params.dt_bio, &fluxes.divergence);
            }
        }
        if let Some(fluxes) = &rates.sinking[self.model.ids.detritus.index()] {
            self.detritus_export
                .scaled_add(params.dt_bio, &fluxes.bottom_export);
        }

        clamp_to_floor(&mut self.working, self.grid, params.trcmin);
    }

    /// Post rules apply absolute amounts from the integrated state.
    fn apply_post_rules(&mut self) {
        let params = &self.model.params;
        for rule in self.model.rules.post_rules() {
            match rule.kind {
                ReactionKind::DicAlkCoupling => {
                    let reference = self
                        .dic_reference
                        .as_ref()
                        .expect("alkalinity coupling selected without a DIC tracer");
                    let delta = &self.working[rule.source.index()] - reference;
                    let target = &mut self.working[rule.destination.index()];
                    for ((i, j, k), value) in target.indexed_iter_mut() {
                        if self.grid.mask[[i, j, k]]
                            && in_boundary(self.grid, rule.boundary, i, j, k)
                        {
                            *value -= delta[[i, j, k]] / params.redfield_ratio_cn;
                        }
                    }
                }
                ReactionKind::CalciteDissolution | ReactionKind::CalciteDissolutionAlk => {
                    let stoichiometry = match rule.kind {
                        // Dissolving calcite releases two equivalents per
                        // mol of carbonate.
                        ReactionKind::CalciteDissolutionAlk => 2.0,
                        _ => 1.0,
                    };
                    let collected = collected_calcite(
                        self.grid,
                        &self.working[rule.source.index()],
                        params.trcmin,
                    );
                    let rcak = self
                        .model
                        .rcak
                        .as_ref()
                        .expect("calcite dissolution selected without a dissolution profile");
                    let target = &mut self.working[rule.destination.index()];
                    for ((i, j, k), value) in target.indexed_iter_mut() {
                        if in_boundary(self.grid, rule.boundary, i, j, k) {
                            *value += stoichiometry * collected[[i, j]] * rcak[[i, j, k]];
                        }
                    }
                }
                _ => {}
            }
        }

        // Re-floor only the tracers the post rules wrote to.
        for rule in self.model.rules.post_rules() {
            clamp_field(
                &mut self.working[rule.destination.index()],
                self.grid,
                params.trcmin,
            );
        }
    }
}

/// Run a whole outer reaction step.
pub fn biogeochemistry(
    model: &NpzdModel,
    grid: &Grid,
    forcing: Forcing,
    concentrations: &[Field3],
) -> BgcResult<StepResult> {
    let mut stepper = ReactionStepper::new(model, grid, forcing, concentrations);
    while stepper.phase() != StepPhase::Done {
        stepper.advance()?;
    }
    Ok(stepper.into_result())
}

/// Clamp one field onto the tracer floor over wet cells and zero it on land.
fn clamp_field(field: &mut Field3, grid: &Grid, trcmin: f64) {
    for ((i, j, k), value) in field.indexed_iter_mut() {
        *value = if grid.mask[[i, j, k]] {
            value.max(trcmin)
        } else {
            0.0
        };
    }
}

/// Clamp every working value onto the tracer floor.
fn clamp_to_floor(working: &mut [Field3], grid: &Grid, trcmin: f64) {
    for field in working {
        clamp_field(field, grid, trcmin);
    }
}

/// A tracer participates in reactions only where it strictly exceeds the
/// floor.
fn validity_flags(working: &[Field3], grid: &Grid, trcmin: f64) -> Vec<Mask3> {
    working
        .iter()
        .map(|field| {
            let mut flag = grid.mask.clone();
            for ((i, j, k), value) in flag.indexed_iter_mut() {
                *value = *value && field[[i, j, k]] > trcmin;
            }
            flag
        })
        .collect()
}

fn in_boundary(grid: &Grid, boundary: Boundary, i: usize, j: usize, k: usize) -> bool {
    match boundary {
        Boundary::Volume => true,
        Boundary::Surface => k == grid.surface(),
        Boundary::Bottom => grid.bottom_mask[[i, j, k]],
    }
}

/// Add `scale * source` into `target` over the rule's boundary.
fn deposit(target: &mut Field3, source: &Field3, scale: f64, boundary: Boundary, grid: &Grid) {
    for ((i, j, k), value) in target.indexed_iter_mut() {
        if in_boundary(grid, boundary, i, j, k) {
            *value += scale * source[[i, j, k]];
        }
    }
}

/// Evaluate every process rate the primary rules can reference, from the
/// working values of the current sub-step.
fn compute_rates(
    model: &NpzdModel,
    grid: &Grid,
    env: &LightEnvironment,
    working: &[Field3],
    flags: &[Mask3],
) -> ReactionRates {
    let params = &model.params;
    let count = model.tracers.len();
    let dim = (grid.nx, grid.ny, grid.nz);

    let mut npp: Vec<Option<Field3>> = vec![None; count];
    let mut dop_consumption = None;
    for entry in &model.plankton {
        let (jmax, avej) = entry.growth.evaluate(params, env);
        let limit = combined_limitation(model, entry, working, &mut dop_consumption);
        npp[entry.tracer.index()] = Some(net_primary_production(
            &jmax,
            &avej,
            &limit,
            &working[entry.tracer.index()],
            &flags[entry.tracer.index()],
            &flags[model.ids.po4.index()],
        ));
    }

    let mut recycled: Vec<Option<Field3>> = vec![None; count];
    let mut mortality: Vec<Option<Field3>> = vec![None; count];
    for (id, descriptor) in model.tracers.iter() {
        let concentration = &working[id.index()];
        let flag = &flags[id.index()];
        if let Some(rate) = descriptor.recycling_rate {
            let mut field = Field3::zeros(dim);
            for ((i, j, k), value) in field.indexed_iter_mut() {
                if flag[[i, j, k]] {
                    *value = rate * env.bct[[i, j, k]] * concentration[[i, j, k]];
                }
            }
            recycled[id.index()] = Some(field);
        }
        if let Some(policy) = descriptor.mortality {
            let mut field = Field3::zeros(dim);
            for ((i, j, k), value) in field.indexed_iter_mut() {
                if flag[[i, j, k]] {
                    *value = match policy {
                        Mortality::Linear(rate) => rate * concentration[[i, j, k]],
                        Mortality::Quadratic(rate) => {
                            rate * concentration[[i, j, k]] * concentration[[i, j, k]]
                        }
                    };
                }
            }
            mortality[id.index()] = Some(field);
        }
    }

    let grazing = zooplankton_grazing(
        params,
        &model.preferences,
        model.ids.zooplankton,
        working,
        flags,
        &env.gmax,
        count,
    );
    let sinking = sinking_fluxes(grid, &model.tracers, working, flags);

    // Calcite production tracks the detritus production of the calcifying
    // producer.
    let dprca = model.ids.caco3.map(|_| {
        let producer = model
            .ids
            .coccolitophore
            .unwrap_or(model.ids.phytoplankton);
        let mut field = Field3::zeros(dim);
        let losses = mortality[producer.index()].as_ref();
        let sloppy = grazing.sloppy_feeding[producer.index()].as_ref();
        for ((i, j, k), value) in field.indexed_iter_mut() {
            let mut loss = 0.0;
            if let Some(losses) = losses {
                loss += losses[[i, j, k]];
            }
            if let Some(sloppy) = sloppy {
                loss += sloppy[[i, j, k]];
            }
            *value = params.capr * params.redfield_ratio_cn * loss;
        }
        field
    });

    ReactionRates {
        npp,
        recycled,
        mortality,
        grazing,
        sinking,
        dop_consumption,
        dprca,
    }
}

/// Per-cell nutrient limitation of one plankton type: the minimum over its
/// limitation terms, starting from one so a handicapped term above unity can
/// never raise growth beyond the light-saturated bound.
fn combined_limitation(
    model: &NpzdModel,
    entry: &PlanktonEntry,
    working: &[Field3],
    dop_consumption: &mut Option<Mask3>,
) -> Field3 {
    let mut limit = Field3::from_elem(working[0].dim(), 1.0);
    for limitation in &entry.limits {
        let term = limitation.evaluate(&model.params, working, &model.ids, dop_consumption);
        ndarray::Zip::from(&mut limit)
            .and(&term)
            .for_each(|u, &t| *u = u.min(t));
    }
    limit
}

/// Interpret one primary rule, adding its contributions to the per-tracer
/// tendencies. Fluxes are converted from the currency of the tracer whose
/// rate they come from into the currency of the pool they are deposited in.
fn apply_primary_rule(
    model: &NpzdModel,
    grid: &Grid,
    rule: &Rule,
    rates: &ReactionRates,
    tendency: &mut [Field3],
) {
    let params = &model.params;
    let convert = |from: TracerId, to: TracerId| {
        model
            .tracers
            .get(from)
            .currency
            .conversion(model.tracers.get(to).currency, params)
    };
    let s = rule.source;
    let d = rule.destination;

    match rule.kind {
        ReactionKind::PrimaryProduction => {
            let npp = rates.npp_of(d);
            deposit(&mut tendency[d.index()], npp, 1.0, rule.boundary, grid);
            deposit(
                &mut tendency[s.index()],
                npp,
                -convert(d, s),
                rule.boundary,
                grid,
            );
        }
        ReactionKind::PrimaryProductionDic | ReactionKind::PrimaryProductionNo3 => {
            let npp = rates.npp_of(d);
            deposit(
                &mut tendency[s.index()],
                npp,
                -convert(d, s),
                rule.boundary,
                grid,
            );
        }
        ReactionKind::PrimaryProductionSwitched => {
            let npp = rates.npp_of(d);
            deposit(&mut tendency[d.index()], npp, 1.0, rule.boundary, grid);
            let selection = rates
                .dop_consumption
                .as_ref()
                .expect("switched production without a recording colimitation");
            let dop = model
                .ids
                .dop
                .expect("switched production without a DOP tracer");
            let scale = convert(d, s);
            for ((i, j, k), &from_dop) in selection.indexed_iter() {
                if !in_boundary(grid, rule.boundary, i, j, k) {
                    continue;
                }
                let debit = scale * npp[[i, j, k]];
                if from_dop {
                    tendency[dop.index()][[i, j, k]] -= debit;
                } else {
                    tendency[s.index()][[i, j, k]] -= debit;
                }
            }
        }
        ReactionKind::Grazing => {
            deposit(
                &mut tendency[s.index()],
                rates.grazing.grazing_of(s),
                -1.0,
                rule.boundary,
                grid,
            );
            deposit(
                &mut tendency[d.index()],
                rates.grazing.digestion_of(s),
                convert(s, d),
                rule.boundary,
                grid,
            );
        }
        ReactionKind::SelfGrazing => {
            deposit(
                &mut tendency[s.index()],
                rates.grazing.grazing_of(s),
                -1.0,
                rule.boundary,
                grid,
            );
            deposit(
                &mut tendency[s.index()],
                rates.grazing.digestion_of(s),
                1.0,
                rule.boundary,
                grid,
            );
        }
        ReactionKind::SloppyFeeding => {
            deposit(
                &mut tendency[d.index()],
                rates.grazing.sloppy_feeding_of(s),
                convert(s, d),
                rule.boundary,
                grid,
            );
        }
        ReactionKind::Mortality => {
            let loss = rates.mortality_of(s);
            deposit(&mut tendency[s.index()], loss, -1.0, rule.boundary, grid);
            deposit(
                &mut tendency[d.index()],
                loss,
                convert(s, d),
                rule.boundary,
                grid,
            );
        }
        ReactionKind::Recycling => {
            let recycled = rates.recycled_of(s);
            deposit(&mut tendency[s.index()], recycled, -1.0, rule.boundary, grid);
            deposit(
                &mut tendency[d.index()],
                recycled,
                convert(s, d),
                rule.boundary,
                grid,
            );
        }
        ReactionKind::RecyclingToDic | ReactionKind::RecyclingToNo3 => {
            deposit(
                &mut tendency[d.index()],
                rates.recycled_of(s),
                convert(s, d),
                rule.boundary,
                grid,
            );
        }
        ReactionKind::Excretion => {
            deposit(
                &mut tendency[s.index()],
                &rates.grazing.excretion_total,
                -1.0,
                rule.boundary,
                grid,
            );
            deposit(
                &mut tendency[d.index()],
                &rates.grazing.excretion_total,
                convert(s, d),
                rule.boundary,
                grid,
            );
        }
        ReactionKind::ExcretionDic | ReactionKind::ExcretionNo3 => {
            deposit(
                &mut tendency[d.index()],
                &rates.grazing.excretion_total,
                convert(s, d),
                rule.boundary,
                grid,
            );
        }
        ReactionKind::BottomRemineralization | ReactionKind::BottomRemineralizationDic => {
            deposit(
                &mut tendency[d.index()],
                rates.export_of(s),
                convert(s, d),
                rule.boundary,
                grid,
            );
        }
        ReactionKind::CalciteProduction => {
            let dprca = rates.dprca();
            deposit(&mut tendency[s.index()], dprca, -1.0, rule.boundary, grid);
            deposit(&mut tendency[d.index()], dprca, 1.0, rule.boundary, grid);
        }
        ReactionKind::CalciteProductionAlk => {
            // Two equivalents per mol of carbonate precipitated.
            deposit(
                &mut tendency[s.index()],
                rates.dprca(),
                -2.0,
                rule.boundary,
                grid,
            );
        }
        // The remaining kinds are interpreted by the pre or post phase.
        _ => {}
    }
}

/// Depth-integrated calcite collected during the step, above the floor the
/// pre phase reset the collector to.
fn collected_calcite(grid: &Grid, caco3: &Field3, trcmin: f64) -> Array2<f64> {
    let mut collected = Array2::zeros((grid.nx, grid.ny));
    for ((i, j, k), &value) in caco3.indexed_iter() {
        if grid.mask[[i, j, k]] {
            collected[[i, j]] += (value - trcmin).max(0.0) * grid.dzt[k];
        }
    }
    collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::growth::Limitation;
    use crate::setup::{configure, NpzdSettings};

    #[test]
    fn limitation_fold_is_capped_at_unity() {
        let grid = Grid::column(10.0, 2, 0.0);
        let mut settings = NpzdSettings::default();
        settings.extensions.nitrogen = true;
        settings.parameters.hdop = 5.0;
        let model = configure(&settings, &grid).unwrap();

        let working: Vec<Field3> = model
            .tracers
            .ids()
            .map(|_| Field3::from_elem((1, 1, 2), 100.0))
            .collect();

        // A handicap above one pushes the raw DOP term past unity.
        let mut selection = None;
        let raw = Limitation::DopOrPhosphate.evaluate(
            &model.params,
            &working,
            &model.ids,
            &mut selection,
        );
        assert!(raw.iter().any(|&u| u > 1.0));

        let limit = combined_limitation(&model, &model.plankton[0], &working, &mut selection);
        assert!(limit.iter().all(|&u| u <= 1.0));
    }

    #[test]
    fn deposit_honours_boundaries() {
        let grid = Grid::column(10.0, 3, 0.0);
        let source = Field3::from_elem((1, 1, 3), 1.0);

        let mut target = Field3::zeros((1, 1, 3));
        deposit(&mut target, &source, 2.0, Boundary::Volume, &grid);
        assert_eq!(target.iter().copied().sum::<f64>(), 6.0);

        let mut target = Field3::zeros((1, 1, 3));
        deposit(&mut target, &source, 1.0, Boundary::Surface, &grid);
        assert_eq!(target[[0, 0, 2]], 1.0);
        assert_eq!(target[[0, 0, 0]], 0.0);

        let mut target = Field3::zeros((1, 1, 3));
        deposit(&mut target, &source, 1.0, Boundary::Bottom, &grid);
        assert_eq!(target[[0, 0, 0]], 1.0);
        assert_eq!(target[[0, 0, 2]], 0.0);
    }

    #[test]
    fn flags_require_values_above_the_floor() {
        let grid = Grid::column(10.0, 2, 0.0);
        let trcmin = 1e-13;
        let mut field = Field3::from_elem((1, 1, 2), trcmin);
        field[[0, 0, 1]] = 1.0;
        let flags = validity_flags(&[field], &grid, trcmin);
        assert!(!flags[0][[0, 0, 0]]);
        assert!(flags[0][[0, 0, 1]]);
    }

    #[test]
    fn clamping_floors_wet_cells_and_zeros_land() {
        let mut grid = Grid::column(10.0, 2, 0.0);
        grid.mask[[0, 0, 0]] = false;
        let trcmin = 1e-13;
        let mut fields = vec![Field3::from_elem((1, 1, 2), -0.5)];
        clamp_to_floor(&mut fields, &grid, trcmin);
        assert_eq!(fields[0][[0, 0, 0]], 0.0);
        assert_eq!(fields[0][[0, 0, 1]], trcmin);
    }

    #[test]
    fn collected_calcite_integrates_above_the_floor() {
        let grid = Grid::column(10.0, 2, 0.0);
        let trcmin = 1e-13;
        let mut caco3 = Field3::from_elem((1, 1, 2), trcmin);
        caco3[[0, 0, 1]] = trcmin + 0.3;
        let collected = collected_calcite(&grid, &caco3, trcmin);
        approx::assert_relative_eq!(collected[[0, 0]], 3.0, max_relative = 1e-12);
    }
}
