//! Tracer descriptors and the tracer registry.
//!
//! The registry is the single source of truth for which tracers exist in the
//! active configuration. It is write-once: tracers are registered during
//! [`configure`](crate::setup::configure) and addressed by integer
//! [`TracerId`] from then on, so the hot integration loops never touch string
//! keys.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{BgcError, BgcResult};
use crate::grid::Field3;
use crate::parameters::NpzdParameters;

/// Index of a tracer in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TracerId(pub(crate) usize);

impl TracerId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// Currency a tracer is carried in. Reaction rules convert between
/// currencies with the Redfield ratios, so a rule moving nitrogen-unit
/// plankton mass into a phosphorus-unit nutrient pool scales the flux
/// without the rule spelling the ratio out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    /// mmol N / m^3 (plankton, detritus, nitrate, DON).
    Nitrogen,
    /// mmol P / m^3 (phosphate, DOP).
    Phosphorus,
    /// mmol C / m^3 (DIC, calcite).
    Carbon,
    /// meq / m^3 (alkalinity).
    Equivalents,
}

impl Currency {
    /// Redfield conversion factor for a flux expressed in `self` units and
    /// deposited into a pool carried in `to` units. Alkalinity adjustments
    /// carry their own stoichiometry, so equivalents convert at unity.
    pub fn conversion(self, to: Currency, params: &NpzdParameters) -> f64 {
        use Currency::*;
        match (self, to) {
            (Nitrogen, Phosphorus) => params.redfield_ratio_pn,
            (Phosphorus, Nitrogen) => 1.0 / params.redfield_ratio_pn,
            (Nitrogen, Carbon) => params.redfield_ratio_cn,
            (Carbon, Nitrogen) => 1.0 / params.redfield_ratio_cn,
            (Phosphorus, Carbon) => params.redfield_ratio_cn / params.redfield_ratio_pn,
            (Carbon, Phosphorus) => params.redfield_ratio_pn / params.redfield_ratio_cn,
            _ => 1.0,
        }
    }
}

/// Mortality closure policy of a plankton tracer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Mortality {
    /// Loss proportional to concentration (1/s).
    Linear(f64),
    /// Loss proportional to the squared concentration
    /// (1/s per mmol N / m^3); used for zooplankton self-limitation.
    Quadratic(f64),
}

/// Static description of a tracer: its name, whether physical transport
/// applies, and the optional process capabilities the integrator evaluates
/// through exhaustive matches.
#[derive(Debug, Clone)]
pub struct TracerDescriptor {
    pub name: String,
    /// Currency the concentration is carried in.
    pub currency: Currency,
    /// Whether advection, diffusion and vertical mixing apply. Tracers
    /// excluded from transport must be maintained through pre/post rules.
    pub transport: bool,
    /// Gravitational sinking speed field (m/s), present for sinking tracers.
    pub sinking_speed: Option<Field3>,
    /// Light attenuation coefficient (1/m per concentration unit), present
    /// for self-shading plankton.
    pub light_attenuation: Option<f64>,
    /// Temperature-scaled fast recycling rate at 0 degC (1/s).
    pub recycling_rate: Option<f64>,
    /// Mortality policy, present for plankton.
    pub mortality: Option<Mortality>,
}

impl TracerDescriptor {
    /// A transported nitrogen-unit tracer with no process capabilities.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            currency: Currency::Nitrogen,
            transport: true,
            sinking_speed: None,
            light_attenuation: None,
            recycling_rate: None,
            mortality: None,
        }
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn without_transport(mut self) -> Self {
        self.transport = false;
        self
    }

    pub fn with_sinking_speed(mut self, speed: Field3) -> Self {
        self.sinking_speed = Some(speed);
        self
    }

    pub fn with_light_attenuation(mut self, coefficient: f64) -> Self {
        self.light_attenuation = Some(coefficient);
        self
    }

    pub fn with_recycling_rate(mut self, rate: f64) -> Self {
        self.recycling_rate = Some(rate);
        self
    }

    pub fn with_mortality(mut self, mortality: Mortality) -> Self {
        self.mortality = Some(mortality);
        self
    }
}

/// Arena of tracer descriptors with a name lookup built at registration time.
#[derive(Debug, Default)]
pub struct TracerRegistry {
    descriptors: Vec<TracerDescriptor>,
    index: HashMap<String, TracerId>,
    transported: Vec<TracerId>,
}

impl TracerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tracer, failing on a duplicate name. The tracer joins the
    /// transport list iff its descriptor asks for transport.
    pub fn register(&mut self, descriptor: TracerDescriptor) -> BgcResult<TracerId> {
        if self.index.contains_key(&descriptor.name) {
            return Err(BgcError::DuplicateTracer(descriptor.name.clone()));
        }
        let id = TracerId(self.descriptors.len());
        self.index.insert(descriptor.name.clone(), id);
        if descriptor.transport {
            self.transported.push(id);
        }
        self.descriptors.push(descriptor);
        Ok(id)
    }

    /// Resolve a tracer name to its id.
    pub fn id(&self, name: &str) -> BgcResult<TracerId> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| BgcError::UnknownTracer(name.to_string()))
    }

    pub fn get(&self, id: TracerId) -> &TracerDescriptor {
        &self.descriptors[id.index()]
    }

    pub fn name(&self, id: TracerId) -> &str {
        &self.descriptors[id.index()].name
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Tracers subject to physical transport, in registration order.
    pub fn transported(&self) -> &[TracerId] {
        &self.transported
    }

    /// All tracer ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = TracerId> + '_ {
        (0..self.descriptors.len()).map(TracerId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TracerId, &TracerDescriptor)> {
        self.descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| (TracerId(i), d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let mut registry = TracerRegistry::new();
        let po4 = registry.register(TracerDescriptor::new("po4")).unwrap();
        let det = registry
            .register(
                TracerDescriptor::new("detritus")
                    .with_recycling_rate(1e-6)
                    .with_sinking_speed(Field3::zeros((1, 1, 2))),
            )
            .unwrap();

        assert_eq!(registry.id("po4").unwrap(), po4);
        assert_eq!(registry.name(det), "detritus");
        assert!(registry.get(det).sinking_speed.is_some());
        assert!(registry.get(po4).sinking_speed.is_none());
        assert_eq!(registry.transported(), &[po4, det]);
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = TracerRegistry::new();
        registry.register(TracerDescriptor::new("po4")).unwrap();
        let err = registry.register(TracerDescriptor::new("po4")).unwrap_err();
        assert!(matches!(err, BgcError::DuplicateTracer(name) if name == "po4"));
    }

    #[test]
    fn independent_registries_do_not_interfere() {
        let mut first = TracerRegistry::new();
        let mut second = TracerRegistry::new();
        first.register(TracerDescriptor::new("po4")).unwrap();
        // The same name is fine in a different configuration.
        second.register(TracerDescriptor::new("po4")).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn non_transported_tracers_are_excluded_from_transport() {
        let mut registry = TracerRegistry::new();
        let caco3 = registry
            .register(TracerDescriptor::new("caco3").without_transport())
            .unwrap();
        assert!(registry.transported().is_empty());
        assert_eq!(registry.id("caco3").unwrap(), caco3);
    }

    #[test]
    fn currency_conversions_follow_redfield() {
        let params = NpzdParameters::default();
        assert_eq!(
            Currency::Nitrogen.conversion(Currency::Phosphorus, &params),
            params.redfield_ratio_pn
        );
        assert_eq!(
            Currency::Nitrogen.conversion(Currency::Carbon, &params),
            params.redfield_ratio_cn
        );
        assert_eq!(Currency::Nitrogen.conversion(Currency::Nitrogen, &params), 1.0);
        assert_eq!(
            Currency::Carbon.conversion(Currency::Equivalents, &params),
            1.0
        );
    }

    #[test]
    fn unknown_tracer_lookup_fails() {
        let registry = TracerRegistry::new();
        assert!(matches!(
            registry.id("no3").unwrap_err(),
            BgcError::UnknownTracer(_)
        ));
    }
}
