//! Declarative rule catalog for the reaction network.
//!
//! A rule names a reaction kind together with a source and a destination
//! tracer, an execution phase and a spatial boundary. Rules are registered
//! under unique names, optionally grouped into named lists, and a
//! configuration-time selection step resolves the chosen names (groups
//! expanding recursively, in declared order) into the three phase sequences
//! the integrator executes. This lets alternative biogeochemical
//! configurations compose by selecting groups instead of editing the
//! integration loop.
//!
//! Reaction kinds form a closed set interpreted by the integrator; rules carry
//! no function pointers or closures, so a catalog is plain data.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{BgcError, BgcResult};
use crate::tracer::{TracerId, TracerRegistry};

/// Spatial restriction of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Boundary {
    /// The full 3-D volume (default).
    Volume,
    /// The top layer only.
    Surface,
    /// The deepest wet cell of each column, via the bottom mask.
    Bottom,
}

/// Execution phase of a rule within one outer timestep.
///
/// Pre and post rules apply their contributions immediately, once per outer
/// step; primary rules are evaluated every sub-step and scaled by the
/// sub-timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RulePhase {
    Pre,
    Primary,
    Post,
}

/// The closed set of reaction kinds the integrator knows how to evaluate.
///
/// Each kind reads the per-sub-step process rates (production, grazing,
/// recycling, mortality) and emits additive rate contributions for the rule's
/// source and/or destination tracers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReactionKind {
    /// Nutrient uptake fuelling plankton growth: the source nutrient loses
    /// production scaled by the Redfield P:N ratio, the destination plankton
    /// gains it.
    PrimaryProduction,
    /// Carbon-side bookkeeping of primary production: the source DIC loses
    /// production scaled by the Redfield C:N ratio.
    PrimaryProductionDic,
    /// Nitrogen-side bookkeeping of primary production: the source nitrate
    /// is debited without crediting the plankton a second time.
    PrimaryProductionNo3,
    /// Primary production that consumes whichever of PO4 and DOP currently
    /// yields the weaker limitation, per the colimitation selection mask.
    PrimaryProductionSwitched,
    /// Prey is grazed; the predator gains the digested fraction.
    Grazing,
    /// Zooplankton grazing on itself; gain and loss collapse onto one tracer.
    SelfGrazing,
    /// Linear or quadratic mortality into detritus.
    Mortality,
    /// The ungrazed fraction of prey lost to detritus.
    SloppyFeeding,
    /// Fast recycling into the source nutrient pool (P units).
    Recycling,
    /// Remineralization of the sinking export leaving the deepest wet cell,
    /// credited to the destination nutrient. Registered with the bottom
    /// boundary; the source tracer already lost the export through its
    /// sinking divergence.
    BottomRemineralization,
    /// Carbon-side bookkeeping of bottom remineralization into DIC.
    BottomRemineralizationDic,
    /// Carbon-side bookkeeping of recycling into DIC.
    RecyclingToDic,
    /// Nitrogen-side bookkeeping of recycling into nitrate.
    RecyclingToNo3,
    /// Zooplankton excretion into a nutrient pool (P units).
    Excretion,
    /// Carbon-side bookkeeping of excretion into DIC.
    ExcretionDic,
    /// Nitrogen-side bookkeeping of excretion into nitrate.
    ExcretionNo3,
    /// Calcite production debited from DIC and collected in the calcite
    /// tracer.
    CalciteProduction,
    /// Alkalinity debit of calcite production (two equivalents per mol).
    CalciteProductionAlk,
    /// Post-step redistribution of collected calcite over the dissolution
    /// profile, credited to DIC.
    CalciteDissolution,
    /// Alkalinity credit of calcite dissolution (two equivalents per mol).
    CalciteDissolutionAlk,
    /// Pre-step reset of the collection-only calcite tracer.
    ResetCalcite,
    /// Post-step alkalinity adjustment mirroring the biological DIC change.
    DicAlkCoupling,
    /// Air-sea CO2 exchange applied to surface DIC from the forcing flux.
    Co2SurfaceFlux,
    /// Placeholder that contributes nothing.
    Noop,
}

/// A rule or group as supplied to [`RuleCatalog::register`].
#[derive(Debug, Clone)]
pub enum RuleDefinition {
    Reaction {
        kind: ReactionKind,
        source: String,
        destination: String,
        label: Option<String>,
        boundary: Option<Boundary>,
        phase: RulePhase,
    },
    Group {
        members: Vec<String>,
        label: Option<String>,
        boundary: Option<Boundary>,
    },
}

impl RuleDefinition {
    /// A primary-phase, full-volume reaction.
    pub fn reaction(
        kind: ReactionKind,
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self::Reaction {
            kind,
            source: source.into(),
            destination: destination.into(),
            label: None,
            boundary: None,
            phase: RulePhase::Primary,
        }
    }

    /// A named list of rules (or nested groups). Groups carry no boundary
    /// semantics of their own.
    pub fn group<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Group {
            members: members.into_iter().map(Into::into).collect(),
            label: None,
            boundary: None,
        }
    }

    pub fn with_label(mut self, text: impl Into<String>) -> Self {
        match &mut self {
            Self::Reaction { label, .. } | Self::Group { label, .. } => {
                *label = Some(text.into());
            }
        }
        self
    }

    pub fn with_boundary(mut self, restriction: Boundary) -> Self {
        match &mut self {
            Self::Reaction { boundary, .. } | Self::Group { boundary, .. } => {
                *boundary = Some(restriction);
            }
        }
        self
    }

    pub fn in_phase(mut self, group: RulePhase) -> Self {
        if let Self::Reaction { phase, .. } = &mut self {
            *phase = group;
        }
        self
    }
}

/// A selected rule with tracer names resolved to registry indices.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub kind: ReactionKind,
    pub source: TracerId,
    pub destination: TracerId,
    pub label: String,
    pub boundary: Boundary,
    pub phase: RulePhase,
}

#[derive(Debug, Clone)]
enum CatalogEntry {
    Rule {
        kind: ReactionKind,
        source: String,
        destination: String,
        label: String,
        boundary: Boundary,
        phase: RulePhase,
    },
    Group(Vec<String>),
}

/// Catalog of registered rules and groups plus the resolved selection.
#[derive(Debug, Default)]
pub struct RuleCatalog {
    entries: IndexMap<String, CatalogEntry>,
    selected_names: Vec<String>,
    pre: Vec<Rule>,
    primary: Vec<Rule>,
    post: Vec<Rule>,
}

impl RuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule or group under a unique name.
    ///
    /// Fails on a duplicate name, and on a group carrying a label or
    /// boundary. The boundary of a single rule is resolved here, once, so
    /// selection and the integration loop never re-interpret it.
    pub fn register(&mut self, name: impl Into<String>, definition: RuleDefinition) -> BgcResult<()> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(BgcError::DuplicateRule(name));
        }
        let entry = match definition {
            RuleDefinition::Reaction {
                kind,
                source,
                destination,
                label,
                boundary,
                phase,
            } => CatalogEntry::Rule {
                kind,
                source,
                destination,
                label: label.unwrap_or_else(|| name.clone()),
                boundary: boundary.unwrap_or(Boundary::Volume),
                phase,
            },
            RuleDefinition::Group {
                members,
                label,
                boundary,
            } => {
                if label.is_some() || boundary.is_some() {
                    return Err(BgcError::GroupWithMetadata(name));
                }
                CatalogEntry::Group(members)
            }
        };
        self.entries.insert(name, entry);
        Ok(())
    }

    /// Select a rule or group by name, resolving tracer names against the
    /// registry. Groups expand recursively in declared order; every resolved
    /// name (group members included) is recorded, and selecting any name
    /// twice is a configuration error.
    pub fn select(&mut self, name: &str, tracers: &TracerRegistry) -> BgcResult<()> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| BgcError::UnknownRule(name.to_string()))?
            .clone();
        if self.selected_names.iter().any(|n| n == name) {
            return Err(BgcError::DuplicateSelection(name.to_string()));
        }
        self.selected_names.push(name.to_string());

        match entry {
            CatalogEntry::Group(members) => {
                for member in &members {
                    self.select(member, tracers)?;
                }
            }
            CatalogEntry::Rule {
                kind,
                source,
                destination,
                label,
                boundary,
                phase,
            } => {
                let rule = Rule {
                    name: name.to_string(),
                    kind,
                    source: tracers.id(&source)?,
                    destination: tracers.id(&destination)?,
                    label,
                    boundary,
                    phase,
                };
                log::debug!("selected rule '{}' ({})", rule.name, rule.label);
                match phase {
                    RulePhase::Pre => self.pre.push(rule),
                    RulePhase::Primary => self.primary.push(rule),
                    RulePhase::Post => self.post.push(rule),
                }
            }
        }
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Names selected so far, groups included, in selection order.
    pub fn selected_names(&self) -> &[String] {
        &self.selected_names
    }

    pub fn pre_rules(&self) -> &[Rule] {
        &self.pre
    }

    pub fn primary_rules(&self) -> &[Rule] {
        &self.primary
    }

    pub fn post_rules(&self) -> &[Rule] {
        &self.post
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracer::TracerDescriptor;

    fn test_registry() -> TracerRegistry {
        let mut registry = TracerRegistry::new();
        for name in ["po4", "phytoplankton", "zooplankton", "detritus"] {
            registry.register(TracerDescriptor::new(name)).unwrap();
        }
        registry
    }

    fn catalog_with_rules() -> RuleCatalog {
        let mut catalog = RuleCatalog::new();
        catalog
            .register(
                "grazing",
                RuleDefinition::reaction(ReactionKind::Grazing, "phytoplankton", "zooplankton")
                    .with_label("Grazing"),
            )
            .unwrap();
        catalog
            .register(
                "mortality",
                RuleDefinition::reaction(ReactionKind::Mortality, "phytoplankton", "detritus"),
            )
            .unwrap();
        catalog
            .register(
                "production",
                RuleDefinition::reaction(ReactionKind::PrimaryProduction, "po4", "phytoplankton"),
            )
            .unwrap();
        catalog
    }

    #[test]
    fn duplicate_rule_name_fails() {
        let mut catalog = catalog_with_rules();
        let err = catalog
            .register(
                "grazing",
                RuleDefinition::reaction(ReactionKind::Grazing, "detritus", "zooplankton"),
            )
            .unwrap_err();
        assert!(matches!(err, BgcError::DuplicateRule(_)));
    }

    #[test]
    fn group_with_label_or_boundary_fails() {
        let mut catalog = catalog_with_rules();
        let err = catalog
            .register(
                "group_bad",
                RuleDefinition::group(["grazing"]).with_label("nope"),
            )
            .unwrap_err();
        assert!(matches!(err, BgcError::GroupWithMetadata(_)));

        let err = catalog
            .register(
                "group_bad",
                RuleDefinition::group(["grazing"]).with_boundary(Boundary::Surface),
            )
            .unwrap_err();
        assert!(matches!(err, BgcError::GroupWithMetadata(_)));
    }

    #[test]
    fn duplicate_selection_fails() {
        let registry = test_registry();
        let mut catalog = catalog_with_rules();
        catalog.select("grazing", &registry).unwrap();
        let err = catalog.select("grazing", &registry).unwrap_err();
        assert!(matches!(err, BgcError::DuplicateSelection(_)));
    }

    #[test]
    fn groups_flatten_in_declared_order() {
        let registry = test_registry();
        let mut catalog = catalog_with_rules();
        catalog
            .register("group_inner", RuleDefinition::group(["mortality", "production"]))
            .unwrap();
        catalog
            .register("group_outer", RuleDefinition::group(["grazing", "group_inner"]))
            .unwrap();

        catalog.select("group_outer", &registry).unwrap();
        let order: Vec<&str> = catalog.primary_rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(order, vec!["grazing", "mortality", "production"]);
        // Every resolved name is recorded, groups included.
        assert_eq!(
            catalog.selected_names(),
            &["group_outer", "grazing", "group_inner", "mortality", "production"]
        );
    }

    #[test]
    fn selecting_group_then_member_fails() {
        let registry = test_registry();
        let mut catalog = catalog_with_rules();
        catalog
            .register("group_all", RuleDefinition::group(["grazing", "mortality"]))
            .unwrap();
        catalog.select("group_all", &registry).unwrap();
        assert!(matches!(
            catalog.select("mortality", &registry).unwrap_err(),
            BgcError::DuplicateSelection(_)
        ));
    }

    #[test]
    fn phases_are_routed_separately() {
        let registry = test_registry();
        let mut catalog = RuleCatalog::new();
        catalog
            .register(
                "pre",
                RuleDefinition::reaction(ReactionKind::Noop, "po4", "po4").in_phase(RulePhase::Pre),
            )
            .unwrap();
        catalog
            .register(
                "post",
                RuleDefinition::reaction(ReactionKind::Noop, "po4", "po4")
                    .in_phase(RulePhase::Post),
            )
            .unwrap();
        catalog.select("pre", &registry).unwrap();
        catalog.select("post", &registry).unwrap();
        assert_eq!(catalog.pre_rules().len(), 1);
        assert_eq!(catalog.post_rules().len(), 1);
        assert!(catalog.primary_rules().is_empty());
    }

    #[test]
    fn unknown_names_fail() {
        let registry = test_registry();
        let mut catalog = catalog_with_rules();
        assert!(matches!(
            catalog.select("missing", &registry).unwrap_err(),
            BgcError::UnknownRule(_)
        ));
        catalog
            .register(
                "bad_tracer",
                RuleDefinition::reaction(ReactionKind::Grazing, "krill", "zooplankton"),
            )
            .unwrap();
        assert!(matches!(
            catalog.select("bad_tracer", &registry).unwrap_err(),
            BgcError::UnknownTracer(_)
        ));
    }
}
