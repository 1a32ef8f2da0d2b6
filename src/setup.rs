//! Model assembly: tracers, rules and extensions.
//!
//! [`configure`] turns a settings document into a validated [`NpzdModel`].
//! The base configuration carries the four NPZD tracers and their reaction
//! group; extensions add tracers and rule groups on top without touching the
//! integration loop. All validation happens here, so a configured model
//! steps without error paths apart from missing forcing fields.

use serde::{Deserialize, Serialize};

use crate::errors::{BgcError, BgcResult};
use crate::grid::{Field3, Grid};
use crate::growth::{GrowthFunction, Limitation};
use crate::parameters::NpzdParameters;
use crate::rules::{Boundary, ReactionKind, RuleCatalog, RuleDefinition, RulePhase};
use crate::tracer::{Currency, Mortality, TracerDescriptor, TracerId, TracerRegistry};

/// Optional parts of the reaction network.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Extensions {
    /// DIC, alkalinity and an implicitly dissolving calcite collector.
    pub carbon: bool,
    /// Nitrate, DON, DOP and nitrogen-fixing diazotrophs.
    pub nitrogen: bool,
    /// Coccolithophores with a prognostic, sinking calcite tracer.
    /// Requires the carbon extension.
    pub calcifiers: bool,
}

/// Everything needed to assemble a model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NpzdSettings {
    pub parameters: NpzdParameters,
    pub extensions: Extensions,
}

impl NpzdSettings {
    /// Parse settings from a TOML document. Missing keys take their
    /// defaults.
    pub fn from_toml_str(input: &str) -> BgcResult<Self> {
        Ok(toml::from_str(input)?)
    }
}

/// Resolved ids of the tracers the built-in rules and rates refer to.
/// Optional ids are present iff the owning extension is enabled.
#[derive(Debug, Clone, Copy)]
pub struct CoreIds {
    pub po4: TracerId,
    pub phytoplankton: TracerId,
    pub zooplankton: TracerId,
    pub detritus: TracerId,
    pub no3: Option<TracerId>,
    pub dop: Option<TracerId>,
    pub don: Option<TracerId>,
    pub diazotroph: Option<TracerId>,
    pub dic: Option<TracerId>,
    pub alkalinity: Option<TracerId>,
    pub caco3: Option<TracerId>,
    pub coccolitophore: Option<TracerId>,
}

/// A growing plankton type: its tracer, growth law and nutrient limitations.
/// The realized limitation is the per-cell minimum over the listed terms.
#[derive(Debug)]
pub struct PlanktonEntry {
    pub tracer: TracerId,
    pub growth: GrowthFunction,
    pub limits: Vec<Limitation>,
}

/// A validated, immutable model configuration.
#[derive(Debug)]
pub struct NpzdModel {
    pub params: NpzdParameters,
    pub tracers: TracerRegistry,
    pub rules: RuleCatalog,
    pub plankton: Vec<PlanktonEntry>,
    /// Normalized grazing preferences over the active prey.
    pub preferences: Vec<(TracerId, f64)>,
    pub ids: CoreIds,
    /// Calcite dissolution profile for the implicit carbon extension;
    /// integrates to one over each water column.
    pub rcak: Option<Field3>,
}

/// Assemble and validate a model for the given grid.
pub fn configure(settings: &NpzdSettings, grid: &Grid) -> BgcResult<NpzdModel> {
    let params = settings.parameters.clone();
    let ext = settings.extensions;
    if ext.calcifiers && !ext.carbon {
        return Err(BgcError::InvalidExtensions(
            "calcifiers requires carbon".to_string(),
        ));
    }

    let mut tracers = TracerRegistry::new();
    let po4 = tracers.register(
        TracerDescriptor::new("po4").with_currency(Currency::Phosphorus),
    )?;
    let phytoplankton = tracers.register(
        TracerDescriptor::new("phytoplankton")
            .with_light_attenuation(params.light_attenuation_phytoplankton)
            .with_recycling_rate(params.nupt0)
            .with_mortality(Mortality::Linear(params.specific_mortality_phytoplankton)),
    )?;
    let zooplankton = tracers.register(
        TracerDescriptor::new("zooplankton")
            .with_mortality(Mortality::Quadratic(params.quadric_mortality_zooplankton)),
    )?;
    let detritus = tracers.register(
        TracerDescriptor::new("detritus")
            .with_recycling_rate(params.nud0)
            .with_sinking_speed(sinking_profile(grid, params.wd0, params.mw, params.mwz)),
    )?;

    let mut ids = CoreIds {
        po4,
        phytoplankton,
        zooplankton,
        detritus,
        no3: None,
        dop: None,
        don: None,
        diazotroph: None,
        dic: None,
        alkalinity: None,
        caco3: None,
        coccolitophore: None,
    };

    if ext.nitrogen {
        ids.no3 = Some(tracers.register(TracerDescriptor::new("no3"))?);
        ids.dop = Some(tracers.register(
            TracerDescriptor::new("dop")
                .with_currency(Currency::Phosphorus)
                .with_recycling_rate(params.nudop0),
        )?);
        ids.don = Some(
            tracers.register(TracerDescriptor::new("don").with_recycling_rate(params.nudon0))?,
        );
        ids.diazotroph = Some(tracers.register(
            TracerDescriptor::new("diazotroph")
                .with_light_attenuation(params.light_attenuation_phytoplankton)
                .with_recycling_rate(params.nupt0_d)
                .with_mortality(Mortality::Linear(params.specific_mortality_diazotroph)),
        )?);
    }

    if ext.carbon {
        ids.dic = Some(tracers.register(
            TracerDescriptor::new("dic").with_currency(Currency::Carbon),
        )?);
        ids.alkalinity = Some(tracers.register(
            TracerDescriptor::new("alkalinity").with_currency(Currency::Equivalents),
        )?);
        let caco3 = if ext.calcifiers {
            TracerDescriptor::new("caco3")
                .with_currency(Currency::Carbon)
                .with_sinking_speed(sinking_profile(grid, params.wc0, params.mw_c, params.mwz))
        } else {
            // A collection-only tracer: reset before, distributed after.
            TracerDescriptor::new("caco3")
                .with_currency(Currency::Carbon)
                .without_transport()
        };
        ids.caco3 = Some(tracers.register(caco3)?);
    }

    if ext.calcifiers {
        ids.coccolitophore = Some(tracers.register(
            TracerDescriptor::new("coccolitophore")
                .with_light_attenuation(params.light_attenuation_phytoplankton)
                .with_recycling_rate(params.nuct0)
                .with_mortality(Mortality::Linear(params.specific_mortality_coccolitophore)),
        )?);
    }

    let mut rules = RuleCatalog::new();
    register_basic_rules(&mut rules, ext)?;
    if ext.nitrogen {
        register_nitrogen_rules(&mut rules)?;
    }
    if ext.carbon {
        register_carbon_rules(&mut rules, ext)?;
    }
    if ext.calcifiers {
        register_calcifier_rules(&mut rules)?;
    }

    rules.select("group_npzd_basic", &tracers)?;
    if ext.nitrogen {
        rules.select("group_npzd_nitrogen", &tracers)?;
    }
    if ext.carbon && !ext.calcifiers {
        rules.select("group_carbon_implicit_caco3", &tracers)?;
    }
    if ext.calcifiers {
        rules.select("group_carbon_explicit_caco3", &tracers)?;
        rules.select("group_npzd_calcifiers", &tracers)?;
    }

    // With the nitrogen extension, phytoplankton phosphate limitation is
    // replaced by the DOP/PO4 switch; diazotrophs carry the switch plus a
    // nitrate term.
    let mut plankton = vec![PlanktonEntry {
        tracer: phytoplankton,
        growth: GrowthFunction::Phytoplankton,
        limits: if ext.nitrogen {
            vec![Limitation::DopOrPhosphate]
        } else {
            vec![Limitation::Phosphate]
        },
    }];
    if let Some(diazotroph) = ids.diazotroph {
        plankton.push(PlanktonEntry {
            tracer: diazotroph,
            growth: GrowthFunction::Diazotroph,
            limits: vec![Limitation::DopOrPhosphate, Limitation::Nitrate],
        });
    }
    if let Some(coccolitophore) = ids.coccolitophore {
        plankton.push(PlanktonEntry {
            tracer: coccolitophore,
            growth: GrowthFunction::Coccolithophore,
            limits: if ext.nitrogen {
                vec![Limitation::DopOrPhosphateCocco, Limitation::Nitrate]
            } else {
                vec![Limitation::PhosphateCocco]
            },
        });
    }

    let mut preferences = vec![
        (phytoplankton, params.zprefp),
        (zooplankton, params.zprefz),
        (detritus, params.zprefdet),
    ];
    if let Some(diazotroph) = ids.diazotroph {
        preferences.push((diazotroph, params.zprefd));
    }
    if let Some(coccolitophore) = ids.coccolitophore {
        preferences.push((coccolitophore, params.zprefc));
    }
    let total: f64 = preferences.iter().map(|(_, w)| w).sum();
    for (_, weight) in &mut preferences {
        *weight /= total;
    }

    let rcak = (ext.carbon && !ext.calcifiers).then(|| dissolution_profile(grid, params.dcaco3));

    log::info!(
        "configured NPZD model: {} tracers ({} transported), {} rules selected",
        tracers.len(),
        tracers.transported().len(),
        rules.selected_names().len(),
    );

    Ok(NpzdModel {
        params,
        tracers,
        rules,
        plankton,
        preferences,
        ids,
        rcak,
    })
}

/// Depth-dependent sinking speed, capped below `cap` metres. Depth is
/// measured to the bottom face of each cell.
fn sinking_profile(grid: &Grid, base: f64, slope: f64, cap: f64) -> Field3 {
    Field3::from_shape_fn((grid.nx, grid.ny, grid.nz), |(i, j, k)| {
        if grid.mask[[i, j, k]] {
            let depth = -(grid.zw[k] - grid.dzt[k]);
            base + slope * depth.min(cap)
        } else {
            0.0
        }
    })
}

/// Fraction of the surface calcite flux dissolving per metre in each cell,
/// from an exponentially decaying flux profile. The remainder reaching the
/// sea floor dissolves in the deepest wet cell, so the profile integrates to
/// one over every water column.
fn dissolution_profile(grid: &Grid, dcaco3: f64) -> Field3 {
    let mut rcak = Field3::zeros((grid.nx, grid.ny, grid.nz));
    for i in 0..grid.nx {
        for j in 0..grid.ny {
            let kbot = grid.kbot[[i, j]];
            if kbot == 0 {
                continue;
            }
            let deepest = kbot - 1;
            for k in deepest..grid.nz {
                let top = grid.zw[k];
                let bottom = grid.zw[k] - grid.dzt[k];
                let mut fraction = (top / dcaco3).exp() - (bottom / dcaco3).exp();
                if k == deepest {
                    fraction += (bottom / dcaco3).exp();
                }
                rcak[[i, j, k]] = fraction / grid.dzt[k];
            }
        }
    }
    rcak
}

fn register_basic_rules(rules: &mut RuleCatalog, ext: Extensions) -> BgcResult<()> {
    rules.register(
        "npzd_basic_phytoplankton_grazing",
        RuleDefinition::reaction(ReactionKind::Grazing, "phytoplankton", "zooplankton")
            .with_label("Grazing of phytoplankton"),
    )?;
    rules.register(
        "npzd_basic_zooplankton_self_grazing",
        RuleDefinition::reaction(ReactionKind::SelfGrazing, "zooplankton", "zooplankton")
            .with_label("Zooplankton self-predation"),
    )?;
    rules.register(
        "npzd_basic_detritus_grazing",
        RuleDefinition::reaction(ReactionKind::Grazing, "detritus", "zooplankton")
            .with_label("Grazing of detritus"),
    )?;
    rules.register(
        "npzd_basic_phytoplankton_sloppy_feeding",
        RuleDefinition::reaction(ReactionKind::SloppyFeeding, "phytoplankton", "detritus")
            .with_label("Sloppy feeding on phytoplankton"),
    )?;
    rules.register(
        "npzd_basic_zooplankton_sloppy_feeding",
        RuleDefinition::reaction(ReactionKind::SloppyFeeding, "zooplankton", "detritus")
            .with_label("Sloppy feeding on zooplankton"),
    )?;
    rules.register(
        "npzd_basic_detritus_sloppy_feeding",
        RuleDefinition::reaction(ReactionKind::SloppyFeeding, "detritus", "detritus")
            .with_label("Sloppy feeding on detritus"),
    )?;
    rules.register(
        "npzd_basic_phytoplankton_mortality",
        RuleDefinition::reaction(ReactionKind::Mortality, "phytoplankton", "detritus")
            .with_label("Phytoplankton mortality"),
    )?;
    rules.register(
        "npzd_basic_zooplankton_mortality",
        RuleDefinition::reaction(ReactionKind::Mortality, "zooplankton", "detritus")
            .with_label("Zooplankton mortality"),
    )?;
    rules.register(
        "npzd_basic_phytoplankton_fast_recycling",
        RuleDefinition::reaction(ReactionKind::Recycling, "phytoplankton", "po4")
            .with_label("Fast recycling of phytoplankton"),
    )?;
    rules.register(
        "npzd_basic_detritus_remineralization",
        RuleDefinition::reaction(ReactionKind::Recycling, "detritus", "po4")
            .with_label("Remineralization of detritus"),
    )?;
    rules.register(
        "npzd_basic_zooplankton_excretion",
        RuleDefinition::reaction(ReactionKind::Excretion, "zooplankton", "po4")
            .with_label("Zooplankton excretion"),
    )?;
    // With the nitrogen extension, phytoplankton consume whichever of PO4
    // and DOP currently limits them less.
    let production = if ext.nitrogen {
        ReactionKind::PrimaryProductionSwitched
    } else {
        ReactionKind::PrimaryProduction
    };
    rules.register(
        "npzd_basic_primary_production",
        RuleDefinition::reaction(production, "po4", "phytoplankton")
            .with_label("Primary production"),
    )?;
    rules.register(
        "npzd_basic_detritus_bottom_remineralization",
        RuleDefinition::reaction(ReactionKind::BottomRemineralization, "detritus", "po4")
            .with_label("Remineralization of detritus at the sea floor")
            .with_boundary(Boundary::Bottom),
    )?;
    rules.register(
        "group_npzd_basic",
        RuleDefinition::group([
            "npzd_basic_phytoplankton_grazing",
            "npzd_basic_zooplankton_self_grazing",
            "npzd_basic_detritus_grazing",
            "npzd_basic_phytoplankton_sloppy_feeding",
            "npzd_basic_zooplankton_sloppy_feeding",
            "npzd_basic_detritus_sloppy_feeding",
            "npzd_basic_phytoplankton_mortality",
            "npzd_basic_zooplankton_mortality",
            "npzd_basic_phytoplankton_fast_recycling",
            "npzd_basic_detritus_remineralization",
            "npzd_basic_zooplankton_excretion",
            "npzd_basic_primary_production",
            "npzd_basic_detritus_bottom_remineralization",
        ]),
    )?;
    Ok(())
}

fn register_nitrogen_rules(rules: &mut RuleCatalog) -> BgcResult<()> {
    rules.register(
        "npzd_nitrogen_primary_production_no3",
        RuleDefinition::reaction(ReactionKind::PrimaryProductionNo3, "no3", "phytoplankton")
            .with_label("Nitrate uptake by primary production"),
    )?;
    rules.register(
        "npzd_nitrogen_diazotroph_production",
        RuleDefinition::reaction(ReactionKind::PrimaryProduction, "po4", "diazotroph")
            .with_label("Nitrogen-fixing primary production"),
    )?;
    rules.register(
        "npzd_nitrogen_diazotroph_grazing",
        RuleDefinition::reaction(ReactionKind::Grazing, "diazotroph", "zooplankton")
            .with_label("Grazing of diazotrophs"),
    )?;
    rules.register(
        "npzd_nitrogen_diazotroph_sloppy_feeding",
        RuleDefinition::reaction(ReactionKind::SloppyFeeding, "diazotroph", "detritus")
            .with_label("Sloppy feeding on diazotrophs"),
    )?;
    rules.register(
        "npzd_nitrogen_diazotroph_mortality",
        RuleDefinition::reaction(ReactionKind::Mortality, "diazotroph", "detritus")
            .with_label("Diazotroph mortality"),
    )?;
    rules.register(
        "npzd_nitrogen_diazotroph_fast_recycling",
        RuleDefinition::reaction(ReactionKind::Recycling, "diazotroph", "po4")
            .with_label("Fast recycling of diazotrophs"),
    )?;
    rules.register(
        "npzd_nitrogen_don_remineralization",
        RuleDefinition::reaction(ReactionKind::Recycling, "don", "no3")
            .with_label("Remineralization of DON"),
    )?;
    rules.register(
        "npzd_nitrogen_dop_remineralization",
        RuleDefinition::reaction(ReactionKind::Recycling, "dop", "po4")
            .with_label("Remineralization of DOP"),
    )?;
    rules.register(
        "npzd_nitrogen_detritus_remineralization_no3",
        RuleDefinition::reaction(ReactionKind::RecyclingToNo3, "detritus", "no3")
            .with_label("Nitrate from remineralized detritus"),
    )?;
    rules.register(
        "npzd_nitrogen_phytoplankton_recycling_no3",
        RuleDefinition::reaction(ReactionKind::RecyclingToNo3, "phytoplankton", "no3")
            .with_label("Nitrate from recycled phytoplankton"),
    )?;
    rules.register(
        "npzd_nitrogen_excretion_no3",
        RuleDefinition::reaction(ReactionKind::ExcretionNo3, "zooplankton", "no3")
            .with_label("Nitrate from zooplankton excretion"),
    )?;
    rules.register(
        "npzd_nitrogen_bottom_remineralization_no3",
        RuleDefinition::reaction(ReactionKind::BottomRemineralization, "detritus", "no3")
            .with_label("Nitrate from detritus at the sea floor")
            .with_boundary(Boundary::Bottom),
    )?;
    rules.register(
        "group_npzd_nitrogen",
        RuleDefinition::group([
            "npzd_nitrogen_primary_production_no3",
            "npzd_nitrogen_diazotroph_production",
            "npzd_nitrogen_diazotroph_grazing",
            "npzd_nitrogen_diazotroph_sloppy_feeding",
            "npzd_nitrogen_diazotroph_mortality",
            "npzd_nitrogen_diazotroph_fast_recycling",
            "npzd_nitrogen_don_remineralization",
            "npzd_nitrogen_dop_remineralization",
            "npzd_nitrogen_detritus_remineralization_no3",
            "npzd_nitrogen_phytoplankton_recycling_no3",
            "npzd_nitrogen_excretion_no3",
            "npzd_nitrogen_bottom_remineralization_no3",
        ]),
    )?;
    Ok(())
}

fn register_carbon_rules(rules: &mut RuleCatalog, ext: Extensions) -> BgcResult<()> {
    rules.register(
        "npzd_carbon_flux",
        RuleDefinition::reaction(ReactionKind::Co2SurfaceFlux, "dic", "dic")
            .with_label("Air-sea CO2 exchange")
            .with_boundary(Boundary::Surface)
            .in_phase(RulePhase::Pre),
    )?;
    rules.register(
        "npzd_carbon_primary_production_dic",
        RuleDefinition::reaction(ReactionKind::PrimaryProductionDic, "dic", "phytoplankton")
            .with_label("DIC uptake by primary production"),
    )?;
    rules.register(
        "npzd_carbon_recycling_detritus_dic",
        RuleDefinition::reaction(ReactionKind::RecyclingToDic, "detritus", "dic")
            .with_label("DIC from remineralized detritus"),
    )?;
    rules.register(
        "npzd_carbon_recycling_phyto_dic",
        RuleDefinition::reaction(ReactionKind::RecyclingToDic, "phytoplankton", "dic")
            .with_label("DIC from recycled phytoplankton"),
    )?;
    rules.register(
        "npzd_carbon_excretion_dic",
        RuleDefinition::reaction(ReactionKind::ExcretionDic, "zooplankton", "dic")
            .with_label("DIC from zooplankton excretion"),
    )?;
    rules.register(
        "npzd_carbon_bottom_remineralization_dic",
        RuleDefinition::reaction(ReactionKind::BottomRemineralizationDic, "detritus", "dic")
            .with_label("DIC from detritus at the sea floor")
            .with_boundary(Boundary::Bottom),
    )?;
    rules.register(
        "npzd_carbon_dic_alk",
        RuleDefinition::reaction(ReactionKind::DicAlkCoupling, "dic", "alkalinity")
            .with_label("Alkalinity mirror of biological DIC changes")
            .in_phase(RulePhase::Post),
    )?;

    if ext.calcifiers {
        rules.register(
            "group_carbon_explicit_caco3",
            RuleDefinition::group([
                "npzd_carbon_flux",
                "npzd_carbon_primary_production_dic",
                "npzd_carbon_recycling_detritus_dic",
                "npzd_carbon_recycling_phyto_dic",
                "npzd_carbon_excretion_dic",
                "npzd_carbon_bottom_remineralization_dic",
                "npzd_carbon_dic_alk",
            ]),
        )?;
        return Ok(());
    }

    rules.register(
        "pre_reset_calcite",
        RuleDefinition::reaction(ReactionKind::ResetCalcite, "caco3", "caco3")
            .with_label("Reset the calcite collector")
            .in_phase(RulePhase::Pre),
    )?;
    rules.register(
        "npzd_carbon_calcite_production_dic",
        RuleDefinition::reaction(ReactionKind::CalciteProduction, "dic", "caco3")
            .with_label("Calcite production"),
    )?;
    rules.register(
        "npzd_carbon_calcite_production_alk",
        RuleDefinition::reaction(ReactionKind::CalciteProductionAlk, "alkalinity", "caco3")
            .with_label("Alkalinity debit of calcite production"),
    )?;
    rules.register(
        "post_distribute_calcite_dic",
        RuleDefinition::reaction(ReactionKind::CalciteDissolution, "caco3", "dic")
            .with_label("Dissolution of collected calcite")
            .in_phase(RulePhase::Post),
    )?;
    rules.register(
        "post_distribute_calcite_alk",
        RuleDefinition::reaction(ReactionKind::CalciteDissolutionAlk, "caco3", "alkalinity")
            .with_label("Alkalinity credit of calcite dissolution")
            .in_phase(RulePhase::Post),
    )?;
    rules.register(
        "group_carbon_implicit_caco3",
        RuleDefinition::group([
            "npzd_carbon_flux",
            "pre_reset_calcite",
            "npzd_carbon_primary_production_dic",
            "npzd_carbon_recycling_detritus_dic",
            "npzd_carbon_recycling_phyto_dic",
            "npzd_carbon_excretion_dic",
            "npzd_carbon_bottom_remineralization_dic",
            "npzd_carbon_calcite_production_dic",
            "npzd_carbon_calcite_production_alk",
            "npzd_carbon_dic_alk",
            "post_distribute_calcite_dic",
            "post_distribute_calcite_alk",
        ]),
    )?;
    Ok(())
}

fn register_calcifier_rules(rules: &mut RuleCatalog) -> BgcResult<()> {
    rules.register(
        "npzd_calcifiers_primary_production",
        RuleDefinition::reaction(ReactionKind::PrimaryProduction, "po4", "coccolitophore")
            .with_label("Coccolithophore primary production"),
    )?;
    rules.register(
        "npzd_calcifiers_primary_production_dic",
        RuleDefinition::reaction(ReactionKind::PrimaryProductionDic, "dic", "coccolitophore")
            .with_label("DIC uptake by coccolithophores"),
    )?;
    rules.register(
        "npzd_calcifiers_grazing",
        RuleDefinition::reaction(ReactionKind::Grazing, "coccolitophore", "zooplankton")
            .with_label("Grazing of coccolithophores"),
    )?;
    rules.register(
        "npzd_calcifiers_sloppy_feeding",
        RuleDefinition::reaction(ReactionKind::SloppyFeeding, "coccolitophore", "detritus")
            .with_label("Sloppy feeding on coccolithophores"),
    )?;
    rules.register(
        "npzd_calcifiers_mortality",
        RuleDefinition::reaction(ReactionKind::Mortality, "coccolitophore", "detritus")
            .with_label("Coccolithophore mortality"),
    )?;
    rules.register(
        "npzd_calcifiers_fast_recycling",
        RuleDefinition::reaction(ReactionKind::Recycling, "coccolitophore", "po4")
            .with_label("Fast recycling of coccolithophores"),
    )?;
    rules.register(
        "npzd_calcifiers_recycling_dic",
        RuleDefinition::reaction(ReactionKind::RecyclingToDic, "coccolitophore", "dic")
            .with_label("DIC from recycled coccolithophores"),
    )?;
    rules.register(
        "npzd_calcifiers_calcite_production_dic",
        RuleDefinition::reaction(ReactionKind::CalciteProduction, "dic", "caco3")
            .with_label("Calcite production"),
    )?;
    rules.register(
        "npzd_calcifiers_calcite_production_alk",
        RuleDefinition::reaction(ReactionKind::CalciteProductionAlk, "alkalinity", "caco3")
            .with_label("Alkalinity debit of calcite production"),
    )?;
    rules.register(
        "npzd_calcifiers_bottom_dissolution_dic",
        RuleDefinition::reaction(ReactionKind::BottomRemineralizationDic, "caco3", "dic")
            .with_label("Calcite dissolving at the sea floor")
            .with_boundary(Boundary::Bottom),
    )?;
    rules.register(
        "group_npzd_calcifiers",
        RuleDefinition::group([
            "npzd_calcifiers_primary_production",
            "npzd_calcifiers_primary_production_dic",
            "npzd_calcifiers_grazing",
            "npzd_calcifiers_sloppy_feeding",
            "npzd_calcifiers_mortality",
            "npzd_calcifiers_fast_recycling",
            "npzd_calcifiers_recycling_dic",
            "npzd_calcifiers_calcite_production_dic",
            "npzd_calcifiers_calcite_production_alk",
            "npzd_calcifiers_bottom_dissolution_dic",
        ]),
    )?;
    Ok(())
}
