//! Configuration-level tests: assembling models from settings documents and
//! the error paths a misconfigured setup must hit.

use bgc_core::errors::BgcError;
use bgc_core::grid::{Field3, Forcing, Grid};
use bgc_core::setup::{configure, Extensions, NpzdSettings};
use bgc_core::transport::{advance, NpzdState, NullTransport};
use ndarray::Array2;

fn grid() -> Grid {
    Grid::column(50.0, 5, 30.0)
}

/// Every extension together: the full tracer set, three plankton types and
/// all five prey in the grazing pool.
#[test]
fn full_configuration() {
    let settings = NpzdSettings {
        extensions: Extensions {
            carbon: true,
            nitrogen: true,
            calcifiers: true,
        },
        ..Default::default()
    };
    let model = configure(&settings, &grid()).unwrap();

    // basic (4) + nitrogen (4) + carbon (3) + calcifiers (1)
    assert_eq!(model.tracers.len(), 12);
    // The explicit calcite tracer is transported.
    assert_eq!(model.tracers.transported().len(), 12);
    assert_eq!(model.plankton.len(), 3);
    assert_eq!(model.preferences.len(), 5);

    for name in [
        "po4",
        "phytoplankton",
        "zooplankton",
        "detritus",
        "no3",
        "dop",
        "don",
        "diazotroph",
        "dic",
        "alkalinity",
        "caco3",
        "coccolitophore",
    ] {
        assert!(model.tracers.id(name).is_ok(), "missing tracer {name}");
    }
}

/// Settings documents parse as TOML with defaults for everything omitted.
#[test]
fn settings_document_round_trip() {
    let settings = NpzdSettings::from_toml_str(
        r#"
        [parameters]
        dt_tracer = 43200.0
        gbio = 2.3e-6

        [extensions]
        carbon = true
        nitrogen = true
        "#,
    )
    .unwrap();
    assert!(settings.extensions.carbon);
    assert!(!settings.extensions.calcifiers);
    assert_eq!(settings.parameters.dt_tracer, 43200.0);

    let model = configure(&settings, &grid()).unwrap();
    assert_eq!(model.params.gbio, 2.3e-6);
}

#[test]
fn malformed_settings_are_rejected() {
    let err = NpzdSettings::from_toml_str("[extensions]\ncarbon = \"yes\"").unwrap_err();
    assert!(matches!(err, BgcError::InvalidParameters(_)));
}

/// Enabling the carbon extension makes the air-sea flux a required forcing
/// field.
#[test]
fn carbon_extension_requires_the_flux_forcing() {
    let grid = grid();
    let settings = NpzdSettings {
        extensions: Extensions {
            carbon: true,
            ..Default::default()
        },
        ..Default::default()
    };
    let model = configure(&settings, &grid).unwrap();
    let mut state = NpzdState::new(&model, &grid);

    let swr = Array2::from_elem((1, 1), 100.0);
    let temperature = Field3::from_elem((1, 1, 5), 10.0);
    let air = Array2::from_elem((1, 1), 10.0);
    let kappa = Field3::zeros((1, 1, 5));
    let forcing = Forcing {
        time_of_year: 0.1,
        swr: &swr,
        temperature: &temperature,
        surface_air_temperature: &air,
        kappa: &kappa,
        carbon_flux: None,
    };

    let err = advance(&model, &grid, forcing, &mut state, &NullTransport).unwrap_err();
    assert!(matches!(err, BgcError::MissingCarbonFlux));
}
