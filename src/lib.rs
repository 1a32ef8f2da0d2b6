//! An extensible NPZD (nutrient, phytoplankton, zooplankton, detritus)
//! reaction engine for ocean biogeochemistry.
//!
//! The engine owns the biogeochemical source terms of a tracer model: light
//! penetration, plankton growth, grazing, recycling, particle sinking and
//! the optional carbon and nitrogen chemistry on top. The surrounding
//! circulation model owns the grid, the velocities and the diffusivities,
//! and talks to the engine through [`grid::Forcing`] snapshots and a
//! [`transport::TransportOperators`] implementation.
//!
//! A model is assembled once from [`setup::NpzdSettings`]:
//!
//! ```
//! use bgc_core::grid::Grid;
//! use bgc_core::setup::{configure, NpzdSettings};
//! use bgc_core::transport::NpzdState;
//!
//! let grid = Grid::column(50.0, 10, 35.0);
//! let model = configure(&NpzdSettings::default(), &grid).unwrap();
//! let state = NpzdState::new(&model, &grid);
//! assert_eq!(state.tau.len(), model.tracers.len());
//! ```
//!
//! and then stepped with [`transport::advance`], which combines the
//! sub-stepped reaction integration of [`integrator`] with advection,
//! lateral diffusion and implicit vertical mixing.

pub mod grazing;
pub mod grid;
pub mod growth;
pub mod integrator;
pub mod light;
pub mod parameters;
pub mod rules;
pub mod setup;
pub mod sinking;
pub mod tracer;
pub mod transport;

pub mod errors;

pub use errors::{BgcError, BgcResult};
pub use parameters::NpzdParameters;
pub use setup::{configure, Extensions, NpzdModel, NpzdSettings};
pub use transport::{advance, NpzdState, NullTransport, TransportOperators};
