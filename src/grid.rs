//! Grid geometry and per-timestep forcing snapshots.
//!
//! The outer circulation model owns the grid; the reaction engine only needs
//! the vertical geometry, the wet-cell mask and the bathymetry index. Vertical
//! index `k = nz - 1` is the surface layer and `k = 0` the deepest layer, so a
//! water column of partial depth occupies the topmost cells.

use ndarray::{Array1, Array2, Array3};

/// A grid-shaped scalar field, `(nx, ny, nz)`.
pub type Field3 = Array3<f64>;
/// A grid-shaped boolean mask, `(nx, ny, nz)`.
pub type Mask3 = Array3<bool>;

/// Static grid geometry shared by all tracers.
#[derive(Debug, Clone)]
pub struct Grid {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    /// Layer thickness at tracer points (m), length `nz`.
    pub dzt: Array1<f64>,
    /// Vertical spacing between tracer points (m), length `nz`.
    pub dzw: Array1<f64>,
    /// Depth of the top face of each layer (m, negative downward), length
    /// `nz`; `zw[nz - 1]` is at the sea surface.
    pub zw: Array1<f64>,
    /// Latitude of tracer points (degrees), length `ny`.
    pub yt: Array1<f64>,
    /// Wet-cell mask.
    pub mask: Mask3,
    /// Bathymetry index: 0 marks a land column, otherwise `kbot - 1` is the
    /// deepest wet cell of the column.
    pub kbot: Array2<usize>,
    /// True at the deepest wet cell of each column, derived from `kbot`.
    pub bottom_mask: Mask3,
    /// Whether the domain wraps around in x.
    pub cyclic_x: bool,
}

impl Grid {
    /// Assemble a grid and derive the bottom mask from the bathymetry index.
    pub fn new(
        dzt: Array1<f64>,
        dzw: Array1<f64>,
        zw: Array1<f64>,
        yt: Array1<f64>,
        mask: Mask3,
        kbot: Array2<usize>,
        cyclic_x: bool,
    ) -> Self {
        let (nx, ny, nz) = mask.dim();
        assert_eq!(dzt.len(), nz, "dzt length must match nz");
        assert_eq!(dzw.len(), nz, "dzw length must match nz");
        assert_eq!(zw.len(), nz, "zw length must match nz");
        assert_eq!(yt.len(), ny, "yt length must match ny");
        assert_eq!(kbot.dim(), (nx, ny), "kbot shape must match (nx, ny)");

        let mut bottom_mask = Mask3::from_elem((nx, ny, nz), false);
        for i in 0..nx {
            for j in 0..ny {
                let kb = kbot[[i, j]];
                if kb > 0 {
                    bottom_mask[[i, j, kb - 1]] = true;
                }
            }
        }

        Self {
            nx,
            ny,
            nz,
            dzt,
            dzw,
            zw,
            yt,
            mask,
            kbot,
            bottom_mask,
            cyclic_x,
        }
    }

    /// A flat-bottomed single column, mostly useful for testing and
    /// stand-alone runs of the reaction engine.
    pub fn column(dz: f64, nz: usize, latitude: f64) -> Self {
        let dzt = Array1::from_elem(nz, dz);
        let dzw = Array1::from_elem(nz, dz);
        // Top faces counted down from the surface.
        let zw = Array1::from_shape_fn(nz, |k| -(((nz - 1 - k) as f64) * dz));
        let yt = Array1::from_elem(1, latitude);
        let mask = Mask3::from_elem((1, 1, nz), true);
        let kbot = Array2::from_elem((1, 1), 1);
        Self::new(dzt, dzw, zw, yt, mask, kbot, false)
    }

    /// Multiplicative form of the wet-cell mask.
    pub(crate) fn mask_value(&self, i: usize, j: usize, k: usize) -> f64 {
        if self.mask[[i, j, k]] {
            1.0
        } else {
            0.0
        }
    }

    /// Index of the surface layer.
    pub(crate) fn surface(&self) -> usize {
        self.nz - 1
    }
}

/// Read-only forcing snapshot supplied by the outer model each timestep.
#[derive(Debug, Clone, Copy)]
pub struct Forcing<'a> {
    /// Fraction of the year elapsed, in `[0, 1)`.
    pub time_of_year: f64,
    /// Surface shortwave irradiance (W/m^2).
    pub swr: &'a Array2<f64>,
    /// In-situ temperature at the current time level (degC).
    pub temperature: &'a Field3,
    /// Atmospheric forcing temperature at the surface (degC), used together
    /// with the sea surface temperature to detect ice cover.
    pub surface_air_temperature: &'a Array2<f64>,
    /// Vertical diffusivity at layer interfaces (m^2/s).
    pub kappa: &'a Field3,
    /// Air-sea carbon flux (mmol C / m^2 / s), required only when the carbon
    /// extension is enabled and its surface-flux rule is selected.
    pub carbon_flux: Option<&'a Array2<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_grid_geometry() {
        let grid = Grid::column(10.0, 4, 0.0);
        assert_eq!((grid.nx, grid.ny, grid.nz), (1, 1, 4));
        assert_eq!(grid.surface(), 3);
        // Surface top face sits at z = 0, deepest top face at -30 m.
        assert_eq!(grid.zw[3], 0.0);
        assert_eq!(grid.zw[0], -30.0);
        // Flat bottom: the deepest cell is the bottom cell.
        assert!(grid.bottom_mask[[0, 0, 0]]);
        assert!(!grid.bottom_mask[[0, 0, 1]]);
    }

    #[test]
    fn land_columns_have_no_bottom_cell() {
        let mut kbot = Array2::from_elem((2, 1), 3);
        kbot[[1, 0]] = 0;
        let grid = Grid::new(
            Array1::from_elem(3, 5.0),
            Array1::from_elem(3, 5.0),
            Array1::from_shape_fn(3, |k| -(((2 - k) as f64) * 5.0)),
            Array1::from_elem(1, 45.0),
            Mask3::from_elem((2, 1, 3), true),
            kbot,
            false,
        );
        assert!(grid.bottom_mask[[0, 0, 2]]);
        assert!(!grid.bottom_mask.slice(ndarray::s![1, .., ..]).iter().any(|&b| b));
    }
}
