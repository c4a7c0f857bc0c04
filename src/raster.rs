// src/raster.rs

//! Helpers over (row, column, band) hyperspectral cubes.

use log::{debug, trace};
use ndarray::{s, Array1, Array2, Array3, ArrayBase, Axis, Data, Dimension};

use crate::bands::nearest_index;
use crate::error::{Result, SpectralError};
use crate::linalg_backends::as_cube;

/// Target wavelengths, in nanometers, used to synthesize an approximate true-color image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgbTargets {
    pub red_nm: f64,
    pub green_nm: f64,
    pub blue_nm: f64,
}

impl Default for RgbTargets {
    fn default() -> Self {
        Self {
            red_nm: 685.0,
            green_nm: 535.0,
            blue_nm: 475.0,
        }
    }
}

/// Band indices resolved for each color channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbBandIndices {
    pub red: usize,
    pub green: usize,
    pub blue: usize,
}

impl RgbBandIndices {
    pub fn as_array(&self) -> [usize; 3] {
        [self.red, self.green, self.blue]
    }
}

/// Flattens a (rows, cols, bands) cube into a (rows * cols, bands) matrix.
///
/// Each output row holds the spectrum of one pixel; pixels are ordered row-major,
/// so the column index varies fastest. Values are copied.
pub fn raster_to_matrix<S, D>(raster: &ArrayBase<S, D>) -> Result<Array2<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let cube = as_cube(raster, "Raster to matrix (rows x columns x bands)")?;
    let (rows, cols, bands) = cube.dim();
    trace!("Flattening {}x{}x{} raster into a {}x{} matrix", rows, cols, bands, rows * cols, bands);

    // Logical iteration order is row-major regardless of the cube's memory layout.
    let values: Vec<f64> = cube.iter().copied().collect();
    Array2::from_shape_vec((rows * cols, bands), values).map_err(|e| SpectralError::Shape {
        context: "Raster to matrix",
        expected: format!("{} pixel spectra of {} bands", rows * cols, bands),
        found: e.to_string(),
    })
}

/// Resolves the red, green and blue band indices for a wavelength array.
pub fn rgb_band_indices<S, D>(sorted_wavelengths: &ArrayBase<S, D>, targets: &RgbTargets) -> Result<RgbBandIndices>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let ndim = sorted_wavelengths.ndim();
    let wavelengths = sorted_wavelengths
        .view()
        .into_dimensionality::<ndarray::Ix1>()
        .map_err(|_| SpectralError::rank("RGB wavelength array", 1, ndim))?;

    let locate = |channel: &'static str, target_nm: f64| {
        nearest_index(&wavelengths, target_nm)
            .ok_or(SpectralError::WavelengthCoverage { channel, target_nm })
    };

    let indices = RgbBandIndices {
        red: locate("red", targets.red_nm)?,
        green: locate("green", targets.green_nm)?,
        blue: locate("blue", targets.blue_nm)?,
    };
    debug!(
        "RGB bands resolved: red={} ({} nm), green={} ({} nm), blue={} ({} nm)",
        indices.red,
        wavelengths[indices.red],
        indices.green,
        wavelengths[indices.green],
        indices.blue,
        wavelengths[indices.blue]
    );
    Ok(indices)
}

/// Builds an approximate RGB composite using bands nearest 685, 535 and 475 nm.
///
/// The wavelength array must be ascending and in nanometers. The result has shape
/// (rows, cols, 3) with channels ordered red, green, blue.
pub fn raster_to_rgb<S, D, SW, DW>(raster: &ArrayBase<S, D>, sorted_wavelengths: &ArrayBase<SW, DW>) -> Result<Array3<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
    SW: Data<Elem = f64>,
    DW: Dimension,
{
    raster_to_rgb_with(raster, sorted_wavelengths, &RgbTargets::default())
}

/// Same as [`raster_to_rgb`] with caller-chosen channel targets.
pub fn raster_to_rgb_with<S, D, SW, DW>(
    raster: &ArrayBase<S, D>,
    sorted_wavelengths: &ArrayBase<SW, DW>,
    targets: &RgbTargets,
) -> Result<Array3<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
    SW: Data<Elem = f64>,
    DW: Dimension,
{
    let cube = as_cube(raster, "RGB composite input (rows x columns x bands)")?;
    let indices = rgb_band_indices(sorted_wavelengths, targets)?;

    let bands = cube.len_of(Axis(2));
    if let Some(&missing) = indices.as_array().iter().find(|&&idx| idx >= bands) {
        return Err(SpectralError::LengthMismatch {
            context: "RGB band index against raster band count",
            left: missing + 1,
            right: bands,
        });
    }
    Ok(cube.select(Axis(2), &indices.as_array()))
}

/// Returns the spectrum (band vector) of the pixel at `(row, col)`.
pub fn spectrum_at<S, D>(data_cube: &ArrayBase<S, D>, pixel: (usize, usize)) -> Result<Array1<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let cube = as_cube(data_cube, "HSI data cube")?;
    let (rows, cols, _) = cube.dim();
    let (row, col) = pixel;
    if row >= rows || col >= cols {
        return Err(SpectralError::PixelOutOfBounds { row, col, rows, cols });
    }
    Ok(cube.slice(s![row, col, ..]).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array, Array1, Array3, IxDyn};

    fn wavelengths() -> Array1<f64> {
        Array1::linspace(400.0, 1000.0, 61) // 10 nm spacing
    }

    fn ramp_cube(rows: usize, cols: usize, bands: usize) -> Array3<f64> {
        Array3::from_shape_fn((rows, cols, bands), |(r, c, b)| (r * 100 + c * 10 + b) as f64)
    }

    #[test]
    fn flattening_preserves_row_major_pixel_order() {
        let cube = ramp_cube(2, 3, 4);
        let m = raster_to_matrix(&cube).expect("3-D input");
        assert_eq!(m.dim(), (6, 4));
        // Pixel (1, 2) lands in row 1 * 3 + 2.
        assert_eq!(m.row(5).to_vec(), vec![120.0, 121.0, 122.0, 123.0]);
        assert_eq!(m.row(1).to_vec(), vec![10.0, 11.0, 12.0, 13.0]);
    }

    #[test]
    fn flattening_handles_column_major_and_sliced_cubes() {
        let cube = ramp_cube(3, 2, 5);
        let fortran = cube.t().as_standard_layout().t().to_owned();
        assert_eq!(raster_to_matrix(&fortran).expect("3-D"), raster_to_matrix(&cube).expect("3-D"));

        let sub = cube.slice(s![1.., .., 1..3]);
        let m = raster_to_matrix(&sub).expect("3-D view");
        assert_eq!(m.dim(), (4, 2));
        assert_eq!(m.row(0).to_vec(), vec![101.0, 102.0]);
    }

    #[test]
    fn flattening_copies_values() {
        let mut cube = ramp_cube(1, 2, 2);
        let m = raster_to_matrix(&cube).expect("3-D");
        cube[[0, 0, 0]] = -1.0;
        assert_eq!(m[[0, 0]], 0.0);
    }

    #[test]
    fn flattening_rejects_other_ranks() {
        let flat = Array::<f64, _>::zeros(IxDyn(&[4, 4]));
        assert!(matches!(raster_to_matrix(&flat), Err(SpectralError::Shape { .. })));
        let four_d = Array::<f64, _>::zeros(IxDyn(&[2, 2, 2, 2]));
        assert!(matches!(raster_to_matrix(&four_d), Err(SpectralError::Shape { .. })));
    }

    #[test]
    fn rgb_selects_nearest_bands_in_channel_order() {
        // Strictly-between targets: shift the grid by 3 nm so no target hits an entry.
        let w = wavelengths() + 3.0;
        let cube = ramp_cube(2, 2, w.len());
        let indices = rgb_band_indices(&w, &RgbTargets::default()).expect("covered");
        // 685 -> 683 (idx 28), 535 -> 533 (idx 13), 475 -> 473 (idx 7).
        assert_eq!(indices, RgbBandIndices { red: 28, green: 13, blue: 7 });

        let rgb = raster_to_rgb(&cube, &w).expect("covered");
        assert_eq!(rgb.dim(), (2, 2, 3));
        assert_eq!(rgb.slice(s![1, 0, ..]).to_vec(), vec![128.0, 113.0, 107.0]);
    }

    #[test]
    fn rgb_midpoint_targets_take_lower_band() {
        // Every default target sits exactly halfway between two 10 nm grid entries.
        let w = wavelengths();
        let indices = rgb_band_indices(&w, &RgbTargets::default()).expect("covered");
        assert_eq!(indices.as_array(), [28, 13, 7]);
    }

    #[test]
    fn rgb_reports_uncovered_channel() {
        let nir = array![700.0, 750.0, 800.0, 850.0];
        let cube = ramp_cube(1, 1, 4);
        match raster_to_rgb(&cube, &nir) {
            Err(SpectralError::WavelengthCoverage { channel, target_nm }) => {
                assert_eq!(channel, "red");
                assert_eq!(target_nm, 685.0);
            }
            other => panic!("expected coverage error, got {:?}", other),
        }
    }

    #[test]
    fn rgb_custom_targets() {
        let w = array![400.0, 500.0, 600.0, 700.0];
        let cube = ramp_cube(1, 1, 4);
        let targets = RgbTargets { red_nm: 690.0, green_nm: 560.0, blue_nm: 420.0 };
        let rgb = raster_to_rgb_with(&cube, &w, &targets).expect("covered");
        assert_eq!(rgb.slice(s![0, 0, ..]).to_vec(), vec![3.0, 2.0, 0.0]);
    }

    #[test]
    fn rgb_rank_checks() {
        let w = wavelengths();
        let flat = Array::<f64, _>::zeros(IxDyn(&[3, 61]));
        assert!(matches!(raster_to_rgb(&flat, &w), Err(SpectralError::Shape { .. })));
        let cube = ramp_cube(1, 1, 61);
        let w2 = Array::<f64, _>::zeros(IxDyn(&[61, 1]));
        assert!(matches!(raster_to_rgb(&cube, &w2), Err(SpectralError::Shape { .. })));
    }

    #[test]
    fn rgb_band_beyond_cube_is_a_mismatch() {
        let w = wavelengths() + 3.0;
        let cube = ramp_cube(1, 1, 10);
        assert!(matches!(raster_to_rgb(&cube, &w), Err(SpectralError::LengthMismatch { .. })));
    }

    #[test]
    fn spectrum_is_band_slice_at_pixel() {
        let cube = ramp_cube(3, 4, 5);
        let spectrum = spectrum_at(&cube, (2, 1)).expect("in bounds");
        assert_eq!(spectrum.to_vec(), vec![210.0, 211.0, 212.0, 213.0, 214.0]);
    }

    #[test]
    fn spectrum_out_of_bounds_and_rank() {
        let cube = ramp_cube(3, 4, 5);
        assert!(matches!(
            spectrum_at(&cube, (3, 0)),
            Err(SpectralError::PixelOutOfBounds { row: 3, col: 0, rows: 3, cols: 4 })
        ));
        let flat = Array::<f64, _>::zeros(IxDyn(&[3, 4]));
        assert!(matches!(spectrum_at(&flat, (0, 0)), Err(SpectralError::Shape { .. })));
    }
}
