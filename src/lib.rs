// Hyperspectral cube utilities and principal component analysis

#![doc = include_str!("../README.md")]

pub mod bands;
pub mod error;
pub mod linalg_backends;
pub mod pca;
pub mod plot;
pub mod raster;

pub use bands::nearest_index;
pub use error::{Result, SpectralError, ThreadSafeStdError};
pub use pca::PCA;
pub use plot::{plot_spectra, PlotCommand, PlotLabels, PlotSurface, RecordingSurface};
pub use raster::{
    raster_to_matrix, raster_to_rgb, raster_to_rgb_with, rgb_band_indices, spectrum_at,
    RgbBandIndices, RgbTargets,
};
