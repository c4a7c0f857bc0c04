// src/plot.rs

//! Spectral curve plotting onto a caller-supplied surface.
//!
//! Nothing here renders pixels. [`PlotSurface`] is the seam a host implements
//! for its own plotting library; [`RecordingSurface`] keeps the calls in memory.

use log::debug;
use ndarray::{ArrayBase, ArrayView1, Axis, Data, Dimension, Ix1};

use crate::error::{Result, SpectralError, ThreadSafeStdError};
use crate::linalg_backends::as_matrix;

/// Headroom applied above the largest plotted value.
const Y_HEADROOM: f64 = 1.10;

/// Drawing operations required by [`plot_spectra`].
pub trait PlotSurface {
    fn draw_line_series(&mut self, x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> std::result::Result<(), ThreadSafeStdError>;
    fn enable_grid(&mut self) -> std::result::Result<(), ThreadSafeStdError>;
    fn set_x_limits(&mut self, min: f64, max: f64) -> std::result::Result<(), ThreadSafeStdError>;
    fn set_y_limits(&mut self, min: f64, max: f64) -> std::result::Result<(), ThreadSafeStdError>;
    fn set_x_label(&mut self, label: &str) -> std::result::Result<(), ThreadSafeStdError>;
    fn set_y_label(&mut self, label: &str) -> std::result::Result<(), ThreadSafeStdError>;
    fn attach_legend(&mut self, labels: &[String]) -> std::result::Result<(), ThreadSafeStdError>;
}

/// Axis labels and optional legend entries for a spectra plot.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotLabels {
    pub x_label: String,
    pub y_label: String,
    /// One entry per spectrum, or empty for no legend.
    pub legend: Vec<String>,
}

impl Default for PlotLabels {
    fn default() -> Self {
        Self {
            x_label: "Wavelength (nm)".to_string(),
            y_label: "Radiance".to_string(),
            legend: Vec::new(),
        }
    }
}

impl PlotLabels {
    pub fn with_legend<I, L>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        self.legend = labels.into_iter().map(Into::into).collect();
        self
    }
}

/// Plots each row of `spectra` against `wavelengths`.
///
/// `spectra` has shape (n_spectra, n_samples) and `n_samples` must equal the number of
/// wavelengths. The x-axis spans the first to last wavelength and the y-axis spans
/// zero to 110% of the largest value across all spectra. A legend is attached only
/// when `labels.legend` is non-empty, in which case it needs one entry per spectrum.
/// A NaN anywhere in `spectra` makes the upper y-limit NaN.
pub fn plot_spectra<P, SW, S, D>(
    surface: &mut P,
    wavelengths: &ArrayBase<SW, Ix1>,
    spectra: &ArrayBase<S, D>,
    labels: &PlotLabels,
) -> Result<()>
where
    P: PlotSurface + ?Sized,
    SW: Data<Elem = f64>,
    S: Data<Elem = f64>,
    D: Dimension,
{
    let spectra = as_matrix(spectra, "Spectra to plot (n_spectra x n_samples)")?;
    let (n_spectra, n_samples) = spectra.dim();

    if wavelengths.len() != n_samples {
        return Err(SpectralError::LengthMismatch {
            context: "Cannot plot spectra; number of wavelengths (x-axis) and samples (y-axis)",
            left: wavelengths.len(),
            right: n_samples,
        });
    }
    if !labels.legend.is_empty() && labels.legend.len() != n_spectra {
        return Err(SpectralError::LengthMismatch {
            context: "Legend labels against number of spectra",
            left: labels.legend.len(),
            right: n_spectra,
        });
    }
    if spectra.is_empty() {
        return Err(SpectralError::empty("Spectra to plot", spectra.shape()));
    }

    // NaN samples poison the maximum, so the y-limit becomes NaN.
    let y_max = spectra.iter().copied().fold(f64::NEG_INFINITY, |acc, val| {
        if acc.is_nan() || val.is_nan() {
            f64::NAN
        } else {
            acc.max(val)
        }
    });
    debug!("Plotting {} spectra over {} wavelengths, y max {}", n_spectra, n_samples, y_max);

    for spectrum in spectra.axis_iter(Axis(0)) {
        surface.draw_line_series(wavelengths.view(), spectrum).map_err(SpectralError::Surface)?;
    }
    surface.enable_grid().map_err(SpectralError::Surface)?;
    surface
        .set_x_limits(wavelengths[0], wavelengths[n_samples - 1])
        .map_err(SpectralError::Surface)?;
    surface.set_y_limits(0.0, Y_HEADROOM * y_max).map_err(SpectralError::Surface)?;
    surface.set_x_label(&labels.x_label).map_err(SpectralError::Surface)?;
    surface.set_y_label(&labels.y_label).map_err(SpectralError::Surface)?;
    if !labels.legend.is_empty() {
        surface.attach_legend(&labels.legend).map_err(SpectralError::Surface)?;
    }
    Ok(())
}

/// One call made against a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum PlotCommand {
    LineSeries { x: Vec<f64>, y: Vec<f64> },
    Grid,
    XLimits(f64, f64),
    YLimits(f64, f64),
    XLabel(String),
    YLabel(String),
    Legend(Vec<String>),
}

/// A surface that records every drawing call, in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    pub commands: Vec<PlotCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line_series(&self) -> impl Iterator<Item = (&[f64], &[f64])> {
        self.commands.iter().filter_map(|cmd| match cmd {
            PlotCommand::LineSeries { x, y } => Some((x.as_slice(), y.as_slice())),
            _ => None,
        })
    }
}

impl PlotSurface for RecordingSurface {
    fn draw_line_series(&mut self, x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> std::result::Result<(), ThreadSafeStdError> {
        self.commands.push(PlotCommand::LineSeries { x: x.to_vec(), y: y.to_vec() });
        Ok(())
    }

    fn enable_grid(&mut self) -> std::result::Result<(), ThreadSafeStdError> {
        self.commands.push(PlotCommand::Grid);
        Ok(())
    }

    fn set_x_limits(&mut self, min: f64, max: f64) -> std::result::Result<(), ThreadSafeStdError> {
        self.commands.push(PlotCommand::XLimits(min, max));
        Ok(())
    }

    fn set_y_limits(&mut self, min: f64, max: f64) -> std::result::Result<(), ThreadSafeStdError> {
        self.commands.push(PlotCommand::YLimits(min, max));
        Ok(())
    }

    fn set_x_label(&mut self, label: &str) -> std::result::Result<(), ThreadSafeStdError> {
        self.commands.push(PlotCommand::XLabel(label.to_string()));
        Ok(())
    }

    fn set_y_label(&mut self, label: &str) -> std::result::Result<(), ThreadSafeStdError> {
        self.commands.push(PlotCommand::YLabel(label.to_string()));
        Ok(())
    }

    fn attach_legend(&mut self, labels: &[String]) -> std::result::Result<(), ThreadSafeStdError> {
        self.commands.push(PlotCommand::Legend(labels.to_vec()));
        Ok(())
    }
}
