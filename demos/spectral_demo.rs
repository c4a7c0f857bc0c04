use ndarray::{Array1, Array3};
use spectral_pca::{
    plot_spectra, raster_to_matrix, raster_to_rgb, spectrum_at, PlotLabels, RecordingSurface,
    SpectralError, PCA,
};

fn main() -> Result<(), SpectralError> {
    // A small synthetic scene: two materials mixed along the column axis.
    let (rows, cols, bands) = (6, 8, 31);
    let wavelengths = Array1::<f64>::linspace(400.0, 1000.0, bands);
    let vegetation = wavelengths.mapv(|w| 0.05 + 0.6 / (1.0 + (-(w - 710.0) / 15.0).exp()));
    let soil = wavelengths.mapv(|w| 0.1 + 0.3 * (w - 400.0) / 600.0);

    let cube = Array3::from_shape_fn((rows, cols, bands), |(r, c, b)| {
        let fraction = c as f64 / (cols - 1) as f64;
        let shade = 0.9 + 0.02 * r as f64;
        shade * (fraction * vegetation[b] + (1.0 - fraction) * soil[b])
    });

    let samples = raster_to_matrix(&cube)?;
    println!("Sample matrix shape: {:?}", samples.dim());

    let rgb = raster_to_rgb(&cube, &wavelengths)?;
    println!("RGB composite shape: {:?}", rgb.dim());

    let pixel = spectrum_at(&cube, (2, 7))?;
    println!("Spectrum at (2, 7) has {} samples", pixel.len());

    let mut surface = RecordingSurface::new();
    let labels = PlotLabels::default().with_legend(["vegetation", "soil"]);
    let endmembers = ndarray::stack![ndarray::Axis(0), vegetation, soil];
    plot_spectra(&mut surface, &wavelengths, &endmembers, &labels)?;
    println!("Recorded {} plot commands", surface.commands.len());

    let pca = PCA::fit(&samples)?;
    println!("Variance explained: {:?}", pca.variance_explained().slice(ndarray::s![..3]));
    println!("Components for 99.9%: {}", pca.components_for_variance(0.999)?);

    let scores = pca.reduce_dimension(&samples, 2)?;
    let errors = pca.reconstruction_error(&samples, 2)?;
    println!("Scores shape: {:?}", scores.dim());
    println!("Max reconstruction RMS with 2 components: {:e}", errors.fold(0.0f64, |acc, &e| acc.max(e)));

    Ok(())
}
