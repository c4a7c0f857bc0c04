// Principal component analysis (PCA)

use log::{debug, info, warn};
use ndarray::{s, Array1, Array2, ArrayBase, Axis, Data, Dimension, Zip};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{Result, SpectralError};
use crate::linalg_backends::{as_matrix, checked_dot, BackendSVD, LinAlgBackendProvider};

/// Principal component analysis (PCA) model.
///
/// A model is fitted once from a sample matrix and is immutable afterwards; every
/// transform borrows it read-only, so a single model can be shared across threads.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PCA {
    /// Mean of each feature in the fitting data.
    /// Shape: (n_features)
    mean: Array1<f64>,
    /// Orthonormal principal axes stored as columns, highest variance first.
    /// Shape: (n_features, n_features)
    components: Array2<f64>,
    /// Fraction of total variance carried by each component, descending and summing to one.
    /// Shape: (n_features)
    variance_explained: Array1<f64>,
}

impl PCA {
    /// Fits the model to `data_matrix` with the backend selected by cargo features.
    ///
    /// The data is centered on its column means and decomposed with a full SVD.
    /// Singular values `s_i` become covariance eigenvalues `s_i² / (n_samples - 1)`,
    /// which are then normalized to the variance-explained fractions. When there are
    /// fewer samples than features the trailing eigenvalues are zero.
    ///
    /// A single-sample matrix is accepted: the division by `n_samples - 1` is left
    /// unguarded and the variance explained comes out as NaN.
    ///
    /// * `data_matrix` - Input data as a 2D array, shape (n_samples, n_features).
    ///
    /// # Errors
    /// Returns an error if the input is not 2-dimensional, has no samples or no
    /// features, or if the SVD fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndarray::array;
    /// use spectral_pca::PCA;
    ///
    /// let data = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
    /// let pca = PCA::fit(&data).unwrap();
    /// assert_eq!(pca.components().dim(), (2, 2));
    /// assert!((pca.variance_explained().sum() - 1.0).abs() < 1e-12);
    /// ```
    pub fn fit<S, D>(data_matrix: &ArrayBase<S, D>) -> Result<Self>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        Self::fit_with_backend(data_matrix, &LinAlgBackendProvider::<f64>::new())
    }

    /// Same as [`PCA::fit`], decomposing through an explicit SVD backend.
    pub fn fit_with_backend<S, D, B>(data_matrix: &ArrayBase<S, D>, backend: &B) -> Result<Self>
    where
        S: Data<Elem = f64>,
        D: Dimension,
        B: BackendSVD<f64> + ?Sized,
    {
        let data = as_matrix(
            data_matrix,
            "Array passed to principal component constructor (n_samples x n_features)",
        )?;
        let (n_samples, n_features) = data.dim();
        if n_samples == 0 || n_features == 0 {
            return Err(SpectralError::empty("Principal component constructor", data.shape()));
        }
        let fit_start_time = Instant::now();

        let mean_vector = data
            .mean_axis(Axis(0))
            .ok_or_else(|| SpectralError::empty("Principal component mean", data.shape()))?;
        let centered_data = &data - &mean_vector;

        let svd_output = backend
            .svd_into(centered_data, false, true)
            .map_err(SpectralError::Backend)?;
        let vt_matrix = svd_output
            .vt
            .ok_or_else(|| SpectralError::Backend("SVD backend did not return right singular vectors.".into()))?;
        if vt_matrix.dim() != (n_features, n_features) {
            return Err(SpectralError::Backend(
                format!(
                    "SVD backend returned a {:?} right-singular basis; expected ({}, {}).",
                    vt_matrix.dim(),
                    n_features,
                    n_features
                )
                .into(),
            ));
        }
        // Rows of Vᵀ are the principal directions; store them as columns.
        let components = vt_matrix.reversed_axes();

        if n_samples == 1 {
            warn!("Fitting PCA on a single sample; variance explained is undefined (division by n_samples - 1 = 0).");
        }
        let bessel_denominator = (n_samples - 1) as f64;
        let singular_values = svd_output.s;
        let mut eigenvalues = Array1::<f64>::zeros(n_features);
        eigenvalues
            .slice_mut(s![..singular_values.len()])
            .assign(&singular_values.mapv(|s_val| s_val.powi(2) / bessel_denominator));

        let total_variance = eigenvalues.sum();
        if n_samples > 1 && total_variance <= 0.0 {
            warn!("Input data has zero total variance; variance explained is undefined.");
        }
        let variance_explained = eigenvalues / total_variance;

        info!(
            "Fitted PCA on {} samples x {} features in {:?}",
            n_samples,
            n_features,
            fit_start_time.elapsed()
        );
        debug!(
            "Leading variance explained: {:?}",
            variance_explained.slice(s![..n_features.min(5)])
        );

        Ok(Self {
            mean: mean_vector,
            components,
            variance_explained,
        })
    }

    /// Rebuilds a model from parts a host application persisted.
    ///
    /// # Errors
    /// Returns an error if the parts disagree in feature count, the component
    /// matrix is not square, or any variance fraction is negative or non-finite.
    pub fn from_parts(
        mean: Array1<f64>,
        components: Array2<f64>,
        variance_explained: Array1<f64>,
    ) -> Result<Self> {
        let n_features = mean.len();
        if n_features == 0 {
            return Err(SpectralError::empty("PCA model mean", mean.shape()));
        }
        if components.nrows() != n_features || components.ncols() != n_features {
            return Err(SpectralError::LengthMismatch {
                context: "PCA component matrix (must be n_features x n_features) against mean length",
                left: components.nrows().max(components.ncols()),
                right: n_features,
            });
        }
        if variance_explained.len() != n_features {
            return Err(SpectralError::LengthMismatch {
                context: "Variance explained against mean length",
                left: variance_explained.len(),
                right: n_features,
            });
        }
        if variance_explained.iter().any(|&val| !val.is_finite() || val < 0.0) {
            return Err(SpectralError::OutOfRange(
                "variance explained contains negative or non-finite values".to_string(),
            ));
        }
        Ok(Self {
            mean,
            components,
            variance_explained,
        })
    }

    /// Returns the per-feature mean of the fitting data.
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Returns the principal axes as columns, shape (n_features, n_features).
    pub fn components(&self) -> &Array2<f64> {
        &self.components
    }

    /// Returns the fraction of total variance explained by each component.
    pub fn variance_explained(&self) -> &Array1<f64> {
        &self.variance_explained
    }

    pub fn n_features(&self) -> usize {
        self.variance_explained.len()
    }

    /// Running sum of [`PCA::variance_explained`].
    pub fn cumulative_variance_explained(&self) -> Array1<f64> {
        self.variance_explained
            .iter()
            .scan(0.0, |running_total, &fraction| {
                *running_total += fraction;
                Some(*running_total)
            })
            .collect()
    }

    /// Smallest number of leading components whose cumulative variance reaches `fraction`.
    ///
    /// # Errors
    /// Returns an error if `fraction` is not in `(0, 1]` or the model's variance
    /// explained is undefined (for example after a single-sample fit).
    pub fn components_for_variance(&self, fraction: f64) -> Result<usize> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(SpectralError::OutOfRange(format!(
                "variance fraction {} must lie in (0, 1]",
                fraction
            )));
        }
        if self.variance_explained.iter().any(|val| !val.is_finite()) {
            return Err(SpectralError::OutOfRange(
                "variance explained is undefined for this model".to_string(),
            ));
        }
        // Rounding can leave the full sum a hair below 1.0.
        const SUM_TOLERANCE: f64 = 1e-12;
        let n_components = self
            .cumulative_variance_explained()
            .iter()
            .position(|&cumulative| cumulative >= fraction - SUM_TOLERANCE)
            .map_or(self.n_features(), |idx| idx + 1);
        Ok(n_components)
    }

    /// Rotates raw data into the principal-axis frame: `data · components`.
    ///
    /// Unlike [`PCA::reduce_dimension`] the data is NOT centered first. The column
    /// count is not checked here; a mismatch surfaces as the matrix product's
    /// [`SpectralError::IncompatibleProduct`].
    ///
    /// # Errors
    /// Returns an error if the input is not 2-dimensional or its column count
    /// does not match the model.
    pub fn rotate_to_principal_axes<S, D>(&self, data_matrix: &ArrayBase<S, D>) -> Result<Array2<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let data = as_matrix(
            data_matrix,
            "Array passed to principal component transformation",
        )?;
        checked_dot(data, self.components.view())
    }

    /// Projects mean-centered data onto the first `number_components` principal axes.
    ///
    /// Returns `(data - mean) · components[:, :k]`, shape (n_samples, k).
    ///
    /// # Errors
    /// Returns an error if the input is not 2-dimensional, if `number_components`
    /// is outside `1..=n_features`, or if the input's feature count differs from the model's.
    pub fn reduce_dimension<S, D>(&self, data_matrix: &ArrayBase<S, D>, number_components: usize) -> Result<Array2<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let data = as_matrix(
            data_matrix,
            "Array passed to principal component transformation",
        )?;
        let available = self.n_features();
        if number_components < 1 || number_components > available {
            return Err(SpectralError::ComponentCount {
                requested: number_components,
                available,
            });
        }
        if data.ncols() != self.mean.len() {
            return Err(SpectralError::LengthMismatch {
                context: "Input feature count against model mean",
                left: data.ncols(),
                right: self.mean.len(),
            });
        }
        let centered_data = &data - &self.mean;
        checked_dot(
            centered_data.view(),
            self.components.slice(s![.., ..number_components]),
        )
    }

    /// Maps reduced scores back to feature space.
    ///
    /// For scores of shape (n_samples, k) returns `(components[:, :k] · scoresᵀ)ᵀ + mean`,
    /// shape (n_samples, n_features). This inverts [`PCA::reduce_dimension`] exactly when
    /// `k == n_features` and is lossy otherwise.
    ///
    /// # Errors
    /// Returns an error if the input is not 2-dimensional or has more columns than the
    /// model has components.
    pub fn reconstruct<S, D>(&self, data_matrix: &ArrayBase<S, D>) -> Result<Array2<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let scores = as_matrix(
            data_matrix,
            "Array passed to principal component reconstruction",
        )?;
        let k_components = scores.ncols();
        if k_components > self.n_features() {
            return Err(SpectralError::ComponentCount {
                requested: k_components,
                available: self.n_features(),
            });
        }
        let basis = self.components.slice(s![.., ..k_components]);
        let restored = checked_dot(basis, scores.t())?.reversed_axes();
        Ok(restored + &self.mean)
    }

    /// Root-mean-square error per sample after reducing to `number_components` and reconstructing.
    ///
    /// # Errors
    /// Same conditions as [`PCA::reduce_dimension`].
    pub fn reconstruction_error<S, D>(&self, data_matrix: &ArrayBase<S, D>, number_components: usize) -> Result<Array1<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let data = as_matrix(
            data_matrix,
            "Array passed to principal component reconstruction error",
        )?;
        let reduced = self.reduce_dimension(&data, number_components)?;
        let restored = self.reconstruct(&reduced)?;

        let per_sample_rms = Zip::from(data.rows())
            .and(restored.rows())
            .par_map_collect(|sample, restored_sample| {
                let residual = &sample - &restored_sample;
                residual.mapv(|val| val * val).mean().unwrap_or(0.0).sqrt()
            });
        Ok(per_sample_rms)
    }

    /// Encodes the model into a compact byte buffer (bincode, standard config).
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serde::encode_to_vec(self, bincode::config::standard())?)
    }

    /// Decodes a model produced by [`PCA::to_bytes`], re-validating its parts.
    ///
    /// # Errors
    /// Returns an error if decoding fails or the decoded parts are inconsistent.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (decoded, _bytes_read): (PCA, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        Self::from_parts(decoded.mean, decoded.components, decoded.variance_explained)
    }
}
