// src/linalg_backends.rs

use ndarray::{Array1, Array2, ArrayBase, ArrayView2, ArrayView3, Data, Dimension, Ix2, Ix3};
use std::marker::PhantomData;

use crate::error::{Result, SpectralError, ThreadSafeStdError};

/// Output of a Singular Value Decomposition `A = U S Vᵀ`.
#[derive(Debug)]
pub struct SVDOutput<F: 'static> {
    pub u: Option<Array2<F>>,
    /// Singular values in descending order, length `min(nrows, ncols)`.
    pub s: Array1<F>,
    /// Full right-singular basis `Vᵀ`, shape `(ncols, ncols)`.
    pub vt: Option<Array2<F>>,
}

/// Trait for a full (not thin) Singular Value Decomposition.
pub trait BackendSVD<F: 'static + Copy + Send + Sync> {
    fn svd_into(&self, matrix: Array2<F>, compute_u: bool, compute_v: bool) -> std::result::Result<SVDOutput<F>, ThreadSafeStdError>;
}

/// Dispatches to the backend chosen by cargo features.
#[derive(Debug, Default, Copy, Clone)]
pub struct LinAlgBackendProvider<F: 'static + Copy + Send + Sync> {
    _phantom: PhantomData<F>,
}

impl<F: 'static + Copy + Send + Sync> LinAlgBackendProvider<F> {
    pub fn new() -> Self {
        Self { _phantom: PhantomData }
    }
}

// --- ndarray-linalg (LAPACK) backend ---
use ndarray_linalg::SVDInto as NdLinalgSVDInto;

#[derive(Debug, Default, Copy, Clone)]
pub struct NdarrayLinAlgBackend;

fn to_dyn_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> ThreadSafeStdError {
    Box::new(e)
}

impl BackendSVD<f64> for NdarrayLinAlgBackend {
    fn svd_into(&self, matrix: Array2<f64>, compute_u: bool, compute_v: bool) -> std::result::Result<SVDOutput<f64>, ThreadSafeStdError> {
        let (u, s, vt) = matrix.svd_into(compute_u, compute_v).map_err(to_dyn_error)?;
        Ok(SVDOutput { u, s, vt })
    }
}

// --- faer backend ---
#[cfg(feature = "backend_faer")]
mod faer_specific_code {
    use super::{BackendSVD, SVDOutput};
    use crate::error::ThreadSafeStdError;
    use faer::linalg::solvers::Svd as FaerSolverSvd;
    use faer::MatRef;
    use ndarray::{Array1, Array2, ShapeBuilder};

    fn to_dyn_error_faer(msg: String) -> ThreadSafeStdError {
        Box::new(std::io::Error::new(std::io::ErrorKind::Other, msg))
    }

    #[derive(Debug, Default, Copy, Clone)]
    pub struct FaerLinAlgBackend;

    fn faer_mat_to_ndarray(faer_mat: MatRef<'_, f64>) -> Result<Array2<f64>, ThreadSafeStdError> {
        let nrows = faer_mat.nrows();
        let ncols = faer_mat.ncols();
        let mut data_vec = Vec::with_capacity(nrows * ncols);
        for j in 0..ncols {
            for i in 0..nrows {
                data_vec.push(unsafe { *faer_mat.get_unchecked(i, j) });
            }
        }
        Array2::from_shape_vec((nrows, ncols).f(), data_vec).map_err(|e| {
            to_dyn_error_faer(format!("Failed to copy {}x{} faer matrix into ndarray: {}", nrows, ncols, e))
        })
    }

    fn faer_col_to_ndarray_vec(faer_col: faer::ColRef<'_, f64>) -> Array1<f64> {
        (0..faer_col.nrows())
            .map(|i| unsafe { *faer_col.get_unchecked(i) })
            .collect()
    }

    impl BackendSVD<f64> for FaerLinAlgBackend {
        fn svd_into(&self, matrix: Array2<f64>, compute_u: bool, compute_v: bool) -> Result<SVDOutput<f64>, ThreadSafeStdError> {
            let (nrows, ncols) = matrix.dim();
            // faer views need a contiguous slice; row-major is the common case for cubes.
            let matrix = matrix.as_standard_layout().into_owned();
            let slice = matrix.as_slice().ok_or_else(|| {
                to_dyn_error_faer(format!("Matrix ({}x{}) is not contiguous after relayout.", nrows, ncols))
            })?;
            let faer_mat_ref = MatRef::from_row_major_slice(slice, nrows, ncols);

            let svd_solver_instance = FaerSolverSvd::new(faer_mat_ref)
                .map_err(|e| to_dyn_error_faer(format!("Faer SVD computation failed: {:?}", e)))?;

            let s_ndarray = faer_col_to_ndarray_vec(svd_solver_instance.S().column_vector());
            let k_dim = nrows.min(ncols);
            let s_ndarray = s_ndarray.slice(ndarray::s![..k_dim]).to_owned();

            let u_ndarray = if compute_u {
                Some(faer_mat_to_ndarray(svd_solver_instance.U().as_ref())?)
            } else {
                None
            };
            let vt_ndarray = if compute_v {
                Some(faer_mat_to_ndarray(svd_solver_instance.V().as_ref())?.reversed_axes())
            } else {
                None
            };

            Ok(SVDOutput { u: u_ndarray, s: s_ndarray, vt: vt_ndarray })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn faer_matrix_copy_keeps_every_entry() {
            let faer_mat = faer::Mat::<f64>::from_fn(2, 3, |i, j| (i * 3 + j) as f64 + 1.0);
            let copied = faer_mat_to_ndarray(faer_mat.as_ref()).expect("shape matches data");
            assert_eq!(copied, ndarray::array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        }

        #[test]
        fn faer_right_basis_is_not_degenerate() {
            let m = ndarray::array![[3.0, 1.0], [1.0, 3.0], [0.0, 2.0]];
            let out = FaerLinAlgBackend.svd_into(m, false, true).expect("SVD should succeed");
            let vt = out.vt.expect("Vt requested");
            let gram = vt.dot(&vt.t());
            for i in 0..2 {
                for j in 0..2 {
                    let expected = if i == j { 1.0 } else { 0.0 };
                    assert!((gram[[i, j]] - expected).abs() < 1e-10);
                }
            }
        }
    }
}

#[cfg(feature = "backend_faer")]
pub use faer_specific_code::FaerLinAlgBackend;

impl BackendSVD<f64> for LinAlgBackendProvider<f64> {
    fn svd_into(&self, matrix: Array2<f64>, compute_u: bool, compute_v: bool) -> std::result::Result<SVDOutput<f64>, ThreadSafeStdError> {
        #[cfg(feature = "backend_faer")]
        {
            FaerLinAlgBackend.svd_into(matrix, compute_u, compute_v)
        }
        #[cfg(not(feature = "backend_faer"))]
        {
            NdarrayLinAlgBackend.svd_into(matrix, compute_u, compute_v)
        }
    }
}

// --- Shape plumbing shared by the cube helpers and the PCA engine ---

/// Views an array of any rank as a matrix, or reports a shape error naming `context`.
pub fn as_matrix<'a, S, D>(array: &'a ArrayBase<S, D>, context: &'static str) -> Result<ArrayView2<'a, f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let ndim = array.ndim();
    array
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|_| SpectralError::rank(context, 2, ndim))
}

/// Views an array of any rank as a (row, column, band) cube.
pub fn as_cube<'a, S, D>(array: &'a ArrayBase<S, D>, context: &'static str) -> Result<ArrayView3<'a, f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let ndim = array.ndim();
    array
        .view()
        .into_dimensionality::<Ix3>()
        .map_err(|_| SpectralError::rank(context, 3, ndim))
}

/// Matrix product that reports mismatched inner dimensions instead of panicking.
pub fn checked_dot(lhs: ArrayView2<'_, f64>, rhs: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    if lhs.ncols() != rhs.nrows() {
        return Err(SpectralError::IncompatibleProduct {
            lhs: lhs.dim(),
            rhs: rhs.dim(),
        });
    }
    Ok(lhs.dot(&rhs))
}
