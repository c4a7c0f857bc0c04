// src/bands.rs

//! Wavelength-to-band lookup.

use ndarray::{ArrayBase, Data, Ix1};

/// Returns the index of the entry in an ascending array that is nearest to `search_value`.
///
/// Only values strictly inside one of the gaps between adjacent entries are located;
/// the closer of the two bracketing indices is returned, and an exact midpoint
/// resolves to the earlier index. Values equal to an entry, values outside the
/// array's span, and arrays with fewer than two entries all yield `None`.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use spectral_pca::bands::nearest_index;
///
/// let wavelengths = array![400.0, 450.0, 500.0, 550.0, 600.0, 650.0, 700.0, 750.0];
/// assert_eq!(nearest_index(&wavelengths, 535.0), Some(3));
/// assert_eq!(nearest_index(&wavelengths, 800.0), None);
/// ```
pub fn nearest_index<S>(sorted_array: &ArrayBase<S, Ix1>, search_value: f64) -> Option<usize>
where
    S: Data<Elem = f64>,
{
    sorted_array
        .windows(2)
        .into_iter()
        .enumerate()
        .find(|(_, pair)| pair[0] < search_value && pair[1] > search_value)
        .map(|(index, pair)| {
            if search_value - pair[0] <= pair[1] - search_value {
                index
            } else {
                index + 1
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    fn grid() -> Array1<f64> {
        array![400.0, 450.0, 500.0, 550.0, 600.0, 650.0, 700.0, 750.0]
    }

    #[test]
    fn picks_closer_of_bracketing_pair() {
        let w = grid();
        assert_eq!(nearest_index(&w, 535.0), Some(3));
        assert_eq!(nearest_index(&w, 510.0), Some(2));
        assert_eq!(nearest_index(&w, 401.0), Some(0));
        assert_eq!(nearest_index(&w, 749.0), Some(7));
    }

    #[test]
    fn exact_midpoint_resolves_to_lower_index() {
        let w = grid();
        assert_eq!(nearest_index(&w, 525.0), Some(2));
        assert_eq!(nearest_index(&w, 725.0), Some(6));
    }

    #[test]
    fn endpoints_and_exterior_are_absent() {
        let w = grid();
        assert_eq!(nearest_index(&w, 400.0), None);
        assert_eq!(nearest_index(&w, 750.0), None);
        assert_eq!(nearest_index(&w, 399.9), None);
        assert_eq!(nearest_index(&w, 1000.0), None);
    }

    #[test]
    fn exact_interior_entry_is_absent() {
        // Never strictly between two neighbours.
        assert_eq!(nearest_index(&grid(), 550.0), None);
    }

    #[test]
    fn short_arrays_never_match() {
        assert_eq!(nearest_index(&Array1::<f64>::zeros(0), 1.0), None);
        assert_eq!(nearest_index(&array![500.0], 500.0), None);
    }

    #[test]
    fn works_on_views_of_irregular_grids() {
        let w = array![410.3, 412.9, 480.0, 481.5, 690.0];
        assert_eq!(nearest_index(&w.view(), 475.0), Some(2));
        assert_eq!(nearest_index(&w.slice(ndarray::s![2..]), 685.0), Some(2));
    }
}
