pub mod ndarray_view;

pub use ndarray_view::NdArrayView;
