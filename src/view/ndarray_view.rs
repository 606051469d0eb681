/// A borrowed, multi-dimensional view over caller-owned data.
///
/// Each dimension is a contiguous slice; its length is the dimension's
/// length. The view never copies or owns the data and cannot outlive it.
#[derive(Debug, Clone, Default)]
pub struct NdArrayView<'a> {
    dimensions: Vec<&'a [f64]>,
}

impl<'a> NdArrayView<'a> {
    pub fn new(dimensions: Vec<&'a [f64]>) -> NdArrayView<'a> {
        NdArrayView { dimensions }
    }

    /// A one-dimensional view.
    pub fn flat(data: &'a [f64]) -> NdArrayView<'a> {
        NdArrayView { dimensions: vec![data] }
    }

    pub fn num_dimensions(&self) -> usize {
        self.dimensions.len()
    }

    pub fn dimension(&self, index: usize) -> Option<&'a [f64]> {
        self.dimensions.get(index).copied()
    }

    pub fn lengths(&self) -> Vec<usize> {
        self.dimensions.iter().map(|d| d.len()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [f64]> + '_ {
        self.dimensions.iter().copied()
    }
}

impl<'a> From<&'a [f64]> for NdArrayView<'a> {
    fn from(data: &'a [f64]) -> Self {
        NdArrayView::flat(data)
    }
}
