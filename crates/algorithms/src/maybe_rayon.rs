//! Rayon or sequential iteration, chosen by the `parallel` feature.
//!
//! With the feature on this re-exports rayon's prelude. Without it, a
//! stand-in `into_par_iter()` hands back the plain iterator so the rest of
//! the chain (`map`, `collect`) resolves to `std::iter::Iterator`.
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
