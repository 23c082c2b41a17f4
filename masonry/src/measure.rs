//! The measurement pipeline.
//!
//! Item heights depend on rendered content and are only known after an off-screen layout pass.
//! The engine never renders anything itself: a [`Measurer`] is injected and asked for the natural
//! height of each item at the column width, one batch at a time.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::marker::PhantomData;

use crate::{MasonryError, Size};

/// Off-screen measurement capability.
///
/// A batch is bracketed by `open_surface`/`close_surface`. `close_surface` is always called once
/// `open_surface` succeeded, even when a `measure` call fails or panics.
///
/// Any `FnMut(&T, u32) -> u32` closure is a measurer that needs no surface.
pub trait Measurer<T: ?Sized> {
    /// Allocates the temporary off-screen surface for one batch.
    ///
    /// Return [`MasonryError::MeasurementUnavailable`] when no surface exists; the batch is then
    /// abandoned without committing any geometry.
    fn open_surface(&mut self, width: u32) -> Result<(), MasonryError> {
        let _ = width;
        Ok(())
    }

    /// Returns the natural rendered height of `item` constrained to `width`.
    fn measure(&mut self, item: &T, width: u32) -> Result<u32, MasonryError>;

    /// Tears down the surface allocated by `open_surface`.
    fn close_surface(&mut self) {}
}

impl<T: ?Sized, F> Measurer<T> for F
where
    F: FnMut(&T, u32) -> u32,
{
    fn measure(&mut self, item: &T, width: u32) -> Result<u32, MasonryError> {
        Ok(self(item, width))
    }
}

struct Surface<'m, T: ?Sized, M: Measurer<T> + ?Sized> {
    measurer: &'m mut M,
    width: u32,
    _item: PhantomData<fn(&T)>,
}

impl<'m, T: ?Sized, M: Measurer<T> + ?Sized> Surface<'m, T, M> {
    fn open(measurer: &'m mut M, width: u32) -> Result<Self, MasonryError> {
        if let Err(err) = measurer.open_surface(width) {
            mwarn!(%err, width, "measurement surface unavailable");
            return Err(err);
        }
        Ok(Self {
            measurer,
            width,
            _item: PhantomData,
        })
    }

    fn measure(&mut self, item: &T) -> Result<Size, MasonryError> {
        let height = self.measurer.measure(item, self.width)?;
        Ok(Size {
            width: self.width,
            height,
        })
    }
}

impl<T: ?Sized, M: Measurer<T> + ?Sized> Drop for Surface<'_, T, M> {
    fn drop(&mut self) {
        self.measurer.close_surface();
    }
}

/// Measures a batch of items at `width` on a single off-screen surface.
///
/// Either every item is measured or an error is returned; there are no partial results.
pub fn measure_batch<'a, T, M>(
    measurer: &mut M,
    width: u32,
    items: impl IntoIterator<Item = &'a T>,
) -> Result<Vec<Size>, MasonryError>
where
    T: ?Sized + 'a,
    M: Measurer<T> + ?Sized,
{
    let mut surface = Surface::open(measurer, width)?;
    let mut out = Vec::new();
    for item in items {
        out.push(surface.measure(item)?);
    }
    mtrace!(width, measured = out.len(), "measure_batch");
    Ok(out)
}

/// Resolves heights for `(item, known_height)` pairs, measuring only the unknown ones.
///
/// No surface is opened when every height is already known.
pub(crate) fn resolve_heights<T, M>(
    measurer: &mut M,
    width: u32,
    entries: &[(Arc<T>, Option<u32>)],
) -> Result<Vec<u32>, MasonryError>
where
    M: Measurer<T> + ?Sized,
{
    let missing = entries.iter().filter(|(_, known)| known.is_none()).count();
    if missing == 0 {
        return Ok(entries.iter().filter_map(|(_, known)| *known).collect());
    }

    let measured = measure_batch(
        measurer,
        width,
        entries
            .iter()
            .filter(|(_, known)| known.is_none())
            .map(|(data, _)| &**data),
    )?;
    let mut measured = measured.into_iter();
    let mut out = Vec::with_capacity(entries.len());
    for (_, known) in entries {
        let height = match known {
            Some(h) => *h,
            None => measured.next().map_or(0, |size| size.height),
        };
        out.push(height);
    }
    Ok(out)
}
