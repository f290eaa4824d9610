//! Array curves: a fixed number of step curves addressed by index.
//!
//! Each element has its own [`KeyframeContainer`] seeded with a default
//! value at [`SimTime::MIN`], so every in-range read has a value.

use keyframe_types::SimTime;

use crate::error::CurveError;
use crate::keyframe::{Keyframe, KeyframeContainer};

/// `N` independent step curves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Array<T, const N: usize> {
    /// One container per element.
    slots: [KeyframeContainer<T>; N],
}

impl<T: Default, const N: usize> Default for Array<T, N> {
    fn default() -> Self {
        Self::new(core::array::from_fn(|_| T::default()))
    }
}

impl<T, const N: usize> Array<T, N> {
    /// Create an array whose elements hold `defaults` from the beginning of
    /// time.
    pub fn new(defaults: [T; N]) -> Self {
        Self {
            slots: defaults.map(|value| {
                let mut slot = KeyframeContainer::new();
                slot.push(Keyframe::new(SimTime::MIN, value));
                slot
            }),
        }
    }

    /// Number of elements.
    pub const fn size(&self) -> usize {
        self.slots.len()
    }

    /// Keyframes of element `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::IndexOutOfBounds`] if `index >= N`.
    pub fn keyframes(&self, index: usize) -> Result<&[Keyframe<T>], CurveError> {
        self.slot(index).map(KeyframeContainer::as_slice)
    }

    /// Insert a keyframe for element `index`, after any keyframe already at
    /// `time`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::IndexOutOfBounds`] if `index >= N`.
    pub fn set_insert(&mut self, time: SimTime, index: usize, value: T) -> Result<(), CurveError> {
        self.slot_mut(index)?.insert(Keyframe::new(time, value));
        Ok(())
    }

    /// Authoritative write for element `index`: drop its keyframes at or
    /// after `time` and append `(time, value)`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::IndexOutOfBounds`] if `index >= N`.
    pub fn set_last(&mut self, time: SimTime, index: usize, value: T) -> Result<(), CurveError> {
        let slot = self.slot_mut(index)?;
        slot.truncate_from(time);
        slot.push(Keyframe::new(time, value));
        Ok(())
    }

    /// Replace the keyframes of element `index` at exactly `time` with one
    /// keyframe, inserting it if there were none.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::IndexOutOfBounds`] if `index >= N`.
    pub fn set_replace(&mut self, time: SimTime, index: usize, value: T) -> Result<(), CurveError> {
        self.slot_mut(index)?
            .replace_at(time, core::iter::once(Keyframe::new(time, value)));
        Ok(())
    }

    fn slot(&self, index: usize) -> Result<&KeyframeContainer<T>, CurveError> {
        self.slots
            .get(index)
            .ok_or(CurveError::IndexOutOfBounds { index, len: N })
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut KeyframeContainer<T>, CurveError> {
        self.slots
            .get_mut(index)
            .ok_or(CurveError::IndexOutOfBounds { index, len: N })
    }
}

impl<T: Clone, const N: usize> Array<T, N> {
    /// Value of element `index` at `time`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::IndexOutOfBounds`] if `index >= N`.
    pub fn at(&self, time: SimTime, index: usize) -> Result<T, CurveError> {
        self.frame(time, index).map(|(_, value)| value)
    }

    /// The keyframe of element `index` in effect at `time`, as
    /// `(keyframe time, value)`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::IndexOutOfBounds`] if `index >= N`.
    pub fn frame(&self, time: SimTime, index: usize) -> Result<(SimTime, T), CurveError> {
        self.slot(index)?
            .at_or_before(time)
            .map(|k| (k.time, k.value.clone()))
            .ok_or(CurveError::Uninitialized { time })
    }

    /// The first keyframe of element `index` strictly after `time`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::IndexOutOfBounds`] if `index >= N`.
    pub fn next_frame(&self, time: SimTime, index: usize) -> Result<Option<(SimTime, T)>, CurveError> {
        let slot = self.slot(index)?;
        Ok(slot
            .iter()
            .find(|k| k.time > time)
            .map(|k| (k.time, k.value.clone())))
    }

    /// Values of all elements at `time`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::Uninitialized`] if an element has no keyframe
    /// at or before `time`.
    pub fn get(&self, time: SimTime) -> Result<[T; N], CurveError> {
        let values = self
            .slots
            .iter()
            .map(|slot| {
                slot.at_or_before(time)
                    .map(|k| k.value.clone())
                    .ok_or(CurveError::Uninitialized { time })
            })
            .collect::<Result<Vec<T>, CurveError>>()?;
        <[T; N]>::try_from(values).map_err(|values| CurveError::IndexOutOfBounds {
            index: values.len(),
            len: N,
        })
    }

    /// Copy keyframes from `other`: every keyframe at or after `start` is
    /// replaced by `other`'s keyframes from `start` on.
    pub fn sync(&mut self, other: &Self, start: SimTime) {
        for (slot, source) in self.slots.iter_mut().zip(other.slots.iter()) {
            slot.truncate_from(start);
            for frame in source.iter().filter(|k| k.time >= start) {
                slot.push(frame.clone());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn t(units: i32) -> SimTime {
        SimTime::from_int(units)
    }

    #[test]
    fn defaults_hold_from_the_beginning_of_time() {
        let array: Array<i64, 3> = Array::new([1, 2, 3]);
        assert_eq!(array.size(), 3);
        assert_eq!(array.get(SimTime::MIN).unwrap(), [1, 2, 3]);
        assert_eq!(array.get(t(100)).unwrap(), [1, 2, 3]);
    }

    #[test]
    fn elements_change_independently() {
        let mut array: Array<i64, 2> = Array::default();
        array.set_last(t(5), 0, 10).unwrap();
        array.set_last(t(8), 1, 20).unwrap();

        assert_eq!(array.get(t(4)).unwrap(), [0, 0]);
        assert_eq!(array.get(t(6)).unwrap(), [10, 0]);
        assert_eq!(array.get(t(8)).unwrap(), [10, 20]);
        assert_eq!(array.frame(t(7), 0).unwrap(), (t(5), 10));
        assert_eq!(array.next_frame(t(5), 1).unwrap(), Some((t(8), 20)));
        assert_eq!(array.next_frame(t(8), 1).unwrap(), None);
    }

    #[test]
    fn set_last_discards_later_keyframes() {
        let mut array: Array<i64, 1> = Array::default();
        array.set_last(t(5), 0, 5).unwrap();
        array.set_last(t(9), 0, 9).unwrap();
        array.set_last(t(7), 0, 7).unwrap();
        assert_eq!(array.at(t(20), 0).unwrap(), 7);
        assert_eq!(array.keyframes(0).unwrap().len(), 3);
    }

    #[test]
    fn insert_keeps_and_replace_collapses_same_time_keyframes() {
        let mut array: Array<i64, 1> = Array::default();
        array.set_insert(t(3), 0, 1).unwrap();
        array.set_insert(t(3), 0, 2).unwrap();
        assert_eq!(array.at(t(3), 0).unwrap(), 2);
        assert_eq!(array.keyframes(0).unwrap().len(), 3);

        array.set_replace(t(3), 0, 4).unwrap();
        assert_eq!(array.keyframes(0).unwrap().len(), 2);
        assert_eq!(array.at(t(3), 0).unwrap(), 4);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let mut array: Array<i64, 2> = Array::default();
        let expected = CurveError::IndexOutOfBounds { index: 2, len: 2 };
        assert_eq!(array.at(t(0), 2), Err(expected.clone()));
        assert_eq!(array.set_last(t(0), 2, 1), Err(expected));
    }

    #[test]
    fn sync_copies_the_other_future() {
        let mut ours: Array<i64, 2> = Array::default();
        ours.set_last(t(2), 0, 1).unwrap();
        ours.set_last(t(6), 0, 3).unwrap();
        let mut theirs: Array<i64, 2> = Array::default();
        theirs.set_last(t(5), 0, 50).unwrap();
        theirs.set_last(t(5), 1, 51).unwrap();

        ours.sync(&theirs, t(4));
        assert_eq!(ours.get(t(3)).unwrap(), [1, 0]);
        assert_eq!(ours.get(t(5)).unwrap(), [50, 51]);
        assert_eq!(ours.get(t(9)).unwrap(), [50, 51]);
    }
}
