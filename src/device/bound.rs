//! Fixed-capacity bound-state slots

use crate::error::{GraphicsError, GraphicsResult};

/// A fixed array of optional bindings indexed by slot.
///
/// Every access is bounds-checked against `N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundSlots<T: Copy, const N: usize> {
    slots: [Option<T>; N],
}

impl<T: Copy + PartialEq, const N: usize> BoundSlots<T, N> {
    pub const CAPACITY: usize = N;

    pub fn new() -> Self {
        Self { slots: [None; N] }
    }

    fn check(slot: usize) -> GraphicsResult<()> {
        if slot >= N {
            return Err(GraphicsError::SlotOutOfRange { slot, max: N });
        }
        Ok(())
    }

    pub fn get(&self, slot: usize) -> GraphicsResult<Option<T>> {
        Self::check(slot)?;
        Ok(self.slots[slot])
    }

    pub fn set(&mut self, slot: usize, value: Option<T>) -> GraphicsResult<()> {
        Self::check(slot)?;
        self.slots[slot] = value;
        Ok(())
    }

    /// Unbind `value` from every slot. Returns how many slots were cleared.
    pub fn clear_matching(&mut self, value: T) -> usize {
        let mut cleared = 0;
        for slot in self.slots.iter_mut().filter(|slot| **slot == Some(value)) {
            *slot = None;
            cleared += 1;
        }
        cleared
    }

    pub fn clear(&mut self) {
        self.slots = [None; N];
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<T>)> + '_ {
        self.slots.iter().copied().enumerate()
    }
}

impl<T: Copy + PartialEq, const N: usize> Default for BoundSlots<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_checked() {
        let mut slots = BoundSlots::<u32, 4>::new();
        slots.set(3, Some(7)).unwrap();
        assert_eq!(slots.get(3), Ok(Some(7)));
        assert_eq!(
            slots.set(4, Some(1)),
            Err(GraphicsError::SlotOutOfRange { slot: 4, max: 4 })
        );
        assert!(slots.get(usize::MAX).is_err());
    }

    #[test]
    fn test_clear_matching() {
        let mut slots = BoundSlots::<u32, 4>::new();
        slots.set(0, Some(1)).unwrap();
        slots.set(2, Some(1)).unwrap();
        slots.set(3, Some(2)).unwrap();

        assert_eq!(slots.clear_matching(1), 2);
        assert_eq!(
            slots.iter().collect::<Vec<_>>(),
            vec![(0, None), (1, None), (2, None), (3, Some(2))]
        );

        slots.clear();
        assert!(slots.iter().all(|(_, value)| value.is_none()));
    }
}
