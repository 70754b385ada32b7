//! Fixed-capacity slot arena with recency stamps and a codepoint lookup table.
//!
//! Both cache tiers are built on [`SlotPool`]: the glyph bitmap cache in front
//! of the rasterizer and the texture atlas itself. A pool never grows or
//! shrinks after construction; eviction overwrites a slot in place and moves
//! its table entry from the old codepoint to the new one, so a [`SlotIndex`]
//! stays valid for the lifetime of the pool.
//!
//! Recency is a per-pool generation counter. Callers advance it once per batch
//! of work and every slot touched during that batch is stamped with the same
//! value; ties are broken by index order.

use std::ops::Index;

use rustc_hash::FxHashMap;

use crate::Codepoint;
use crate::error::{AtlasError, ConfigError};

/// Index of a slot inside its pool, in `[0, capacity)`.
pub type SlotIndex = usize;

/// Highest stamp a generation can reach; one below the pin sentinel.
const MAX_GENERATION: u64 = u64::MAX - 1;

/// Recency stamp of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Usage(u64);

impl Usage {
    /// The slot has never held anything.
    pub const NEVER: Self = Self(0);
    /// The slot is permanently resident.
    pub const PINNED: Self = Self(u64::MAX);

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_never(self) -> bool {
        self.0 == Self::NEVER.0
    }

    #[must_use]
    pub const fn is_pinned(self) -> bool {
        self.0 == Self::PINNED.0
    }
}

/// What a slot currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Occupant {
    #[default]
    Empty,
    Occupied(Codepoint),
}

impl Occupant {
    #[must_use]
    pub const fn codepoint(self) -> Option<Codepoint> {
        match self {
            Self::Empty => None,
            Self::Occupied(cp) => Some(cp),
        }
    }
}

/// One cell of a [`SlotPool`].
#[derive(Debug, Clone, Default)]
pub struct Slot<P> {
    usage: Usage,
    occupant: Occupant,
    payload: P,
}

impl<P: Default> Slot<P> {
    fn empty() -> Self {
        Self {
            usage: Usage::NEVER,
            occupant: Occupant::Empty,
            payload: P::default(),
        }
    }
}

impl<P> Slot<P> {
    #[must_use]
    pub fn usage(&self) -> Usage {
        self.usage
    }

    #[must_use]
    pub fn occupant(&self) -> Occupant {
        self.occupant
    }

    #[must_use]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.usage.is_pinned()
    }
}

/// Fixed array of recency-tracked slots plus a `codepoint -> slot` table.
///
/// Invariant: the table is exactly the inverse of the occupied slots. No two
/// slots hold the same codepoint and every occupied slot has one entry.
#[derive(Debug, Clone)]
pub struct SlotPool<P> {
    slots: Vec<Slot<P>>,
    table: FxHashMap<Codepoint, SlotIndex>,
    generation: u64,
}

impl<P: Default> SlotPool<P> {
    /// Allocate `capacity` empty slots.
    ///
    /// Fails with [`ConfigError::ZeroCapacity`] for an empty pool and with
    /// [`AtlasError::Allocation`] if the slot array cannot be reserved.
    pub fn with_capacity(capacity: usize) -> Result<Self, AtlasError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity.into());
        }
        let alloc_error = || AtlasError::Allocation {
            bytes: capacity.saturating_mul(std::mem::size_of::<Slot<P>>()),
        };

        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity).map_err(|_| alloc_error())?;
        slots.extend((0..capacity).map(|_| Slot::empty()));

        let mut table = FxHashMap::default();
        table.try_reserve(capacity).map_err(|_| alloc_error())?;

        Ok(Self {
            slots,
            table,
            generation: 0,
        })
    }

    /// Return a slot to the Empty, never-used state and drop its table entry.
    pub fn reset(&mut self, index: SlotIndex) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        if let Occupant::Occupied(cp) = slot.occupant {
            self.table.remove(&cp);
        }
        *slot = Slot::empty();
    }

    /// Reset every slot, clear the table and rewind the generation.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::empty();
        }
        self.table.clear();
        self.generation = 0;
    }

    /// Reset every occupied, unpinned slot; pins and the generation survive.
    /// Returns how many slots were vacated.
    pub fn evict_all(&mut self) -> usize {
        let occupied: Vec<SlotIndex> = self.occupied_unpinned().map(|(index, _)| index).collect();
        for &index in &occupied {
            self.reset(index);
        }
        occupied.len()
    }

    /// Stamp `index` with the current generation and make it hold `codepoint`.
    ///
    /// Returns the codepoint the slot held before, if that was a different one.
    /// Pinned slots keep their pin.
    pub fn mark_used(&mut self, index: SlotIndex, codepoint: Codepoint) -> Option<Codepoint> {
        let previous = self.slots.get(index)?.occupant;
        let mut displaced = None;

        if previous != Occupant::Occupied(codepoint) {
            if let Some(other) = self.table.get(&codepoint).copied()
                && other != index
            {
                self.reset(other);
            }
            if let Occupant::Occupied(old) = previous {
                self.table.remove(&old);
                displaced = Some(old);
            }
            self.slots[index].occupant = Occupant::Occupied(codepoint);
            self.table.insert(codepoint, index);
        }

        let stamp = Usage(self.generation.max(1));
        let slot = &mut self.slots[index];
        if !slot.usage.is_pinned() {
            slot.usage = stamp;
        }
        displaced
    }
}

impl<P> SlotPool<P> {
    /// The zero-capacity pool of a released cache.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            slots: Vec::new(),
            table: FxHashMap::default(),
            generation: 0,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new recency generation and return it.
    pub fn advance_generation(&mut self) -> u64 {
        self.generation = self.generation.saturating_add(1).min(MAX_GENERATION);
        self.generation
    }

    /// O(1) lookup; does not touch recency.
    #[must_use]
    pub fn find(&self, codepoint: Codepoint) -> Option<SlotIndex> {
        self.table.get(&codepoint).copied()
    }

    #[must_use]
    pub fn slot(&self, index: SlotIndex) -> Option<&Slot<P>> {
        self.slots.get(index)
    }

    /// Mutable access to a slot's payload. Occupancy and usage stay under the
    /// pool's control.
    pub fn payload_mut(&mut self, index: SlotIndex) -> Option<&mut P> {
        self.slots.get_mut(index).map(|slot| &mut slot.payload)
    }

    /// Pick the slot to overwrite next.
    ///
    /// A never-used slot wins immediately. Otherwise the smallest usage wins,
    /// ties going to the lowest index. Pinned slots are never returned.
    #[must_use]
    pub fn select_victim(&self) -> Option<SlotIndex> {
        let mut best: Option<(SlotIndex, Usage)> = None;
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.usage.is_pinned() {
                continue;
            }
            if slot.usage.is_never() {
                return Some(index);
            }
            match best {
                Some((_, usage)) if usage <= slot.usage => {}
                _ => best = Some((index, slot.usage)),
            }
        }
        best.map(|(index, _)| index)
    }

    /// Occupied, unpinned slot with the highest usage (first on ties).
    #[must_use]
    pub fn select_most_recently_used(&self) -> Option<SlotIndex> {
        self.occupied_unpinned()
            .fold(None, |best: Option<(SlotIndex, Usage)>, (index, usage)| {
                match best {
                    Some((_, top)) if top >= usage => best,
                    _ => Some((index, usage)),
                }
            })
            .map(|(index, _)| index)
    }

    /// Occupied, unpinned slot with the lowest usage (first on ties).
    #[must_use]
    pub fn select_least_recently_used(&self) -> Option<SlotIndex> {
        self.occupied_unpinned()
            .fold(None, |best: Option<(SlotIndex, Usage)>, (index, usage)| {
                match best {
                    Some((_, low)) if low <= usage => best,
                    _ => Some((index, usage)),
                }
            })
            .map(|(index, _)| index)
    }

    /// Make `index` permanently resident.
    pub fn pin(&mut self, index: SlotIndex) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.usage = Usage::PINNED;
        }
    }

    /// `(slot, codepoint)` for every occupied slot, in index order.
    pub fn iter_occupied(&self) -> impl Iterator<Item = (SlotIndex, Codepoint)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.occupant.codepoint().map(|cp| (index, cp)))
    }

    fn occupied_unpinned(&self) -> impl Iterator<Item = (SlotIndex, Usage)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.occupant != Occupant::Empty && !slot.usage.is_pinned())
            .map(|(index, slot)| (index, slot.usage))
    }
}

impl<P> Default for SlotPool<P> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<P> Index<SlotIndex> for SlotPool<P> {
    type Output = Slot<P>;

    fn index(&self, index: SlotIndex) -> &Self::Output {
        &self.slots[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(capacity: usize) -> SlotPool<u32> {
        SlotPool::with_capacity(capacity).expect("pool")
    }

    fn assert_bijective(pool: &SlotPool<u32>) {
        let occupied: Vec<_> = pool.iter_occupied().collect();
        assert_eq!(occupied.len(), pool.len());
        for (index, cp) in occupied {
            assert_eq!(pool.find(cp), Some(index));
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = SlotPool::<u32>::with_capacity(0).unwrap_err();
        assert_eq!(err, AtlasError::Config(ConfigError::ZeroCapacity));
    }

    #[test]
    fn empty_pool_has_no_victim() {
        let pool = SlotPool::<u32>::empty();
        assert_eq!(pool.capacity(), 0);
        assert_eq!(pool.select_victim(), None);
    }

    #[test]
    fn virgin_slots_are_filled_before_anything_is_evicted() {
        let mut pool = pool(3);
        pool.advance_generation();
        pool.mark_used(1, 'a' as u32);
        assert_eq!(pool.select_victim(), Some(0));
        pool.mark_used(0, 'b' as u32);
        assert_eq!(pool.select_victim(), Some(2));
    }

    #[test]
    fn victim_is_least_recent_with_index_tiebreak() {
        let mut pool = pool(3);
        pool.advance_generation();
        pool.mark_used(0, 1);
        pool.mark_used(1, 2);
        pool.advance_generation();
        pool.mark_used(2, 3);
        // Slots 0 and 1 share the oldest generation; the lower index wins.
        assert_eq!(pool.select_victim(), Some(0));

        pool.advance_generation();
        pool.mark_used(0, 1);
        assert_eq!(pool.select_victim(), Some(1));
    }

    #[test]
    fn pinned_slot_is_never_a_victim() {
        let mut pool = pool(2);
        pool.pin(0);
        pool.advance_generation();
        pool.mark_used(1, 7);
        assert_eq!(pool.select_victim(), Some(1));

        pool.pin(1);
        assert_eq!(pool.select_victim(), None);
    }

    #[test]
    fn mark_used_keeps_pin() {
        let mut pool = pool(1);
        pool.pin(0);
        pool.advance_generation();
        pool.mark_used(0, 9);
        assert!(pool.slot(0).expect("slot").is_pinned());
    }

    #[test]
    fn reassigning_a_slot_moves_the_table_entry() {
        let mut pool = pool(2);
        pool.advance_generation();
        pool.mark_used(0, 10);
        let displaced = pool.mark_used(0, 11);
        assert_eq!(displaced, Some(10));
        assert_eq!(pool.find(10), None);
        assert_eq!(pool.find(11), Some(0));
        assert_bijective(&pool);
    }

    #[test]
    fn codepoint_moved_to_another_slot_vacates_the_old_one() {
        let mut pool = pool(2);
        pool.advance_generation();
        pool.mark_used(0, 10);
        pool.mark_used(1, 10);
        assert_eq!(pool.find(10), Some(1));
        assert_eq!(pool.slot(0).expect("slot").occupant(), Occupant::Empty);
        assert_bijective(&pool);
    }

    #[test]
    fn mru_and_lru_ignore_empty_and_pinned_slots() {
        let mut pool = pool(4);
        pool.advance_generation();
        pool.mark_used(1, 1);
        pool.advance_generation();
        pool.mark_used(2, 2);
        pool.pin(3);
        assert_eq!(pool.select_least_recently_used(), Some(1));
        assert_eq!(pool.select_most_recently_used(), Some(2));
    }

    #[test]
    fn evict_all_keeps_pins() {
        let mut pool = pool(3);
        pool.pin(0);
        pool.advance_generation();
        pool.mark_used(1, 1);
        pool.mark_used(2, 2);
        assert_eq!(pool.evict_all(), 2);
        assert!(pool.is_empty());
        assert!(pool.slot(0).expect("slot").is_pinned());
        assert_eq!(pool.generation(), 1);
    }

    #[test]
    fn clear_rewinds_everything() {
        let mut pool = pool(2);
        pool.advance_generation();
        pool.mark_used(0, 1);
        pool.pin(1);
        pool.clear();
        assert_eq!(pool.generation(), 0);
        assert!(pool.is_empty());
        assert_eq!(pool.select_victim(), Some(0));
        assert!(!pool.slot(1).expect("slot").is_pinned());
    }

    #[test]
    fn generation_saturates_below_pin_sentinel() {
        let mut pool = pool(1);
        pool.generation = MAX_GENERATION;
        assert_eq!(pool.advance_generation(), MAX_GENERATION);
        pool.mark_used(0, 1);
        assert!(!pool.slot(0).expect("slot").is_pinned());
    }
}
