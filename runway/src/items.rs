use alloc::vec::Vec;

use crate::anchor::Heights;
use crate::fenwick::Fenwick;
use crate::{ItemId, NodeKind, Size};

/// One entry of the ordered diff a data provider folds into the engine.
///
/// Changes are applied in order; every index refers to the table as left by the previous
/// change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change<T> {
    /// A new item at `index` (`index == count` appends).
    Insert { index: usize, item: T },
    /// A slot whose data is still on its way. It renders as a tombstone until an
    /// [`Change::Update`] fills it.
    Placeholder { index: usize },
    Remove { index: usize },
    Move { from: usize, to: usize },
    /// Identity-preserving replacement of the data at `index`. The item is re-measured.
    Update { index: usize, item: T },
}

#[derive(Debug)]
pub(crate) struct Attached<N> {
    pub(crate) node: N,
    pub(crate) kind: NodeKind,
    /// Index the node was last bound/attached with.
    pub(crate) bound: usize,
    /// Last visibility written to the factory, if known.
    pub(crate) visible: Option<bool>,
}

#[derive(Debug)]
pub(crate) struct Item<T, N> {
    pub(crate) id: ItemId,
    pub(crate) data: Option<T>,
    /// Measured height, 0 while unmeasured.
    pub(crate) height: u32,
    pub(crate) width: u32,
    /// Last position written to the attached node.
    pub(crate) top: Option<u64>,
    pub(crate) node: Option<Attached<N>>,
    /// Data changed since the attached node was bound.
    pub(crate) stale: bool,
}

impl<T, N> Item<T, N> {
    pub(crate) fn is_measured(&self) -> bool {
        self.height > 0
    }
}

/// Ordered record of every known item.
///
/// Effective heights (measured, or `fallback` while unmeasured) are mirrored in a Fenwick tree,
/// so start offsets and the total extent are `O(log n)`.
#[derive(Debug)]
pub(crate) struct ItemTable<T, N> {
    items: Vec<Item<T, N>>,
    sums: Fenwick,
    fallback: u32,
    next_id: u64,
}

impl<T, N> ItemTable<T, N> {
    pub(crate) fn new(fallback: u32) -> Self {
        Self {
            items: Vec::new(),
            sums: Fenwick::default(),
            fallback: fallback.max(1),
            next_id: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Item<T, N>> {
        self.items.get(index)
    }

    /// Mutable access for node bookkeeping. Heights must go through [`ItemTable::set_height`].
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Item<T, N>> {
        self.items.get_mut(index)
    }

    pub(crate) fn fallback(&self) -> u32 {
        self.fallback
    }

    pub(crate) fn set_fallback(&mut self, fallback: u32) {
        let fallback = fallback.max(1);
        if self.fallback == fallback {
            return;
        }
        self.fallback = fallback;
        self.rebuild();
    }

    pub(crate) fn effective_height(&self, index: usize) -> u32 {
        match self.items.get(index) {
            Some(it) if it.height > 0 => it.height,
            _ => self.fallback,
        }
    }

    pub(crate) fn insert(&mut self, index: usize, data: Option<T>) -> ItemId {
        let index = index.min(self.items.len());
        let id = ItemId(self.next_id);
        self.next_id += 1;
        self.items.insert(
            index,
            Item {
                id,
                data,
                height: 0,
                width: 0,
                top: None,
                node: None,
                stale: false,
            },
        );
        if index + 1 == self.items.len() {
            self.sums.push(self.fallback);
        } else {
            self.rebuild();
        }
        id
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<Item<T, N>> {
        if index >= self.items.len() {
            return None;
        }
        let item = self.items.remove(index);
        self.rebuild();
        Some(item)
    }

    pub(crate) fn move_item(&mut self, from: usize, to: usize) -> bool {
        let len = self.items.len();
        if from >= len || to >= len {
            return false;
        }
        if from != to {
            let item = self.items.remove(from);
            self.items.insert(to, item);
            self.rebuild();
        }
        true
    }

    /// Replaces the data at `index`, resetting its height. Returns `true` if the slot was a
    /// placeholder.
    pub(crate) fn update(&mut self, index: usize, data: T) -> bool {
        let Some(item) = self.items.get_mut(index) else {
            return false;
        };
        let was_placeholder = item.data.is_none();
        item.data = Some(data);
        item.stale = true;
        self.set_height(index, Size::default());
        was_placeholder
    }

    /// Stores a measurement. A zero height resets the item to unmeasured.
    pub(crate) fn set_height(&mut self, index: usize, size: Size) {
        let fallback = self.fallback;
        let Some(item) = self.items.get_mut(index) else {
            return;
        };
        item.height = size.height;
        item.width = size.width;
        let effective = if item.height > 0 { item.height } else { fallback };
        self.sums.set(index, effective);
    }

    /// Forgets every measurement and position.
    pub(crate) fn invalidate(&mut self) {
        for it in &mut self.items {
            it.height = 0;
            it.width = 0;
            it.top = None;
        }
        self.rebuild();
    }

    pub(crate) fn total(&self) -> u64 {
        self.sums.total()
    }

    /// Number of leading items whose cumulative effective height is `<= offset`.
    pub(crate) fn items_before(&self, offset: u64) -> usize {
        self.sums.count_within(offset)
    }

    pub(crate) fn index_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|it| it.id == id)
    }

    pub(crate) fn iter_mut(&mut self) -> core::slice::IterMut<'_, Item<T, N>> {
        self.items.iter_mut()
    }

    fn rebuild(&mut self) {
        let fallback = self.fallback;
        self.sums = Fenwick::from_heights(self.items.iter().map(|it| {
            if it.height > 0 { it.height } else { fallback }
        }));
        debug_assert_eq!(self.sums.len(), self.items.len(), "Fenwick out of sync");
    }
}

impl<T, N> Heights for ItemTable<T, N> {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn measured_height(&self, index: usize) -> u32 {
        self.items.get(index).map_or(0, |it| it.height)
    }

    fn start_of(&self, index: usize, _fallback: u32) -> u64 {
        self.sums.sum_before(index)
    }
}
