use alloc::collections::VecDeque;

use crate::ViewFactory;

#[derive(Clone, Debug)]
struct Scrap<N> {
    slot: Option<usize>,
    node: N,
}

/// A bounded store of detached, reusable nodes.
///
/// Nodes are kept in release order. [`Pool::acquire`] hands out the most recently released node
/// (its render state is the warmest), eviction destroys the oldest ones first.
///
/// `release` never evicts on its own: a layout pass releases everything leaving the window
/// before it starts filling, so the pool may briefly hold more than `capacity` nodes. Call
/// [`Pool::prune`] at the end of the pass.
#[derive(Clone, Debug)]
pub struct Pool<N> {
    scraps: VecDeque<Scrap<N>>,
    capacity: usize,
}

impl<N> Pool<N> {
    pub fn new(capacity: usize) -> Self {
        Self {
            scraps: VecDeque::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.scraps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scraps.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Takes the most recently released node, if any.
    pub fn acquire(&mut self) -> Option<N> {
        self.scraps.pop_back().map(|s| s.node)
    }

    /// Takes the node last released from `slot`, falling back to [`Pool::acquire`].
    ///
    /// A node that served the same slot before usually needs the least re-rendering.
    pub fn acquire_for(&mut self, slot: usize) -> Option<N> {
        let found = self.scraps.iter().rposition(|s| s.slot == Some(slot));
        match found {
            Some(pos) => self.scraps.remove(pos).map(|s| s.node),
            None => self.acquire(),
        }
    }

    /// Detaches `node` and stores it for reuse.
    pub fn release<F>(&mut self, factory: &mut F, mut node: N, slot: Option<usize>)
    where
        F: ViewFactory<Node = N> + ?Sized,
    {
        factory.detach(&mut node);
        self.scraps.push_back(Scrap { slot, node });
    }

    /// Destroys the oldest nodes until the pool fits its capacity. Returns how many were
    /// destroyed.
    pub fn prune<F>(&mut self, factory: &mut F) -> usize
    where
        F: ViewFactory<Node = N> + ?Sized,
    {
        let mut evicted = 0usize;
        while self.scraps.len() > self.capacity {
            let Some(scrap) = self.scraps.pop_front() else {
                break;
            };
            factory.destroy(scrap.node);
            evicted += 1;
        }
        if evicted > 0 {
            rtrace!(evicted, capacity = self.capacity, "Pool::prune");
        }
        evicted
    }

    /// Changes the bound and immediately evicts any excess.
    pub fn set_capacity<F>(&mut self, factory: &mut F, capacity: usize)
    where
        F: ViewFactory<Node = N> + ?Sized,
    {
        self.capacity = capacity;
        self.prune(factory);
    }

    /// Destroys every pooled node.
    pub fn clear<F>(&mut self, factory: &mut F)
    where
        F: ViewFactory<Node = N> + ?Sized,
    {
        for scrap in self.scraps.drain(..) {
            factory.destroy(scrap.node);
        }
    }
}
