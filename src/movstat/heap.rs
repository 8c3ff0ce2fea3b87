/*! 8-ary paired-heap mechanics (C1 heap primitives + C3 coupler)

# About
Both the small (max-)heap and the large (min-)heap are arrays of pool
indices, branching factor 8. The two are coupled: every element on the small
side is `<=` every element on the large side, enforced by a head-swap
whenever a node's new value would otherwise violate that ordering.

Per spec, sift-up and sift-down are identical between the two heaps modulo
the comparator, so they are implemented once here and parameterized by a
`want_max` flag (`true` for the small/max-heap, `false` for the large/min
-heap) rather than duplicated per heap, as four near-identical C functions
would be.

# Example
```text
small (max-heap)         large (min-heap)
        5                        7
      /   \                    /   \
     3     4                  9     8
```
Invariant: `small.root.val <= large.root.val`, here `5 <= 7`.
*/

use super::pool::Node;

const NUM_CHILDREN: usize = 8;

fn parent_index(i: usize) -> usize {
    (i - 1) / NUM_CHILDREN
}

fn first_child_index(i: usize) -> usize {
    NUM_CHILDREN * i + 1
}

fn ceil_div(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}

/// Index of the first leaf in a heap of the given size, per spec.md's
/// `ceil((n - 1) / 8)`. Evaluates to 0 for `n <= 1`, which is treated as
/// "the root has no children" -- sift-down is never invoked on a 1-node
/// heap's root except via a head-swap.
fn first_leaf(size: usize) -> usize {
    if size == 0 {
        0
    } else {
        ceil_div(size - 1, NUM_CHILDREN)
    }
}

/// Swaps two heap slots and keeps each node's back-index in sync.
fn swap(heap: &mut [usize], pool: &mut [Node], i: usize, j: usize) {
    heap.swap(i, j);
    pool[heap[i]].idx = i;
    pool[heap[j]].idx = j;
}

/// Returns the index of the child that beats `heap[idx]` under the given
/// comparator (strictly greater for a max-heap, strictly less for a
/// min-heap), or `idx` itself if no child does. Ties favor the lowest index.
fn extremal_child(heap: &[usize], pool: &[Node], idx: usize, want_max: bool) -> usize {
    let size = heap.len();
    let first = first_child_index(idx);
    let last = (first + NUM_CHILDREN).min(size);

    let mut best = idx;
    for c in first..last {
        let beats = if want_max {
            pool[heap[c]].val > pool[heap[best]].val
        } else {
            pool[heap[c]].val < pool[heap[best]].val
        };
        if beats {
            best = c;
        }
    }
    best
}

/// Moves the node at `idx` toward the root while it beats its parent.
fn sift_up(heap: &mut [usize], pool: &mut [Node], mut idx: usize, want_max: bool) {
    while idx > 0 {
        let p = parent_index(idx);
        let beats = if want_max {
            pool[heap[idx]].val > pool[heap[p]].val
        } else {
            pool[heap[idx]].val < pool[heap[p]].val
        };
        if !beats {
            break;
        }
        swap(heap, pool, idx, p);
        idx = p;
    }
}

/// Moves the node at `idx` toward the leaves while some child beats it.
fn sift_down(heap: &mut [usize], pool: &mut [Node], mut idx: usize, want_max: bool) {
    loop {
        let target = extremal_child(heap, pool, idx, want_max);
        if target == idx {
            break;
        }
        swap(heap, pool, idx, target);
        idx = target;
    }
}

/// The small (max-)heap and large (min-)heap, coupled at their roots.
#[derive(Debug)]
pub(crate) struct PairedHeap {
    pub(crate) s_heap: Vec<usize>,
    pub(crate) l_heap: Vec<usize>,
    pub(crate) max_s: usize,
    pub(crate) s_first_leaf: usize,
    pub(crate) l_first_leaf: usize,
}

impl PairedHeap {
    pub(crate) fn new(window: usize) -> Self {
        let max_s = ceil_div(window, 2);
        PairedHeap {
            s_heap: Vec::with_capacity(max_s),
            l_heap: Vec::with_capacity(window - max_s),
            max_s,
            s_first_leaf: 0,
            l_first_leaf: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.s_heap.clear();
        self.l_heap.clear();
        self.s_first_leaf = 0;
        self.l_first_leaf = 0;
    }

    pub(crate) fn n_s(&self) -> usize {
        self.s_heap.len()
    }

    pub(crate) fn n_l(&self) -> usize {
        self.l_heap.len()
    }

    pub(crate) fn s_root(&self) -> Option<usize> {
        self.s_heap.first().copied()
    }

    pub(crate) fn l_root(&self) -> Option<usize> {
        self.l_heap.first().copied()
    }

    /// Which heap an about-to-be-admitted node should join while the window
    /// is still filling (spec.md 4.4's `insert_init` placement rule).
    pub(crate) fn filling_destination_is_small(&self) -> bool {
        !(self.n_s() == self.max_s || self.n_s() > self.n_l())
    }

    /// Appends `slot` as a new leaf of the chosen heap, without sifting it
    /// into place -- the caller follows up with [`PairedHeap::update_node`]
    /// to position it, exactly as the original inserts a node at its leaf
    /// slot and then runs the general update routine on it.
    pub(crate) fn append_leaf(&mut self, pool: &mut [Node], slot: usize, small: bool) {
        pool[slot].small = small;
        if small {
            pool[slot].idx = self.s_heap.len();
            self.s_heap.push(slot);
            self.s_first_leaf = first_leaf(self.s_heap.len());
        } else {
            pool[slot].idx = self.l_heap.len();
            self.l_heap.push(slot);
            self.l_first_leaf = first_leaf(self.l_heap.len());
        }
    }

    /// Exchanges the two heap roots (and their `small` flag) when the
    /// cross-heap ordering `small.root <= large.root` is violated, then
    /// resettles each new occupant.
    fn head_swap(&mut self, pool: &mut [Node]) {
        let s_root = self.s_heap[0];
        let l_root = self.l_heap[0];
        pool[s_root].small = false;
        pool[l_root].small = true;
        self.s_heap[0] = l_root;
        self.l_heap[0] = s_root;
        sift_down(&mut self.s_heap, pool, 0, true);
        sift_down(&mut self.l_heap, pool, 0, false);
    }

    /// The single delicate routine (spec.md 4.3): repositions the node at
    /// `node_idx` after its value has just been set to `val`, including any
    /// cross-heap head-swap the new value requires. Used both when a fresh
    /// leaf is placed during the initial fill and when a slide overwrites an
    /// existing node's value in place.
    pub(crate) fn update_node(&mut self, pool: &mut [Node], node_idx: usize, val: f64) {
        pool[node_idx].val = val;
        let idx = pool[node_idx].idx;

        if pool[node_idx].small {
            if idx > 0 {
                let parent_val = pool[self.s_heap[parent_index(idx)]].val;
                if val > parent_val {
                    sift_up(&mut self.s_heap, pool, idx, true);
                    if let Some(l_root) = self.l_root() {
                        if val > pool[l_root].val {
                            self.head_swap(pool);
                        }
                    }
                } else if idx < self.s_first_leaf {
                    sift_down(&mut self.s_heap, pool, idx, true);
                }
            } else if self.l_root().is_some_and(|l_root| val > pool[l_root].val) {
                self.head_swap(pool);
            } else {
                sift_down(&mut self.s_heap, pool, 0, true);
            }
        } else if idx > 0 {
            let parent_val = pool[self.l_heap[parent_index(idx)]].val;
            if val < parent_val {
                sift_up(&mut self.l_heap, pool, idx, false);
                if let Some(s_root) = self.s_root() {
                    if val < pool[s_root].val {
                        self.head_swap(pool);
                    }
                }
            } else if idx < self.l_first_leaf {
                sift_down(&mut self.l_heap, pool, idx, false);
            }
        } else if self.s_root().is_some_and(|s_root| val < pool[s_root].val) {
            self.head_swap(pool);
        } else {
            sift_down(&mut self.l_heap, pool, 0, false);
        }
    }

    /// Checks P1-P4: back-index consistency, heap order on both sides, and
    /// the cross-heap ordering. Intended for debug-time stress tests, not
    /// the hot path.
    #[cfg(any(test, debug_assertions))]
    pub(crate) fn check_invariants(&self, pool: &[Node]) {
        for (i, &slot) in self.s_heap.iter().enumerate() {
            assert_eq!(pool[slot].idx, i, "P1: small heap back-index");
            assert!(pool[slot].small, "P3: node claims wrong heap");
        }
        for (i, &slot) in self.l_heap.iter().enumerate() {
            assert_eq!(pool[slot].idx, i, "P1: large heap back-index");
            assert!(!pool[slot].small, "P3: node claims wrong heap");
        }
        for (i, &slot) in self.s_heap.iter().enumerate() {
            for c in first_child_index(i)..(first_child_index(i) + NUM_CHILDREN).min(self.s_heap.len()) {
                assert!(
                    pool[slot].val >= pool[self.s_heap[c]].val,
                    "P2: small heap is not a max-heap"
                );
            }
        }
        for (i, &slot) in self.l_heap.iter().enumerate() {
            for c in first_child_index(i)..(first_child_index(i) + NUM_CHILDREN).min(self.l_heap.len()) {
                assert!(
                    pool[slot].val <= pool[self.l_heap[c]].val,
                    "P2: large heap is not a min-heap"
                );
            }
        }
        if let (Some(s), Some(l)) = (self.s_root(), self.l_root()) {
            assert!(pool[s].val <= pool[l].val, "P3: small.root <= large.root");
        }
        assert!(self.n_s() <= self.max_s, "P4: small heap over capacity");
        assert!(
            self.n_s().abs_diff(self.n_l()) <= 1,
            "P4: heaps out of balance"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(val: f64) -> Node {
        Node { val, ..Node::default() }
    }

    #[test]
    fn head_swap_restores_cross_heap_order() {
        let mut pool = vec![node(3.0), node(4.0), node(1.0)];
        let mut heap = PairedHeap::new(3);
        heap.append_leaf(&mut pool, 0, true);
        heap.append_leaf(&mut pool, 1, false);
        assert_eq!(heap.s_root(), Some(0));
        assert_eq!(heap.l_root(), Some(1));
        // Feed a value into the small root that outranks the large root.
        heap.update_node(&mut pool, 0, 10.0);
        assert!(pool[heap.s_root().unwrap()].val <= pool[heap.l_root().unwrap()].val);
        heap.check_invariants(&pool);
    }

    #[test]
    fn filling_destination_follows_balance_rule() {
        let mut heap = PairedHeap::new(4);
        let mut pool = vec![Node::default(); 4];
        assert!(heap.filling_destination_is_small());
        heap.append_leaf(&mut pool, 0, true);
        assert!(!heap.filling_destination_is_small());
        heap.append_leaf(&mut pool, 1, false);
        assert!(heap.filling_destination_is_small());
    }
}
