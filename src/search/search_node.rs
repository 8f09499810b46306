use crate::common::{ActionIndex, StateIndex, MAX_INDEX};
use segvec::{Exponential, SegVec};

/// The status of a search node. Statuses progress `New → Open → (Closed |
/// DeadEnd | Goal)`; a node leaves Closed only when a strictly smaller g
/// value is proven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchNodeStatus {
    /// New node, not yet opened
    New,
    /// Node is in the open list
    Open,
    /// Node has been expanded
    Closed,
    /// Node is a dead end
    DeadEnd,
    /// Node satisfies the dynamic goal
    Goal,
}

/// Per-state search metadata. The payload is algorithm-specific (discrete g
/// for breadth-first search, continuous g and h for the best-first variants).
#[derive(Debug, Clone)]
pub struct SearchNode<P> {
    pub status: SearchNodeStatus,
    /// Index of the parent state, `MAX_INDEX` for roots.
    pub parent_state: StateIndex,
    /// Index of the ground action that generated this state.
    pub creating_action: ActionIndex,
    pub payload: P,
}

impl<P> SearchNode<P> {
    pub fn new(payload: P) -> Self {
        Self {
            status: SearchNodeStatus::New,
            parent_state: MAX_INDEX,
            creating_action: MAX_INDEX,
            payload,
        }
    }

    #[inline(always)]
    pub fn is_root(&self) -> bool {
        self.parent_state == MAX_INDEX
    }
}

/// Dense table of search nodes keyed by [`StateIndex`]. Backed by a segmented
/// vector (first segment 1024 entries, doubling) so growth never moves
/// existing nodes; extended on demand to cover any state index.
#[derive(Debug)]
pub struct SearchNodeTable<P> {
    nodes: SegVec<SearchNode<P>, Exponential<1024>>,
    default_payload: P,
}

impl<P: Clone> SearchNodeTable<P> {
    pub fn new(default_payload: P) -> Self {
        Self {
            nodes: SegVec::new(),
            default_payload,
        }
    }

    /// Fetch the node for a state, creating default nodes up to its index.
    pub fn get_or_create(&mut self, state_index: StateIndex) -> &mut SearchNode<P> {
        while self.nodes.len() <= state_index as usize {
            self.nodes
                .push(SearchNode::new(self.default_payload.clone()));
        }
        self.nodes
            .get_mut(state_index as usize)
            .expect("Invalid state index")
    }

    pub fn get(&self, state_index: StateIndex) -> &SearchNode<P> {
        self.nodes
            .get(state_index as usize)
            .expect("Invalid state index")
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_extends_on_demand() {
        let mut table: SearchNodeTable<u32> = SearchNodeTable::new(0);
        {
            let node = table.get_or_create(5);
            assert_eq!(node.status, SearchNodeStatus::New);
            assert!(node.is_root());
            node.payload = 7;
        }
        assert_eq!(table.len(), 6);
        assert_eq!(table.get(5).payload, 7);
        assert_eq!(table.get(0).payload, 0);
    }

    #[test]
    fn growth_preserves_entries() {
        let mut table: SearchNodeTable<u32> = SearchNodeTable::new(0);
        table.get_or_create(0).payload = 42;
        table.get_or_create(4000);
        assert_eq!(table.get(0).payload, 42);
        assert_eq!(table.len(), 4001);
    }
}
