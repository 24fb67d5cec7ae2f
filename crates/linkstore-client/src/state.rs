//! Navigation state: where the user is and what the link panes hold.

use linkstore_core::{Direction, MessageRef};
use std::collections::BTreeMap;

/// The link graph around the current entry, two hops deep.
///
/// Second-hop lists are keyed by the 1-based position (parent slot) of the
/// first-hop link they were fetched for. They only make sense relative to the
/// first-hop list that produced those slots, so replacing a first-hop list
/// discards its second hop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSet {
    pub forward: Vec<MessageRef>,
    pub backward: Vec<MessageRef>,
    pub forward2: BTreeMap<u32, Vec<MessageRef>>,
    pub backward2: BTreeMap<u32, Vec<MessageRef>>,
}

impl LinkSet {
    pub fn clear(&mut self) {
        self.forward.clear();
        self.backward.clear();
        self.forward2.clear();
        self.backward2.clear();
    }

    pub fn first_hop(&self, direction: Direction) -> &[MessageRef] {
        match direction {
            Direction::Forward => &self.forward,
            Direction::Backward => &self.backward,
        }
    }

    pub fn second_hop(&self, direction: Direction, parent_slot: u32) -> &[MessageRef] {
        let map = match direction {
            Direction::Forward => &self.forward2,
            Direction::Backward => &self.backward2,
        };
        map.get(&parent_slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace a first-hop list, dropping every second-hop list hanging off it.
    pub fn replace_first_hop(&mut self, direction: Direction, links: Vec<MessageRef>) {
        match direction {
            Direction::Forward => {
                self.forward2.clear();
                self.forward = links;
            }
            Direction::Backward => {
                self.backward2.clear();
                self.backward = links;
            }
        }
    }

    /// Append to the second-hop list under `parent_slot`, creating it if needed.
    ///
    /// No check is made that the slot still exists in the first-hop list.
    pub fn append_second_hop(&mut self, direction: Direction, parent_slot: u32, links: &[MessageRef]) {
        let map = match direction {
            Direction::Forward => &mut self.forward2,
            Direction::Backward => &mut self.backward2,
        };
        map.entry(parent_slot).or_default().extend_from_slice(links);
    }
}

/// Position in the store plus the displayed link graph.
///
/// `1 <= current_index <= max_index` always holds; out-of-range requests are
/// clamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    current_index: u32,
    max_index: u32,
    current_message: Option<MessageRef>,
    pub links: LinkSet,
}

impl NavigationState {
    /// Start at `start_index`. Until the store reports its size the maximum is
    /// assumed to be the start index itself.
    pub fn new(start_index: u32) -> Self {
        let start = start_index.max(1);
        Self {
            current_index: start,
            max_index: start,
            current_message: None,
            links: LinkSet::default(),
        }
    }

    pub fn current_index(&self) -> u32 {
        self.current_index
    }

    pub fn max_index(&self) -> u32 {
        self.max_index
    }

    pub fn current_message(&self) -> Option<&MessageRef> {
        self.current_message.as_ref()
    }

    pub fn set_current_message(&mut self, message: MessageRef) {
        self.current_message = Some(message);
    }

    /// Record the store's size. Returns whether it changed.
    ///
    /// An empty store still reports a maximum of 1.
    pub fn set_max_index(&mut self, max: u32) -> bool {
        let max = max.max(1);
        let changed = max != self.max_index;
        self.max_index = max;
        self.current_index = self.current_index.min(max);
        changed
    }

    /// Move by `delta`, clamped to `[1, max_index]`.
    pub fn change_index(&mut self, delta: i64) -> u32 {
        let target = i64::from(self.current_index).saturating_add(delta);
        self.current_index = target.clamp(1, i64::from(self.max_index)) as u32;
        self.current_index
    }

    /// Jump to `index`, clamped to `[1, max_index]`.
    pub fn jump_to(&mut self, index: u32) -> u32 {
        self.current_index = index.clamp(1, self.max_index);
        self.current_index
    }
}
