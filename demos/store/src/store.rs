//! In-memory message store.
//!
//! Entries are addressed by a 1-based index and never removed. Each entry
//! occupies an extent of a notional append-only file; rewriting an entry with
//! longer text moves it and leaves its old extent in the free-space table.

use linkstore_core::{Direction, FreeSpaceRow, IndexRow, MessageRef};

/// Per-entry, per-direction link limit.
pub const MAX_LINKS: usize = 20;

#[derive(Debug, Clone)]
pub struct Entry {
    pub text: String,
    pub offset: u64,
    pub length: u32,
    pub forward: Vec<u32>,
    pub backward: Vec<u32>,
}

impl Entry {
    fn links(&self, direction: Direction) -> &[u32] {
        match direction {
            Direction::Forward => &self.forward,
            Direction::Backward => &self.backward,
        }
    }

    fn links_mut(&mut self, direction: Direction) -> &mut Vec<u32> {
        match direction {
            Direction::Forward => &mut self.forward,
            Direction::Backward => &mut self.backward,
        }
    }
}

#[derive(Debug, Default)]
pub struct Store {
    entries: Vec<Entry>,
    free_space: Vec<FreeSpaceRow>,
    end: u64,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small linked graph to browse.
    pub fn seeded() -> Self {
        let mut store = Self::new();
        let root = store.append("welcome to the store");
        for text in ["first child", "second child"] {
            let child = store.append(text);
            store.seed_link(root, child);
        }
        let grandchild = store.append("grandchild of the first child");
        store.seed_link(2, grandchild);
        store
    }

    fn seed_link(&mut self, source: u32, target: u32) {
        if let Err(e) = self.link(Direction::Forward, source, target) {
            tracing::warn!(source, target, error = %e, "failed to seed link");
        }
    }

    pub fn max_index(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn get(&self, index: u32) -> Option<&Entry> {
        let slot = index.checked_sub(1)?;
        self.entries.get(slot as usize)
    }

    fn get_mut(&mut self, index: u32) -> Result<&mut Entry, StoreError> {
        let slot = index.checked_sub(1).ok_or(StoreError::NotFound(index))?;
        self.entries
            .get_mut(slot as usize)
            .ok_or(StoreError::NotFound(index))
    }

    /// First fit from the free-space table, else the end of the file.
    fn allocate(&mut self, length: u32) -> u64 {
        if let Some(pos) = self.free_space.iter().position(|f| f.length >= length) {
            let extent = self.free_space[pos];
            if extent.length == length {
                self.free_space.remove(pos);
            } else {
                self.free_space[pos] = FreeSpaceRow {
                    offset: extent.offset + u64::from(length),
                    length: extent.length - length,
                };
            }
            return extent.offset;
        }
        let offset = self.end;
        self.end += u64::from(length);
        offset
    }

    fn release(&mut self, offset: u64, length: u32) {
        if length > 0 {
            self.free_space.push(FreeSpaceRow { offset, length });
        }
    }

    /// Store a new entry and return its index.
    pub fn append(&mut self, text: &str) -> u32 {
        let length = text.len() as u32;
        let offset = self.allocate(length);
        self.entries.push(Entry {
            text: text.to_string(),
            offset,
            length,
            forward: Vec::new(),
            backward: Vec::new(),
        });
        self.max_index()
    }

    pub fn modify(&mut self, index: u32, text: &str) -> Result<(), StoreError> {
        let new_length = text.len() as u32;
        let (old_offset, old_length) = {
            let entry = self.get_mut(index)?;
            (entry.offset, entry.length)
        };

        let offset = if new_length <= old_length {
            self.release(old_offset + u64::from(new_length), old_length - new_length);
            old_offset
        } else {
            self.release(old_offset, old_length);
            self.allocate(new_length)
        };

        let entry = self.get_mut(index)?;
        entry.text = text.to_string();
        entry.offset = offset;
        entry.length = new_length;
        Ok(())
    }

    /// Add `source -> target` in `direction`, and the mirror link on `target`.
    pub fn link(&mut self, direction: Direction, source: u32, target: u32) -> Result<(), StoreError> {
        self.get(target).ok_or(StoreError::NotFound(target))?;
        let src = self.get(source).ok_or(StoreError::NotFound(source))?;
        if src.links(direction).contains(&target) {
            return Ok(());
        }
        if src.links(direction).len() >= MAX_LINKS
            || self.get(target).map_or(0, |t| t.links(direction.reverse()).len()) >= MAX_LINKS
        {
            return Err(StoreError::LinkLimit(source));
        }
        self.get_mut(source)?.links_mut(direction).push(target);
        self.get_mut(target)?.links_mut(direction.reverse()).push(source);
        Ok(())
    }

    pub fn unlink(&mut self, direction: Direction, source: u32, target: u32) -> Result<(), StoreError> {
        let links = self.get_mut(source)?.links_mut(direction);
        let pos = links
            .iter()
            .position(|i| *i == target)
            .ok_or(StoreError::NotLinked {
                from: source,
                to: target,
            })?;
        links.remove(pos);
        let mirror = self.get_mut(target)?.links_mut(direction.reverse());
        mirror.retain(|i| *i != source);
        Ok(())
    }

    pub fn links(&self, index: u32, direction: Direction) -> Option<Vec<MessageRef>> {
        let entry = self.get(index)?;
        Some(
            entry
                .links(direction)
                .iter()
                .filter_map(|i| self.get(*i).map(|e| MessageRef::new(*i, e.text.clone())))
                .collect(),
        )
    }

    pub fn index_table(&self) -> Vec<IndexRow> {
        self.entries
            .iter()
            .zip(1u32..)
            .map(|(e, index)| IndexRow {
                index,
                offset: e.offset,
                length: e.length,
                forward_links: e.forward.clone(),
                backward_links: e.backward.clone(),
            })
            .collect()
    }

    pub fn free_space_table(&self) -> Vec<FreeSpaceRow> {
        self.free_space.clone()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("message {0} not found")]
    NotFound(u32),
    #[error("message {0} has too many links")]
    LinkLimit(u32),
    #[error("message {from} is not linked to {to}")]
    NotLinked { from: u32, to: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_assigns_increasing_indices_and_offsets() {
        let mut store = Store::new();
        assert_eq!(store.append("abc"), 1);
        assert_eq!(store.append("defgh"), 2);
        let table = store.index_table();
        assert_eq!((table[1].offset, table[1].length), (3, 5));
        assert!(store.get(0).is_none());
        assert!(store.get(3).is_none());
    }

    #[test]
    fn growing_an_entry_relocates_it() {
        let mut store = Store::new();
        store.append("abc");
        store.append("xy");
        store.modify(1, "abcdef").unwrap();
        assert_eq!(store.get(1).unwrap().offset, 5);
        assert_eq!(
            store.free_space_table(),
            vec![FreeSpaceRow {
                offset: 0,
                length: 3
            }]
        );

        // The freed extent is reused by the next small append.
        store.append("zz");
        assert_eq!(store.get(3).unwrap().offset, 0);
        assert_eq!(
            store.free_space_table(),
            vec![FreeSpaceRow {
                offset: 2,
                length: 1
            }]
        );
    }

    #[test]
    fn shrinking_an_entry_frees_its_tail() {
        let mut store = Store::new();
        store.append("abcdef");
        store.modify(1, "ab").unwrap();
        assert_eq!(store.get(1).unwrap().offset, 0);
        assert_eq!(
            store.free_space_table(),
            vec![FreeSpaceRow {
                offset: 2,
                length: 4
            }]
        );
        assert!(matches!(store.modify(9, "x"), Err(StoreError::NotFound(9))));
    }

    #[test]
    fn links_are_mirrored() {
        let mut store = Store::new();
        store.append("a");
        store.append("b");
        store.link(Direction::Forward, 1, 2).unwrap();
        store.link(Direction::Forward, 1, 2).unwrap();
        assert_eq!(store.get(1).unwrap().forward, vec![2]);
        assert_eq!(store.get(2).unwrap().backward, vec![1]);

        let back = store.links(2, Direction::Backward).unwrap();
        assert_eq!(back, vec![MessageRef::new(1, "a")]);

        store.unlink(Direction::Forward, 1, 2).unwrap();
        assert!(store.get(2).unwrap().backward.is_empty());
        assert!(matches!(
            store.unlink(Direction::Forward, 1, 2),
            Err(StoreError::NotLinked { .. })
        ));
        assert!(matches!(
            store.link(Direction::Backward, 1, 5),
            Err(StoreError::NotFound(5))
        ));
    }

    #[test]
    fn seeded_graph() {
        let store = Store::seeded();
        assert_eq!(store.max_index(), 4);
        assert_eq!(store.get(1).unwrap().forward, vec![2, 3]);
        assert_eq!(store.get(2).unwrap().forward, vec![4]);
    }
}
