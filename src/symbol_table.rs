//! Maps variable names to the stack slots backing them. A program has a single
//! flat scope, and a variable gets its slot the first time it is assigned.

use hashbrown::HashMap;

use crate::ir::SlotId;

#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    slots: HashMap<String, SlotId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<SlotId> {
        self.slots.get(name).copied()
    }

    /// Binds `name` to `slot`. A name is bound at most once, so binding it
    /// again fails and hands back the slot it already has.
    pub fn insert(&mut self, name: impl Into<String>, slot: SlotId) -> Result<(), SlotId> {
        match self.slots.entry(name.into()) {
            hashbrown::hash_map::Entry::Occupied(entry) => Err(*entry.get()),
            hashbrown::hash_map::Entry::Vacant(entry) => {
                entry.insert(slot);
                Ok(())
            }
        }
    }

    /// Slot of `name`, creating it with `create` on first use
    pub fn get_or_insert_with(&mut self, name: &str, create: impl FnOnce() -> SlotId) -> SlotId {
        *self.slots.entry_ref(name).or_insert_with(create)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Index;

    #[test]
    fn unknown_names_are_absent() {
        let table = SymbolTable::new();

        assert_eq!(table.get("x"), None);
    }

    #[test]
    fn names_are_bound_once() {
        let mut table = SymbolTable::new();

        assert_eq!(table.insert("x", SlotId::new(0)), Ok(()));
        assert_eq!(table.insert("x", SlotId::new(1)), Err(SlotId::new(0)));
        assert_eq!(table.get("x"), Some(SlotId::new(0)));
    }

    #[test]
    fn creates_slot_only_on_first_use() {
        let mut table = SymbolTable::new();
        let mut created = 0;

        for _ in 0..3 {
            let slot = table.get_or_insert_with("counter", || {
                created += 1;
                SlotId::new(7)
            });
            assert_eq!(slot, SlotId::new(7));
        }

        assert_eq!(created, 1);
        assert_eq!(table.get("counter"), Some(SlotId::new(7)));
    }
}
