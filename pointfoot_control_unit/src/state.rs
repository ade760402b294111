//! Controller mode state machine.

pub mod stand;
