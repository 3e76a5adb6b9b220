/// Small shared data structures

pub mod slot_table;

pub use slot_table::SlotTable;
