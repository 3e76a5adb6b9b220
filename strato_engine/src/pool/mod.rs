/// Fixed-capacity pools of reusable entities

pub mod object_pool;

pub use object_pool::{ObjectPool, PoolHandle, SlotState};
