//! Small, self-contained data structures used across the crate.

pub mod dyn_list;
pub mod linked_list;
pub mod ptr_list;

pub use dyn_list::{DynList, SIZE_MIN_DEFAULT};
pub use linked_list::{BoxList, Cloneable, LinkTopology, LinkedList, NodeId};
pub use ptr_list::{PtrDynList, PtrList, RefList};
