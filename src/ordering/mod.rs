pub mod avl;
pub mod heap;

pub use avl::{ChronoEntry, ChronoOrderedView, InOrder};
pub use heap::ReportHeap;
