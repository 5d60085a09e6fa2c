pub mod comparison;
pub mod layout_cache;

pub use comparison::{ComparisonLayout, ComparisonLayoutResult, GridShape};
pub use layout_cache::CachedLayoutSolver;
