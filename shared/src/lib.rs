pub mod feature;
pub mod predicate;

pub use feature::{TransportPoint, distinct_regions};
pub use predicate::FilterPredicate;
