mod categories;

pub use categories::*;
