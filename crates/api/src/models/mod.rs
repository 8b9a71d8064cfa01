pub mod digest;
pub mod finding;

pub use digest::*;
pub use finding::*;
