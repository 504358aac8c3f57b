pub mod analyze;
pub mod crack;
pub mod keylen;
pub mod xor;

pub use analyze::*;
pub use crack::*;
pub use keylen::*;
pub use xor::*;
