pub mod bioc;
pub mod pubannotation;

pub use bioc::*;
pub use pubannotation::*;
