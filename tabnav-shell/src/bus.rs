mod main;
mod nav;

pub use main::*;
pub use nav::*;
