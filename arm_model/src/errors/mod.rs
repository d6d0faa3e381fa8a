mod fault;

pub use fault::*;
