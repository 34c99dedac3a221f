mod provider;
mod resolver;

pub use provider::*;
pub use resolver::*;
