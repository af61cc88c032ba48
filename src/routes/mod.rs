mod apply;
mod health_check;

pub use apply::*;
pub use health_check::*;
