//! Policy boundary and bundled model stages.

pub mod latent;
pub mod model;
pub mod port;
