pub mod normalize;
pub mod providers;
pub mod relay;

pub use relay::{ActivityRelay, RelayError};
