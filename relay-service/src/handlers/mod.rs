pub mod health;
pub mod ideas;

pub use health::health_check;
pub use ideas::generate_ideas;
