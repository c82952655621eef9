pub mod messages;
pub mod traits;
pub mod yahoo;
