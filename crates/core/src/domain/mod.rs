pub mod filters;
pub mod ranking;
pub mod wire;
