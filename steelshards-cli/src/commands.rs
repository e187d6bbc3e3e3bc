pub mod build;
pub mod networks;
