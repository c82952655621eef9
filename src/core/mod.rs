pub mod desk;
pub mod portfolio;
