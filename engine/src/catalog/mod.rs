//! Grocery catalog adapters

pub mod picnic;

pub use picnic::PicnicClient;
