pub mod batch;
pub mod currency;
pub mod download;
pub mod entity;
