pub mod cascade;
pub mod options;
pub mod stock;
pub mod templates;
