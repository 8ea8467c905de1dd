//! Domain logic for per-item colour/size options, the stock matrix built
//! from them, cascade settings resolution and option templates.
//!
//! Pure planning lives in the top-level modules; [`services`] orchestrates
//! it over the traits in [`store`].

pub mod cascade;
pub mod error;
pub mod locks;
pub mod matrix;
pub mod memory;
pub mod options;
pub mod services;
pub mod store;
pub mod templates;
pub mod types;
