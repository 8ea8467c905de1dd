//! Row structs for the inventory tables.
//!
//! Each submodule holds a `FromRow` struct matching the table and the
//! conversion into the corresponding `stockgrid_core` type.

pub mod cascade_settings;
pub mod category;
pub mod item;
pub mod option;
pub mod stock_cell;
