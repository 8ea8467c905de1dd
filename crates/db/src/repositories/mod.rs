//! Repository layer.
//!
//! Each repository is a zero-sized struct. Reads take `&PgPool`; writes
//! that take part in a larger atomic step take `&mut PgConnection` so the
//! caller can pass `&mut *tx`.

pub mod cascade_settings_repo;
pub mod category_repo;
pub mod color_repo;
pub mod item_repo;
pub mod size_repo;
pub mod stock_cell_repo;

pub use cascade_settings_repo::CascadeSettingsRepo;
pub use category_repo::CategoryRepo;
pub use color_repo::ColorRepo;
pub use item_repo::ItemRepo;
pub use size_repo::SizeRepo;
pub use stock_cell_repo::StockCellRepo;
