pub mod catalog;
pub mod price_override;
pub mod selection;
pub mod settings;
pub mod totals;
pub mod transaction;
