pub mod items_resolver;
pub mod margin_alert;
pub mod scheduler;
pub mod totals_service;
pub mod transaction_service;
