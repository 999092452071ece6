pub mod convert;
pub mod menu;
pub mod notifier;
pub mod rates;
pub mod setup;
pub mod ui;
