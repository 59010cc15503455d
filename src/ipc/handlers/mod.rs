pub mod analytics;
pub mod core;
pub mod form;
pub mod resources;
pub mod session;
pub mod settings;
