pub mod bootstrap;
pub mod cache;
pub mod fetch;
pub mod script;
