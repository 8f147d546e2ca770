pub mod assembler;
pub mod config;
pub mod i18n;
pub mod localizer;
pub mod policy;
pub mod provider;
pub mod record;
pub mod resolver;
pub mod retry;
pub mod server;
pub mod throttle;
pub mod translation;
