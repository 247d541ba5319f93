pub mod analytics;
pub mod domain;
