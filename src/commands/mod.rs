pub mod batch;
pub mod db;
pub mod scoring;
pub mod settings;
