pub mod config;

pub mod local;
