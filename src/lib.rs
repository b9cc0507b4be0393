pub mod builder;
pub mod cli;
pub mod config;
pub mod lint;
pub mod pkgs;
pub mod tasks;
