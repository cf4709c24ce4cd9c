pub mod animation;
pub mod capture;
pub mod config;
pub mod gpu;
pub mod particle;
pub mod session;
pub mod stress;
pub mod tiling;

pub mod cli;
pub mod viewer;
