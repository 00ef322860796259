// src/lib.rs

pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod model;
pub mod service;
pub mod storage;
