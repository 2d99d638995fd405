pub mod config;
pub mod monitor;
pub mod notifications;
pub mod service;
pub mod storage;
pub mod version;
pub mod web;
