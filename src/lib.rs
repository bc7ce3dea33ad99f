// Library for tests to access modules

pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod history;
pub mod input;
pub mod models;
pub mod poller;
pub mod render;
pub mod rig_api;
pub mod version;
