pub mod auth;
pub mod cache;
pub mod chat;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod roles;
pub mod services;
pub mod state;
pub mod storage;
