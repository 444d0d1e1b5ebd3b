//! gemini-relay: forwards prompts and uploaded files to a generative model.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
