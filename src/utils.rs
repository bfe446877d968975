#![forbid(unsafe_code)]

pub mod classify;
pub mod config;
pub mod errors;
pub mod facts;
pub mod parse;
pub mod properties;
pub mod web_utils;
