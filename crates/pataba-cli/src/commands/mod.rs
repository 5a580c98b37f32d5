pub mod catalog;
pub mod config;
pub mod parse;
pub mod recommend;
