pub mod handlers;
pub mod parser;
pub mod service;
