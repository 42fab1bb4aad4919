pub mod feed_parser;
pub mod opscreen_integration;
pub mod opscreen_response;
pub mod remote_integration;
