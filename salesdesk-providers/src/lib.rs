pub mod parse;
pub mod request;
pub mod runtime;
pub mod start_call;
