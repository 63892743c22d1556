mod decode_impl;
pub mod handler;
pub mod output;
pub mod progress;

pub use decode_impl::cmd_decode;
