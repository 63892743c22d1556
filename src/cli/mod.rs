pub mod command;
pub mod decode;
pub mod probe;
