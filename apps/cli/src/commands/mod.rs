//! 命令模块

pub mod decode;
pub mod ports;
pub mod run;

pub use decode::DecodeCommand;
pub use run::RunCommand;
