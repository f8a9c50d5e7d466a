//! CLI subcommand implementations.

pub mod convert;
pub mod info;

pub use convert::CmdConvert;
pub use info::CmdInfo;
