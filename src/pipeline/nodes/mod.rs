//! Built-in processor implementations.

pub mod code;
pub mod console;
pub mod json_e;
pub mod json_parse;
pub mod merge;
pub mod platform_file;

pub use code::CodeProcessor;
pub use console::ConsoleProcessor;
pub use json_e::{JsonEProcessor, CONTEXT_HANDLE, TEMPLATE_HANDLE};
pub use json_parse::JsonParseProcessor;
pub use merge::MergeProcessor;
pub use platform_file::PlatformFileProcessor;
