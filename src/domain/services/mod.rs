pub mod clipboard;
mod conversation;
mod pending;
mod tasks;

pub use conversation::*;
pub use tasks::*;
