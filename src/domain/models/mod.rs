mod gateway;
mod locale;
mod message;
mod role;
mod session;
mod task;

pub use gateway::*;
pub use locale::*;
pub use message::*;
pub use role::*;
pub use session::*;
pub use task::*;
