pub mod acceptor;
pub mod commands;
pub mod content;
pub mod context;
pub mod error;
pub mod prompt;
pub mod registry;
pub mod worker;

pub use acceptor::Acceptor;
pub use content::{sample_world, ContentError, WorldDef};
pub use context::{GameContext, Session, SharedWorld};
pub use error::{CommandError, DispatchError, ServerError};
pub use registry::{Arity, Command, CommandRegistry};
pub use worker::{SessionWorker, SHUTDOWN_NOTICE};
