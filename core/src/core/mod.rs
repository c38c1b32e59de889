pub mod behavior;
pub mod handler;
pub mod outcome;
pub mod request;

// Re-export key types for easier access from other courier modules (and lib.rs)
pub use behavior::{
  AnyAsyncCommandBehavior, AnyAsyncQueryBehavior, AnyCommandBehavior, AnyNext, AnyNextAsync,
  AnyQueryBehavior, AsyncCommandBehavior, AsyncQueryBehavior, BoxFuture, CommandBehavior, Next,
  NextAsync, QueryBehavior,
};
pub use handler::{AsyncCommandHandler, AsyncQueryHandler, CommandHandler, QueryHandler};
pub use outcome::Outcome;
pub use request::{AnyRequest, Command, Query};
