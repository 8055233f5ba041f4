//! Search pipeline: keystroke → debouncer → search fetch → result list.

mod debouncer;
mod deferred;

pub use debouncer::{DebounceState, SearchDebouncer};
pub use deferred::DeferredTask;
