// Dongle link watcher - shared library
// Link state tracking, connection supervision and layout switching

pub mod config;
pub mod error;
pub mod layout;
pub mod link;
pub mod supervisor;

pub use config::WatcherConfig;
pub use error::WatcherError;
pub use layout::{switcher_for, LayoutSwitcher};
pub use link::{LinkState, LinkStateMachine, Transition};
pub use supervisor::{StepOutcome, Supervisor};
