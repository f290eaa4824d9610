//! Dependency-driven event loop for the Keyframe simulation core.
//!
//! Game logic is expressed as events. An event belongs to an [`EventClass`]
//! that says *when* it runs and *what* it does, and it is bound to an
//! [`EventTarget`], the notification node of whatever object it acts on.
//! When an object writes to one of its curves it calls
//! [`EventTarget::changes`]; every event depending on that target is then
//! rescheduled by the [`EventManager`] before anything else executes.
//!
//! # Modules
//!
//! - [`class`] -- [`TriggerType`] and the [`EventClass`] trait
//! - [`event`] -- [`Event`], one scheduled instance of a class
//! - [`target`] -- [`EventTarget`], the dependency graph node
//! - [`params`] -- [`ParamMap`], type-erased event parameters
//! - [`changes`] -- Double-buffered change sets and the [`ChangeSink`]
//! - [`queue`] -- [`EventQueue`], the time-ordered main queue
//! - [`manager`] -- [`EventManager`] and the fixpoint loop
//! - [`config`] -- [`LoopConfig`]
//! - [`error`] -- [`EventError`]

pub mod changes;
pub mod class;
pub mod config;
pub mod error;
pub mod event;
pub mod manager;
pub mod params;
pub mod queue;
pub mod target;

// Re-export all public types at crate root for convenience.
pub use changes::{Change, ChangeSet, ChangeSets, ChangeSink};
pub use class::{EventClass, TriggerType};
pub use config::LoopConfig;
pub use error::EventError;
pub use event::Event;
pub use manager::{EventManager, StepSummary};
pub use params::ParamMap;
pub use queue::EventQueue;
pub use target::{EventTarget, ParentNotifier};
