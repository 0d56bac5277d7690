//! Controller module - Application logic and event handling
//!
//! This module contains the application controller that handles user input,
//! drives the transport and queue, and runs the background scheduler.
//! It is organized into submodules by responsibility:
//!
//! - `input`: Key event handling
//! - `playback`: Transport and queue control surface
//! - `scheduler`: Polling loop that advances the queue and preloads

mod input;
mod playback;
mod scheduler;

pub use scheduler::spawn_scheduler;

use std::sync::Arc;

use crate::config::Config;
use crate::model::AppModel;

#[derive(Clone)]
pub struct AppController {
    pub(crate) model: AppModel,
    pub(crate) config: Arc<Config>,
}

impl AppController {
    pub fn new(model: AppModel, config: Arc<Config>) -> Self {
        Self { model, config }
    }
}
