use crate::engine::LocatorEngine;

pub struct AppState {
    pub engine: LocatorEngine,
}
