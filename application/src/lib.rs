// application/src/lib.rs
pub mod payload;
pub mod ports;
pub mod usecases;

use ports::Backend;
use std::sync::Arc;
use usecases::{GetUseCase, PutUseCase};

#[derive(Clone)]
pub struct Application {
    pub put: PutUseCase,
    pub get: GetUseCase,
}

impl Application {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            put: PutUseCase::new(backend.clone()),
            get: GetUseCase::new(backend),
        }
    }
}
