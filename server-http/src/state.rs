use application::Application;
use application::ports::Backend;
use shared::Context;
use shared::config::RequestLimits;
use std::sync::Arc;
use std::time::Duration;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub app: Application,
    pub limits: RequestLimits,
    pub request_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(backend: Arc<dyn Backend>, limits: RequestLimits) -> Self {
        Self {
            app: Application::new(backend),
            limits,
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Fresh per-request context; the deadline starts when the request does.
    pub fn context(&self) -> Context {
        match self.request_timeout {
            Some(timeout) => Context::with_timeout(timeout),
            None => Context::background(),
        }
    }
}
