//! Shared state for the API layer.

use std::sync::Arc;

use crate::analytics::ReportDispatcher;
use crate::store::RowStore;

/// State handed to every handler via `State<ApiContext>`.
#[derive(Clone)]
pub struct ApiContext {
    pub dispatcher: ReportDispatcher,
}

impl ApiContext {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self {
            dispatcher: ReportDispatcher::new(store),
        }
    }
}
