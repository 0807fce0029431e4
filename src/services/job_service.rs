use std::sync::Arc;

use crate::database::{EntityStore, Pagination};
use crate::error::Result;
use crate::models::job::Job;

#[derive(Clone)]
pub struct JobService {
    store: Arc<dyn EntityStore>,
}

impl JobService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, page: Pagination) -> Result<Vec<Job>> {
        self.store.list_jobs(page).await
    }
}
