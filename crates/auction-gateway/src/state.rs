use {
    auction_engine::{AdmissionPipeline, EventBus, LifecycleService, Persistence, SettlementEngine},
    std::sync::Arc,
};

#[derive(Clone)]
pub struct AppState {
    pub persistence: Arc<dyn Persistence>,
    pub lifecycle: Arc<LifecycleService>,
    pub pipeline: Arc<AdmissionPipeline>,
    pub settlement: Arc<SettlementEngine>,
    pub events: Arc<EventBus>,
}

impl AppState {
    pub fn new(persistence: Arc<dyn Persistence>, max_event_backlog: usize, default_timer_seconds: Option<u32>) -> Self {
        Self {
            lifecycle: Arc::new(LifecycleService::new(persistence.clone()).with_default_timer_seconds(default_timer_seconds)),
            pipeline: Arc::new(AdmissionPipeline::new(persistence.clone())),
            settlement: Arc::new(SettlementEngine::new(persistence.clone())),
            events: Arc::new(EventBus::with_capacity(max_event_backlog)),
            persistence,
        }
    }
}
