use std::net::IpAddr;

use logsift::config::AppConfig;
use logsift::gate::RequestGate;
use logsift::search::SearchService;

pub struct AppState {
    pub search: SearchService,
    /// Per-IP search cooldown / 按IP的搜索冷却
    pub gate: RequestGate<IpAddr>,
    pub page_size: usize,
    pub min_query_chars: usize,
}

impl AppState {
    pub fn new(search: SearchService, config: &AppConfig) -> Self {
        Self {
            search,
            gate: RequestGate::new(config.gate.cooldown()),
            page_size: config.search.page_size,
            min_query_chars: config.search.min_query_chars,
        }
    }
}
