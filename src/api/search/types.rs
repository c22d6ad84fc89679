use serde::{Deserialize, Serialize};

/// 单次查询返回行数上限
pub const MAX_LIMIT: usize = 200;

/// 搜索请求
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// 搜索响应
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<String>,
    /// 匹配总数
    pub total: u64,
    /// 未返回的匹配数
    pub hidden: u64,
}
