use serde_json::json;

use service_core::error::AppError;
use service_core::response::Reply;

pub async fn health_check() -> Result<Reply, AppError> {
    Reply::plain(json!({ "status": "healthy" }))
}
