//! 错误处理模块
//!
//! 定义应用程序的错误类型和错误处理逻辑。
//!
//! 写路径错误（`Storage`）必须传播给调用方；读路径错误（`StorageReadDegraded`）
//! 与生成错误（`Generation`）在服务层被降级为默认值，不会到达传输层。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// 资源不存在（适配器文件缺失、未知 NPC 等）
    #[error("资源不存在: {0}")]
    NotFound(String),

    /// 持久化写入失败
    #[error("存储写入失败: {0}")]
    Storage(String),

    /// 持久化读取失败（只在服务内部流转，最终降级为空结果）
    #[error("存储读取降级: {0}")]
    StorageReadDegraded(String),

    /// 文本生成失败或超时
    #[error("文本生成失败: {0}")]
    Generation(String),

    /// 语音合成失败
    #[error("语音合成失败: {0}")]
    Synthesis(String),

    /// 参数验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<surrealdb::Error> for AppError {
    fn from(e: surrealdb::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Generation(e.to_string())
    }
}

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = (&self).into();
        let body = Json(ErrorResponse::new(&code, &self.to_string()));
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response()
    }
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,
    /// 错误消息
    pub message: String,
    /// 详细信息
    pub details: Option<String>,
    /// 请求 ID
    pub request_id: Option<String>,
}

impl ErrorResponse {
    /// 创建新错误响应
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
            request_id: None,
        }
    }

    /// 添加详细信息
    pub fn with_details(mut self, details: &str) -> Self {
        self.details = Some(details.to_string());
        self
    }

    /// 添加请求 ID
    pub fn with_request_id(mut self, request_id: &str) -> Self {
        self.request_id = Some(request_id.to_string());
        self
    }
}

/// HTTP 状态码映射
impl From<&AppError> for (u16, String) {
    fn from(err: &AppError) -> (u16, String) {
        match err {
            AppError::NotFound(_) => (404, "NOT_FOUND".to_string()),
            AppError::Validation(_) => (400, "BAD_REQUEST".to_string()),
            AppError::Storage(_) => (500, "STORAGE_ERROR".to_string()),
            AppError::StorageReadDegraded(_) => (503, "STORAGE_UNAVAILABLE".to_string()),
            AppError::Generation(_) => (502, "GENERATION_ERROR".to_string()),
            AppError::Synthesis(_) => (502, "SYNTHESIS_ERROR".to_string()),
            _ => (500, "INTERNAL_ERROR".to_string()),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let (status, code): (u16, String) = (&AppError::NotFound("baker.lora".into())).into();
        assert_eq!(status, 404);
        assert_eq!(code, "NOT_FOUND");

        let (status, code): (u16, String) = (&AppError::Storage("disk full".into())).into();
        assert_eq!(status, 500);
        assert_eq!(code, "STORAGE_ERROR");

        let (status, _): (u16, String) = (&AppError::Validation("empty".into())).into();
        assert_eq!(status, 400);
    }

    #[test]
    fn test_error_response_builder() {
        let resp = ErrorResponse::new("NOT_FOUND", "missing")
            .with_details("adapter baker.lora")
            .with_request_id("req-1");
        assert_eq!(resp.details.as_deref(), Some("adapter baker.lora"));
        assert_eq!(resp.request_id.as_deref(), Some("req-1"));
    }
}
