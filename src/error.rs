//! 会话错误类型
//! Errors reported by the host surface; each maps to a stable error code.

use thiserror::Error;

pub type Result<T, E = SessionError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SessionError {
    /// 调用参数缺失或格式错误
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// 检测引擎执行失败
    #[error("Detection failed: {0:#}")]
    DetectionFailed(#[source] anyhow::Error),

    /// 帧数据预处理失败
    #[error("Processing error: {0:#}")]
    Processing(#[source] anyhow::Error),

    /// 模型加载失败
    #[error("Model loading error: {message}")]
    ModelLoading {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 未知方法
    #[error("Method not implemented: {0}")]
    NotImplemented(String),
}

impl SessionError {
    /// 机器可读错误码
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::InvalidArguments(_) => "INVALID_ARGUMENTS",
            SessionError::DetectionFailed(_) => "DETECTION_FAILED",
            SessionError::Processing(_) => "PROCESSING_ERROR",
            SessionError::ModelLoading { .. } => "MODEL_LOADING_ERROR",
            SessionError::NotImplemented(_) => "NOT_IMPLEMENTED",
        }
    }

    pub fn model_loading(message: impl Into<String>) -> Self {
        SessionError::ModelLoading {
            message: message.into(),
            source: None,
        }
    }
}
