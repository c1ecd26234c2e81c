//! 宿主命令通道 (Host Method Channel)
//!
//! 展示层以 `{method, arguments}` 形式调用, 返回 JSON 结果或带错误码的 `SessionError`。

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::detection::DetectionSession;
use crate::error::{Result, SessionError};
use crate::input::CameraFrame;
use crate::models::DEFAULT_MODEL_NAME;

/// 一次方法调用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadModelArgs {
    model_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TrackingArgs {
    enabled: Option<bool>,
}

/// 宿主命令
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ProcessImage(CameraFrame),
    StopObjectDetection,
    LoadCustomModel(String),
    EnableObjectTracking(bool),
    ResetTracking,
    GetAvailableModels,
}

fn parse_args<T: DeserializeOwned + Default>(arguments: &Value) -> Result<T> {
    if arguments.is_null() {
        return Ok(T::default());
    }
    T::deserialize(arguments).map_err(|e| SessionError::InvalidArguments(e.to_string()))
}

impl Command {
    pub fn parse(call: &MethodCall) -> Result<Self> {
        let command = match call.method.as_str() {
            "processImage" => {
                let frame = CameraFrame::deserialize(&call.arguments)
                    .map_err(|e| SessionError::InvalidArguments(format!("invalid image data: {e}")))?;
                Command::ProcessImage(frame)
            }
            "stopObjectDetection" => Command::StopObjectDetection,
            "loadCustomModel" => {
                let args: LoadModelArgs = parse_args(&call.arguments)?;
                Command::LoadCustomModel(
                    args.model_name
                        .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string()),
                )
            }
            "enableObjectTracking" => {
                let args: TrackingArgs = parse_args(&call.arguments)?;
                Command::EnableObjectTracking(args.enabled.unwrap_or(true))
            }
            "resetTracking" => Command::ResetTracking,
            "getAvailableModels" => Command::GetAvailableModels,
            other => return Err(SessionError::NotImplemented(other.to_string())),
        };
        Ok(command)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| SessionError::Processing(e.into()))
}

/// 执行一条命令
pub fn execute(session: &DetectionSession, command: Command) -> Result<Value> {
    match command {
        Command::ProcessImage(frame) => to_json(&session.process_frame(&frame)?),
        Command::StopObjectDetection => {
            session.stop();
            Ok(Value::Null)
        }
        Command::LoadCustomModel(name) => {
            session.load_model(&name)?;
            Ok(Value::Bool(true))
        }
        Command::EnableObjectTracking(enabled) => {
            session.set_tracking_enabled(enabled);
            Ok(Value::Bool(true))
        }
        Command::ResetTracking => {
            session.reset_tracking();
            Ok(Value::Bool(true))
        }
        Command::GetAvailableModels => to_json(&session.available_models()),
    }
}

/// 解析并执行方法调用
pub fn handle(session: &DetectionSession, call: &MethodCall) -> Result<Value> {
    debug!(method = %call.method, "method call");
    let command = Command::parse(call)?;
    execute(session, command)
}
