//! JSON-RPC 2.0 dispatch for the task endpoint
//!
//! Dispatches:
//! - `tasks/send`   → submit or replay a task
//! - `tasks/get`    → snapshot a task
//! - `tasks/cancel` → cancel a task
//!
//! Only the envelope is checked here. Everything the task manager rejects
//! travels back in the error slot of a normal response.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    codec::jsonrpc::{
        error_codes, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId, JSONRPC_VERSION,
    },
    protocol::{
        operation::methods, Task, TaskIdParams, TaskQueryParams, TaskSendParams,
    },
    server::TaskManager,
};

/// Handle a raw request body
pub async fn handle_body(manager: &TaskManager, body: &[u8]) -> JsonRpcResponse {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            return JsonRpcResponse::error(
                None,
                JsonRpcError::new(error_codes::PARSE_ERROR, format!("Parse error: {}", e)),
            )
        }
    };

    // Echo whatever id we can read, even if the rest of the envelope is wrong.
    let id = value
        .get("id")
        .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());

    if value.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return JsonRpcResponse::error(
            id,
            JsonRpcError::new(
                error_codes::INVALID_REQUEST,
                "Invalid JSON-RPC version, expected 2.0",
            ),
        );
    }

    match serde_json::from_value::<JsonRpcRequest>(value) {
        Ok(request) => dispatch(manager, request).await,
        Err(e) => JsonRpcResponse::error(
            id,
            JsonRpcError::new(error_codes::INVALID_REQUEST, format!("Invalid request: {}", e)),
        ),
    }
}

/// Dispatch a JSON-RPC request to the task manager
pub async fn dispatch(manager: &TaskManager, request: JsonRpcRequest) -> JsonRpcResponse {
    let JsonRpcRequest {
        method, params, id, ..
    } = request;

    tracing::debug!(%method, request_id = %id, "dispatching");

    let outcome = route(manager, &method, params).await.and_then(|task| {
        serde_json::to_value(task)
            .map_err(|e| JsonRpcError::new(error_codes::INTERNAL_ERROR, e.to_string()))
    });

    match outcome {
        Ok(result) => JsonRpcResponse::success(Some(id), result),
        Err(error) => JsonRpcResponse::error(Some(id), error),
    }
}

async fn route(manager: &TaskManager, method: &str, params: Value) -> Result<Task, JsonRpcError> {
    let task = match method {
        methods::SEND_TASK => manager.send(parse::<TaskSendParams>(params)?).await?,
        methods::GET_TASK => manager.get(parse::<TaskQueryParams>(params)?).await?,
        methods::CANCEL_TASK => manager.cancel(parse::<TaskIdParams>(params)?).await?,
        _ => {
            return Err(JsonRpcError::new(
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            ))
        }
    };
    Ok(task)
}

fn parse<T: DeserializeOwned>(params: Value) -> Result<T, JsonRpcError> {
    serde_json::from_value(params).map_err(|e| {
        JsonRpcError::new(error_codes::INVALID_PARAMS, format!("Invalid params: {}", e))
    })
}
