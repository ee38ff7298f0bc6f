use amber_route::{Signal, SignalId};
use serde_json::{json, Value};

use crate::authority::{AuthorityError, RequestId};
use crate::registry::InMemoryAuthority;

const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const DOMAIN_ERROR: i32 = -32000;

/// Handle a single JSON-RPC request against the registry and return a
/// JSON-RPC response.
///
/// Methods mirror the ambulance and police endpoints:
/// `signals/init`, `signals/request`, `signals/status`, `police/requests`,
/// `police/accept`.
pub fn handle_request(req: &Value, authority: &InMemoryAuthority) -> Value {
    let id = req.get("id").cloned().unwrap_or(Value::Null);
    let method = req.get("method").and_then(|m| m.as_str()).unwrap_or("");
    let params = req.get("params").cloned().unwrap_or(json!({}));

    let result = match method {
        "signals/init" => handle_init(&params, authority),
        "signals/request" => handle_signal_request(&params, authority),
        "signals/status" => handle_status(&params, authority),
        "police/requests" => handle_pending(authority),
        "police/accept" => handle_accept(&params, authority),
        _ => return json_rpc_error(id, METHOD_NOT_FOUND, "Method not found"),
    };

    match result {
        Ok(value) => json_rpc_result(id, value),
        Err(AuthorityError::InvalidRequest(message)) => {
            json_rpc_error(id, INVALID_PARAMS, &message)
        }
        Err(e) => json_rpc_error(id, DOMAIN_ERROR, &e.to_string()),
    }
}

fn handle_init(params: &Value, authority: &InMemoryAuthority) -> Result<Value, AuthorityError> {
    let raw = params
        .get("signals")
        .and_then(|s| s.as_array())
        .ok_or_else(|| AuthorityError::InvalidRequest("signals must be an array".into()))?;

    // Entries that do not describe a signal are skipped, not fatal.
    let signals: Vec<Signal> = raw
        .iter()
        .filter_map(|s| serde_json::from_value(s.clone()).ok())
        .collect();
    authority.init_signals(&signals);

    Ok(json!({
        "message": "Signals initialized",
        "initialized": signals.len(),
        "skipped": raw.len() - signals.len(),
    }))
}

fn handle_signal_request(
    params: &Value,
    authority: &InMemoryAuthority,
) -> Result<Value, AuthorityError> {
    let signal = signal_index(params)?;
    let ack = authority.request(signal)?;
    Ok(serde_json::to_value(&ack).unwrap_or(Value::Null))
}

fn handle_status(params: &Value, authority: &InMemoryAuthority) -> Result<Value, AuthorityError> {
    let signal = signal_index(params)?;
    let status = authority.status(signal)?;
    Ok(json!({ "status": status }))
}

fn handle_pending(authority: &InMemoryAuthority) -> Result<Value, AuthorityError> {
    let pending = authority.pending_requests();
    Ok(serde_json::to_value(&pending).unwrap_or_else(|_| json!([])))
}

fn handle_accept(params: &Value, authority: &InMemoryAuthority) -> Result<Value, AuthorityError> {
    let request_id = params
        .get("requestId")
        .and_then(|r| r.as_str())
        .ok_or_else(|| AuthorityError::InvalidRequest("requestId is required".into()))?;
    let signal = authority.accept(&RequestId(request_id.to_string()))?;
    Ok(json!({
        "message": "Signal request accepted",
        "signalIndex": signal,
    }))
}

/// `signalIndex` may arrive as a number or a numeric string.
fn signal_index(params: &Value) -> Result<SignalId, AuthorityError> {
    let raw = params
        .get("signalIndex")
        .ok_or_else(|| AuthorityError::InvalidRequest("signalIndex is required".into()))?;
    let parsed = match raw {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|n| u32::try_from(n).ok())
        .map(SignalId)
        .ok_or_else(|| AuthorityError::InvalidRequest("signalIndex must be a number".into()))
}

fn json_rpc_result(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

fn json_rpc_error(id: Value, code: i32, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message,
        }
    })
}
