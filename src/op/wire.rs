//! JSON wire codec for op batches.
//!
//! On the wire a batch is a JSON array of `{"op": NAME, "args": [...]}`
//! elements. Decoding is tolerant per element: an unknown name or a bad
//! argument shape produces a [`BridgeError::MalformedOp`] for that slot while
//! the rest of the batch still decodes. Only a payload that is not an array
//! at all fails as a whole.
//!
//! Insertion has two wire spellings: `appendChild` (no anchor) and
//! `insertChild` (anchor sibling handle in the third slot). Both decode to
//! [`Op::Insert`].

use serde_json::{json, Map, Value};

use super::{NodeHandle, Op, OpBatch};
use crate::error::BridgeError;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode one op as a wire element.
pub fn encode_op(op: &Op) -> Value {
    let args = match op {
        Op::Create { handle, tag } => vec![json!(handle.raw()), json!(tag)],
        Op::CreateText { handle, text } => vec![json!(handle.raw()), json!(text)],
        Op::Insert { parent, child, before: Some(before) } => {
            vec![json!(parent.raw()), json!(child.raw()), json!(before.raw())]
        }
        Op::Insert { parent, child, before: None } => {
            vec![json!(parent.raw()), json!(child.raw())]
        }
        Op::Remove { parent, child } => vec![json!(parent.raw()), json!(child.raw())],
        Op::UpdateProp { handle, key, value } => vec![
            json!(handle.raw()),
            json!(key),
            value.clone().unwrap_or(Value::Null),
        ],
        Op::UpdateStyle { handle, style } => {
            vec![json!(handle.raw()), Value::Object(style.clone())]
        }
        Op::AddListener { handle, event } | Op::RemoveListener { handle, event } => {
            vec![json!(handle.raw()), json!(event)]
        }
        Op::SetRoot { handle } => vec![json!(handle.raw())],
    };
    json!({ "op": op.wire_name(), "args": args })
}

/// Encode a batch as a wire array.
pub fn encode_batch(batch: &OpBatch) -> Value {
    Value::Array(batch.ops.iter().map(encode_op).collect())
}

/// Encode a batch as compact JSON text.
pub fn encode_batch_string(batch: &OpBatch) -> String {
    encode_batch(batch).to_string()
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode one wire element into a typed op.
pub fn decode_op(element: &Value) -> Result<Op, String> {
    let obj = element
        .as_object()
        .ok_or_else(|| "expected an object with op and args".to_string())?;
    let name = obj
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing op name".to_string())?;
    let empty = Vec::new();
    let args = match obj.get("args") {
        None => &empty,
        Some(Value::Array(args)) => args,
        Some(other) => return Err(format!("args must be an array, got {other}")),
    };

    match name {
        "create" => Ok(Op::Create { handle: handle_arg(args, 0)?, tag: str_arg(args, 1)? }),
        "createText" => {
            Ok(Op::CreateText { handle: handle_arg(args, 0)?, text: str_arg(args, 1)? })
        }
        "appendChild" => Ok(Op::Insert {
            parent: handle_arg(args, 0)?,
            child: handle_arg(args, 1)?,
            before: None,
        }),
        "insertChild" => Ok(Op::Insert {
            parent: handle_arg(args, 0)?,
            child: handle_arg(args, 1)?,
            before: anchor_arg(args, 2)?,
        }),
        "removeChild" => {
            Ok(Op::Remove { parent: handle_arg(args, 0)?, child: handle_arg(args, 1)? })
        }
        "updateProp" => {
            // A missing or null value clears the prop.
            let value = match args.get(2) {
                None | Some(Value::Null) => None,
                Some(value) => Some(value.clone()),
            };
            Ok(Op::UpdateProp { handle: handle_arg(args, 0)?, key: str_arg(args, 1)?, value })
        }
        "updateStyle" => {
            Ok(Op::UpdateStyle { handle: handle_arg(args, 0)?, style: object_arg(args, 1)? })
        }
        "addListener" => {
            Ok(Op::AddListener { handle: handle_arg(args, 0)?, event: str_arg(args, 1)? })
        }
        "removeListener" => {
            Ok(Op::RemoveListener { handle: handle_arg(args, 0)?, event: str_arg(args, 1)? })
        }
        "setRootView" => Ok(Op::SetRoot { handle: handle_arg(args, 0)? }),
        other => Err(format!("unknown op {other:?}")),
    }
}

/// Decode a whole wire batch, keeping per-element failures in their slots so
/// the caller can skip and log them without losing the surviving ops.
pub fn decode_batch(payload: &Value) -> Result<Vec<Result<Op, BridgeError>>, BridgeError> {
    let elements = payload.as_array().ok_or_else(|| BridgeError::MalformedOp {
        index: 0,
        reason: "batch payload must be a JSON array".into(),
    })?;
    Ok(elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            decode_op(element).map_err(|reason| BridgeError::MalformedOp { index, reason })
        })
        .collect())
}

/// Decode a wire batch from raw JSON text.
pub fn decode_batch_str(payload: &str) -> Result<Vec<Result<Op, BridgeError>>, BridgeError> {
    let value: Value = serde_json::from_str(payload).map_err(|err| BridgeError::MalformedOp {
        index: 0,
        reason: format!("invalid JSON: {err}"),
    })?;
    decode_batch(&value)
}

// ---------------------------------------------------------------------------
// Argument extraction
// ---------------------------------------------------------------------------

fn arg<'a>(args: &'a [Value], index: usize) -> Result<&'a Value, String> {
    args.get(index).ok_or_else(|| format!("missing arg {index}"))
}

fn handle_arg(args: &[Value], index: usize) -> Result<NodeHandle, String> {
    let value = arg(args, index)?;
    value
        .as_u64()
        .map(NodeHandle::new)
        .ok_or_else(|| format!("arg {index} must be an unsigned handle, got {value}"))
}

fn str_arg(args: &[Value], index: usize) -> Result<String, String> {
    let value = arg(args, index)?;
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| format!("arg {index} must be a string, got {value}"))
}

fn object_arg(args: &[Value], index: usize) -> Result<Map<String, Value>, String> {
    let value = arg(args, index)?;
    value
        .as_object()
        .cloned()
        .ok_or_else(|| format!("arg {index} must be an object, got {value}"))
}

// A missing or null anchor means append.
fn anchor_arg(args: &[Value], index: usize) -> Result<Option<NodeHandle>, String> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(|raw| Some(NodeHandle::new(raw)))
            .ok_or_else(|| format!("arg {index} must be a sibling handle, got {value}")),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
