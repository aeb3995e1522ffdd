//! Bybit JSON → typed conversions.
//!
//! REST responses share the envelope `{retCode, retMsg, result: {list: [...]}}`.
//! Execution pushes arrive as `{topic: "execution", data: [...]}` and are
//! normalized here, once, into [`ExecutionEvent`]s before the relay sees them.

use fr_core::error::{RelayError, RelayResult};
use fr_core::types::{Category, ExecutionEvent, Kline, OrderDetails, PositionDetails};
use serde_json::Value;
use tracing::debug;

use crate::json_util::{f64_field, field, parse_str_f64, parse_str_i64, price_field, str_field};

/// Topic name of the private execution stream.
pub const EXECUTION_TOPIC: &str = "execution";

// ---------------------------------------------------------------------------
// REST envelope
// ---------------------------------------------------------------------------

/// Check `retCode` and return `result.list` (empty if absent).
pub fn result_list(body: &Value) -> RelayResult<&[Value]> {
    let code = body
        .get("retCode")
        .and_then(Value::as_i64)
        .ok_or_else(|| RelayError::Parse("response without retCode".into()))?;
    if code != 0 {
        let msg = body.get("retMsg").and_then(Value::as_str).unwrap_or_default();
        return Err(RelayError::Api { code, msg: msg.to_string() });
    }
    Ok(body
        .get("result")
        .and_then(|r| r.get("list"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default())
}

/// One entry of `/v5/order/history`.
pub fn parse_order(v: &Value) -> OrderDetails {
    OrderDetails {
        order_id: str_field(v, &["orderId"]).unwrap_or_default(),
        order_status: str_field(v, &["orderStatus"]),
        stop_loss: price_field(v, &["stopLoss"]),
        take_profit: price_field(v, &["takeProfit"]),
        closed_pnl: f64_field(v, &["closedPnl", "realizedPnl"]),
    }
}

/// One entry of `/v5/position/list`.
pub fn parse_position(v: &Value) -> PositionDetails {
    PositionDetails {
        side: str_field(v, &["side"]).filter(|s| !s.is_empty()),
        size: f64_field(v, &["size"]),
        avg_price: price_field(v, &["avgPrice"]),
        unrealised_pnl: f64_field(v, &["unrealisedPnl"]),
        cum_realised_pnl: f64_field(v, &["cumRealisedPnl"]),
    }
}

/// One `/v5/market/kline` row: `[startTime, open, high, low, close, volume, turnover]`.
pub fn parse_kline_row(row: &Value) -> RelayResult<Kline> {
    let arr = row
        .as_array()
        .filter(|a| a.len() >= 5)
        .ok_or_else(|| RelayError::Parse(format!("malformed kline row: {row}")))?;
    let num = |i: usize| parse_str_f64(arr.get(i)).ok_or_else(|| RelayError::Parse(format!("kline column {i}: {row}")));
    Ok(Kline {
        start_ms: parse_str_i64(arr.first()).ok_or_else(|| RelayError::Parse(format!("kline start: {row}")))?,
        open: num(1)?,
        high: num(2)?,
        low: num(3)?,
        close: num(4)?,
    })
}

// ---------------------------------------------------------------------------
// Execution stream
// ---------------------------------------------------------------------------

/// Map one raw execution object into an [`ExecutionEvent`].
///
/// Returns `None` when the payload has no execution ID: without it the fill
/// cannot be deduplicated.
pub fn normalize_execution(v: &Value) -> Option<ExecutionEvent> {
    let exec_id = str_field(v, &["execId", "exec_id"]).filter(|s| !s.is_empty())?;
    let text = |aliases: &[&str]| str_field(v, aliases).unwrap_or_else(|| "—".to_string());

    Some(ExecutionEvent {
        category: Category::parse(&str_field(v, &["category", "categoryType"]).unwrap_or_default()),
        symbol: text(&["symbol"]),
        side: text(&["side"]),
        order_type: text(&["orderType", "order_type"]),
        order_status: text(&["orderStatus", "order_status"]),
        exec_type: str_field(v, &["execType", "exec_type"]).filter(|s| !s.is_empty()),
        exec_id,
        order_id: str_field(v, &["orderId", "order_id"]).unwrap_or_default(),
        exec_price: text(&["execPrice", "price"]),
        exec_qty: text(&["execQty", "qty"]),
        exec_value: text(&["execValue", "value"]),
        exec_fee: text(&["execFee"]),
        fee_currency: text(&["feeCurrency", "feeCoin"]),
        exec_time_ms: parse_str_i64(field(v, &["execTime", "ts"])).unwrap_or(0),
        realized_pnl: f64_field(v, &["execPnl", "closedPnl"]),
        unrealized_pnl: f64_field(v, &["unrealisedPnl", "unrealizedPnl"]),
    })
}

/// Normalize every entry of a push's `data` array, dropping unusable ones.
pub fn execution_batch(push: &Value) -> Vec<ExecutionEvent> {
    let Some(data) = push.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };
    data.iter()
        .filter_map(|raw| {
            let ev = normalize_execution(raw);
            if ev.is_none() {
                debug!("[bybit] dropping execution without execId: {raw}");
            }
            ev
        })
        .collect()
}

/// A decoded frame from the private stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// A push on the `execution` topic (the whole frame, with `data`).
    Execution(Value),
    /// Reply to an `auth` / `subscribe` / `ping` op.
    OpReply { op: String, success: bool, ret_msg: String },
    /// Anything else (other topics, unparsable text).
    Other,
}

pub fn classify_message(text: &str) -> StreamMessage {
    let Ok(v) = serde_json::from_str::<Value>(text) else {
        return StreamMessage::Other;
    };

    if let Some(topic) = v.get("topic").and_then(Value::as_str) {
        return if topic == EXECUTION_TOPIC || topic.starts_with("execution.") {
            StreamMessage::Execution(v)
        } else {
            StreamMessage::Other
        };
    }

    match v.get("op").and_then(Value::as_str) {
        Some(op) => StreamMessage::OpReply {
            op: op.to_string(),
            // Private-stream pongs carry no `success` field.
            success: v.get("success").and_then(Value::as_bool).unwrap_or(true),
            ret_msg: v.get("ret_msg").and_then(Value::as_str).unwrap_or_default().to_string(),
        },
        None => StreamMessage::Other,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn envelope_error_code() {
        let body = json!({"retCode": 10001, "retMsg": "params error", "result": {}});
        match result_list(&body) {
            Err(RelayError::Api { code, msg }) => {
                assert_eq!(code, 10001);
                assert_eq!(msg, "params error");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn envelope_without_list_is_empty() {
        let body = json!({"retCode": 0, "retMsg": "OK", "result": {}});
        assert!(result_list(&body).unwrap().is_empty());
        assert!(result_list(&json!({})).is_err());
    }

    #[test]
    fn order_with_unset_stops() {
        let o = parse_order(&json!({
            "orderId": "abc",
            "orderStatus": "Filled",
            "stopLoss": "0",
            "takeProfit": "",
        }));
        assert_eq!(o.order_id, "abc");
        assert_eq!(o.order_status.as_deref(), Some("Filled"));
        assert_eq!(o.stop_loss, None);
        assert_eq!(o.take_profit, None);
    }

    #[test]
    fn position_fields() {
        let p = parse_position(&json!({
            "side": "Buy", "size": "0.5", "avgPrice": "100", "unrealisedPnl": "-1.25", "cumRealisedPnl": "3"
        }));
        assert_eq!(p.size, Some(0.5));
        assert_eq!(p.unrealised_pnl, Some(-1.25));
        assert_eq!(p.side.as_deref(), Some("Buy"));
    }

    #[test]
    fn kline_rows() {
        let k = parse_kline_row(&json!(["1700000000000", "1", "2", "0.5", "1.5", "10", "15"])).unwrap();
        assert_eq!(k.start_ms, 1_700_000_000_000);
        assert_eq!(k.close, 1.5);
        assert!(parse_kline_row(&json!(["1700000000000", "1"])).is_err());
        assert!(parse_kline_row(&json!(["x", "1", "2", "3", "4"])).is_err());
    }

    #[test]
    fn normalize_camel_case_execution() {
        let raw = json!({
            "category": "linear",
            "symbol": "BTCUSDT",
            "side": "Buy",
            "orderType": "Limit",
            "orderStatus": "Filled",
            "execType": "Trade",
            "execId": "e-1",
            "orderId": "o-1",
            "execPrice": "100.50",
            "execQty": "0.01",
            "execValue": "1.005",
            "execFee": "0.0006",
            "feeCurrency": "USDT",
            "execTime": "1700000000000",
            "execPnl": "0.5"
        });
        let ev = normalize_execution(&raw).unwrap();
        assert_eq!(ev.category, Category::Linear);
        assert_eq!(ev.exec_id, "e-1");
        assert_eq!(ev.order_id, "o-1");
        assert_eq!(ev.exec_price, "100.50");
        assert_eq!(ev.exec_time_ms, 1_700_000_000_000);
        assert_eq!(ev.realized_pnl, Some(0.5));
        assert!(ev.is_fill());
    }

    #[test]
    fn normalize_snake_case_aliases() {
        let raw = json!({
            "categoryType": "spot",
            "exec_id": "e-2",
            "order_id": 123,
            "price": "5",
            "qty": "2",
            "feeCoin": "BTC",
            "ts": 42,
            "exec_type": "Funding"
        });
        let ev = normalize_execution(&raw).unwrap();
        assert_eq!(ev.category, Category::Spot);
        assert_eq!(ev.order_id, "123");
        assert_eq!(ev.exec_price, "5");
        assert_eq!(ev.fee_currency, "BTC");
        assert_eq!(ev.exec_time_ms, 42);
        assert_eq!(ev.symbol, "—");
        assert!(!ev.is_fill());
    }

    #[test]
    fn batch_drops_events_without_exec_id() {
        let push = json!({
            "topic": "execution",
            "data": [{"execId": "a"}, {"symbol": "X"}, {"execId": ""}, {"execId": "b"}]
        });
        let ids: Vec<_> = execution_batch(&push).into_iter().map(|e| e.exec_id).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(execution_batch(&json!({"topic": "execution"})).is_empty());
    }

    #[test]
    fn classify_frames() {
        assert!(matches!(
            classify_message(r#"{"topic":"execution","data":[]}"#),
            StreamMessage::Execution(_)
        ));
        assert_eq!(
            classify_message(r#"{"op":"auth","success":false,"ret_msg":"invalid sign"}"#),
            StreamMessage::OpReply { op: "auth".into(), success: false, ret_msg: "invalid sign".into() }
        );
        assert!(matches!(classify_message(r#"{"op":"pong"}"#), StreamMessage::OpReply { success: true, .. }));
        assert_eq!(classify_message(r#"{"topic":"order","data":[]}"#), StreamMessage::Other);
        assert_eq!(classify_message("not json"), StreamMessage::Other);
    }
}
