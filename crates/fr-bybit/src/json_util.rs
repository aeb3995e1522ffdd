//! JSON field helpers for Bybit payloads.
//!
//! Bybit encodes numbers as decimal strings and the execution payload has
//! been seen with both camelCase and snake_case keys, so lookups accept a
//! list of aliases and either JSON strings or numbers.

use serde_json::Value;

/// Parse a JSON value (string or number) as `f64`. Non-finite values are `None`.
#[inline]
pub fn parse_str_f64(v: Option<&Value>) -> Option<f64> {
    let v = v?;
    let parsed = if let Some(s) = v.as_str() {
        fast_float2::parse::<f64, _>(s.trim()).ok()
    } else {
        v.as_f64()
    };
    parsed.filter(|x| x.is_finite())
}

/// Parse a JSON value (string or number) as `i64`.
#[inline]
pub fn parse_str_i64(v: Option<&Value>) -> Option<i64> {
    let v = v?;
    if let Some(s) = v.as_str() { s.trim().parse().ok() } else { v.as_i64() }
}

/// First alias present and non-null.
pub fn field<'a>(v: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|k| v.get(*k).filter(|x| !x.is_null()))
}

/// First alias rendered as a string (numbers are stringified).
pub fn str_field(v: &Value, aliases: &[&str]) -> Option<String> {
    match field(v, aliases)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First alias as a finite `f64`. Empty strings are `None`.
pub fn f64_field(v: &Value, aliases: &[&str]) -> Option<f64> {
    parse_str_f64(field(v, aliases))
}

/// A price that the exchange reports as `"0"` or `""` when unset.
pub fn price_field(v: &Value, aliases: &[&str]) -> Option<f64> {
    f64_field(v, aliases).filter(|p| *p > 0.0)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn string_and_number_forms() {
        assert_eq!(parse_str_f64(Some(&json!("30000.5"))), Some(30000.5));
        assert_eq!(parse_str_f64(Some(&json!(1.25))), Some(1.25));
        assert_eq!(parse_str_f64(Some(&json!(""))), None);
        assert_eq!(parse_str_f64(Some(&json!("NaN"))), None);
        assert_eq!(parse_str_i64(Some(&json!("1700000000000"))), Some(1_700_000_000_000));
    }

    #[test]
    fn aliases_in_order() {
        let v = json!({"exec_id": "b", "execId": null});
        assert_eq!(str_field(&v, &["execId", "exec_id"]), Some("b".into()));
        let v = json!({"execTime": 1700000000000u64});
        assert_eq!(str_field(&v, &["execTime"]), Some("1700000000000".into()));
    }

    #[test]
    fn unset_prices() {
        let v = json!({"stopLoss": "0", "takeProfit": "", "price": "101.5"});
        assert_eq!(price_field(&v, &["stopLoss"]), None);
        assert_eq!(price_field(&v, &["takeProfit"]), None);
        assert_eq!(price_field(&v, &["price"]), Some(101.5));
    }
}
