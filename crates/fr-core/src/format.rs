//! Numeric parsing/formatting and risk/reward helpers for message text.

use crate::types::Side;

/// Default number of decimals for [`fmt_num`].
pub const DEFAULT_DECIMALS: usize = 6;

/// Something [`fmt_num`] can render: a number or the exchange's raw string.
pub trait NumLike {
    fn as_finite(&self) -> Option<f64>;
    fn raw(&self) -> String;
}

impl NumLike for f64 {
    fn as_finite(&self) -> Option<f64> {
        self.is_finite().then_some(*self)
    }

    fn raw(&self) -> String {
        self.to_string()
    }
}

impl NumLike for str {
    fn as_finite(&self) -> Option<f64> {
        self.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    fn raw(&self) -> String {
        self.to_string()
    }
}

impl NumLike for String {
    fn as_finite(&self) -> Option<f64> {
        self.as_str().as_finite()
    }

    fn raw(&self) -> String {
        self.clone()
    }
}

impl<T: NumLike + ?Sized> NumLike for &T {
    fn as_finite(&self) -> Option<f64> {
        (**self).as_finite()
    }

    fn raw(&self) -> String {
        (**self).raw()
    }
}

/// Format with `decimals` places, then strip trailing zeros and a trailing
/// point. Values that are not finite numbers are returned as-is.
///
/// `fmt_num(3.1, 6) == "3.1"`, `fmt_num("abc", 6) == "abc"`,
/// `fmt_num(f64::NAN, 6) == "NaN"`.
pub fn fmt_num<T: NumLike + ?Sized>(x: &T, decimals: usize) -> String {
    match x.as_finite() {
        Some(v) => {
            let s = format!("{v:.decimals$}");
            let s = if s.contains('.') { s.trim_end_matches('0').trim_end_matches('.') } else { &s };
            // "-0.0000001" at 6 places rounds to "-0"
            if s == "-0" { "0".to_string() } else { s.to_string() }
        }
        None => x.raw(),
    }
}

/// Lenient parse: `None` for empty, placeholder dash, unparsable or non-finite.
pub fn to_float(raw: &str) -> Option<f64> {
    match raw.trim() {
        "" | "—" | "-" => None,
        s => s.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

/// Reward / risk measured from `entry`.
///
/// Long: risk = entry − sl, reward = tp − entry. Short: risk = sl − entry,
/// reward = entry − tp. `None` if either distance is not strictly positive
/// (stops on the wrong side of entry are an inverted setup, not an error).
pub fn calc_rr(side: Side, entry: f64, stop_loss: f64, take_profit: f64) -> Option<f64> {
    let (risk, reward) = match side {
        Side::Long => (entry - stop_loss, take_profit - entry),
        Side::Short => (stop_loss - entry, entry - take_profit),
    };
    if risk <= 0.0 || reward <= 0.0 {
        return None;
    }
    Some(reward / risk)
}

/// Escape text for Telegram's HTML parse mode, including quotes so the
/// result is also safe inside an attribute value.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
