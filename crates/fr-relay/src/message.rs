//! Telegram text for one enriched execution.
//!
//! [`build_message`] is pure: same event + enrichment + offset, same text.
//! Line order is fixed; optional lines (PnL, SL/TP, R:R, RSI) are emitted
//! only when their value is present.

use fr_core::format::{DEFAULT_DECIMALS, calc_rr, escape_html, fmt_num, to_float};
use fr_core::time_util::format_local_time;
use fr_core::types::ExecutionEvent;

use crate::enrich::Enrichment;

/// Decimals for ratios and oscillator values.
const RATIO_DECIMALS: usize = 2;

pub fn build_message(ev: &ExecutionEvent, enrichment: &Enrichment, utc_offset_hours: i32) -> String {
    let num = |raw: &str| escape_html(&fmt_num(raw, DEFAULT_DECIMALS));
    let mut lines: Vec<String> = Vec::with_capacity(24);

    lines.push("🔔 <b>Order Execution</b>".into());
    lines.push(String::new());
    lines.push(format!("<b>Instrument:</b> {}", escape_html(&ev.symbol)));
    lines.push(format!("<b>Market:</b> {}", escape_html(ev.category.market_label())));
    lines.push(format!("<b>Side:</b> {}", escape_html(&ev.side)));
    lines.push(format!("<b>Order type:</b> {}", escape_html(&ev.order_type)));
    lines.push(format!("<b>Status:</b> {}", escape_html(&ev.order_status)));
    lines.push(String::new());

    lines.push(format!("<b>Fill price:</b> {}", num(&ev.exec_price)));
    lines.push(format!("<b>Quantity:</b> {}", num(&ev.exec_qty)));
    lines.push(format!("<b>Notional:</b> {}", num(&ev.exec_value)));
    lines.push(format!("<b>Fee:</b> {} {}", num(&ev.exec_fee), escape_html(&ev.fee_currency)));
    lines.push(String::new());

    let realized = ev.realized_pnl.or(enrichment.order.closed_pnl);
    let unrealized = enrichment.position.unrealised_pnl.or(ev.unrealized_pnl);
    if let Some(pnl) = realized {
        lines.push(format!("<b>Realized PnL:</b> {}", fmt_num(&pnl, DEFAULT_DECIMALS)));
    }
    if let Some(pnl) = unrealized {
        lines.push(format!("<b>Unrealized PnL:</b> {}", fmt_num(&pnl, DEFAULT_DECIMALS)));
    }

    let stop_loss = enrichment.order.stop_loss;
    let take_profit = enrichment.order.take_profit;
    if let Some(sl) = stop_loss {
        lines.push(format!("<b>Stop Loss:</b> {}", fmt_num(&sl, DEFAULT_DECIMALS)));
    }
    if let Some(tp) = take_profit {
        lines.push(format!("<b>Take Profit:</b> {}", fmt_num(&tp, DEFAULT_DECIMALS)));
    }
    let rr = match (to_float(&ev.exec_price), stop_loss, take_profit) {
        (Some(entry), Some(sl), Some(tp)) => calc_rr(ev.direction(), entry, sl, tp),
        _ => None,
    };
    if let Some(rr) = rr {
        lines.push(format!("<b>R:R:</b> {}", fmt_num(&rr, RATIO_DECIMALS)));
    }

    if let Some(rsi) = enrichment.momentum {
        lines.push(format!("<b>RSI (4H):</b> {}", fmt_num(&rsi, RATIO_DECIMALS)));
    }

    let (local, offset) = format_local_time(ev.exec_time_ms, utc_offset_hours);
    lines.push(String::new());
    lines.push(format!("<b>Time:</b> {local} ({offset})"));
    lines.push(format!("<b>Exec ID:</b> {}", escape_html(&ev.exec_id)));
    if !ev.order_id.is_empty() {
        lines.push(format!("<b>Order ID:</b> {}", escape_html(&ev.order_id)));
    }
    lines.push(String::new());
    lines.push(format!(
        "🔗 <a href='{}'>Bybit</a> | <a href='{}'>TradingView</a>",
        escape_html(&enrichment.exchange_link),
        escape_html(&enrichment.chart_link)
    ));

    lines.join("\n")
}
