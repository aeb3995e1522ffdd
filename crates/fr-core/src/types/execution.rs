//! Normalized execution (fill) events.
//!
//! Exchange payloads are loosely shaped; the exchange adapter maps them into
//! [`ExecutionEvent`] exactly once at ingestion so everything downstream works
//! with one strict struct.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Market segment an execution belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Spot,
    Linear,
    Inverse,
    Options,
    /// Anything else, kept verbatim (may be empty).
    Other(String),
}

impl Category {
    /// Parse a category tag, case-insensitively.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "spot" => Self::Spot,
            "linear" => Self::Linear,
            "inverse" => Self::Inverse,
            "option" => Self::Options,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    /// Wire value as the exchange REST API expects it.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Spot => "spot",
            Self::Linear => "linear",
            Self::Inverse => "inverse",
            Self::Options => "option",
            Self::Other(s) => s,
        }
    }

    /// `true` when the event carried no category at all.
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    /// Derivatives with a position (linear / inverse perpetuals and futures).
    pub fn has_positions(&self) -> bool {
        matches!(self, Self::Linear | Self::Inverse)
    }

    /// Human-readable market label.
    pub fn market_label(&self) -> &str {
        match self {
            Self::Spot => "Spot",
            Self::Linear => "Futures (Linear)",
            Self::Inverse => "Futures (Inverse)",
            Self::Options => "Options",
            Self::Other(s) if s.is_empty() => "Unknown",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Trade direction used for risk/reward. Anything not recognised as long is short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn from_exchange(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "buy" | "long" => Self::Long,
            _ => Self::Short,
        }
    }
}

// ---------------------------------------------------------------------------
// ExecutionEvent
// ---------------------------------------------------------------------------

/// Execution type the exchange uses for an ordinary fill.
pub const FILL_EXEC_TYPE: &str = "Trade";

/// A single fill, as delivered by the private execution stream.
///
/// Price/quantity fields stay as the exchange's decimal strings so the
/// message can show them verbatim when they do not parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEvent {
    pub category: Category,
    pub symbol: String,
    /// Raw side as sent (e.g. `"Buy"`).
    pub side: String,
    pub order_type: String,
    pub order_status: String,
    /// `None` when the payload carried no execution type.
    pub exec_type: Option<String>,
    /// Unique per fill.
    pub exec_id: String,
    /// Parent order; shared by all fills of that order. May be empty.
    pub order_id: String,
    pub exec_price: String,
    pub exec_qty: String,
    pub exec_value: String,
    pub exec_fee: String,
    pub fee_currency: String,
    /// Milliseconds since epoch; 0 when absent.
    pub exec_time_ms: i64,
    pub realized_pnl: Option<f64>,
    pub unrealized_pnl: Option<f64>,
}

impl ExecutionEvent {
    /// Fill-type executions only. A missing execution type is admitted.
    pub fn is_fill(&self) -> bool {
        self.exec_type.as_deref().is_none_or(|t| t == FILL_EXEC_TYPE)
    }

    pub fn direction(&self) -> Side {
        Side::from_exchange(&self.side)
    }
}
