//! Typed records of the tagged binary feed.
//!
//! Every message starts with the same 11-byte prefix (`MessageHeader`), followed by
//! a body whose layout is fixed per tag. Integers are big-endian and unsigned.
//! Text fields are left-aligned and space-padded (`Alpha<N>`), and most prices
//! carry four implied decimals (`Price4`).

use std::borrow::Cow;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::kernels::fixed_point;

//==================================================================================
// 1. Field Types
//==================================================================================

/// A fixed-width, space-padded ASCII field.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Alpha<const N: usize>(pub [u8; N]);

impl<const N: usize> Alpha<N> {
    /// The field with its trailing padding removed.
    pub fn trimmed(&self) -> &[u8] {
        let end = self.0.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
        &self.0[..end]
    }

    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.trimmed())
    }
}

impl<const N: usize> fmt::Debug for Alpha<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl<const N: usize> Serialize for Alpha<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_str())
    }
}

/// A price with four implied decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Price4(pub u32);

impl Price4 {
    pub fn to_f64(self) -> f64 {
        fixed_point::to_price(i64::from(self.0))
    }
}

impl Serialize for Price4 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

/// The prefix shared by every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageHeader {
    pub tag: char,
    pub stock_locate: u16,
    pub tracking_number: u16,
    /// Nanoseconds since midnight, from a 6-byte big-endian field.
    pub timestamp_ns: u64,
}

//==================================================================================
// 2. Message Bodies
//==================================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemEvent {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub event_code: char,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockDirectory {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub stock: Alpha<8>,
    pub market_category: char,
    pub financial_status: char,
    pub round_lot_size: u32,
    pub round_lots_only: char,
    pub issue_classification: char,
    pub issue_sub_type: Alpha<2>,
    pub authenticity: char,
    pub short_sale_threshold: char,
    pub ipo_flag: char,
    pub luld_reference_price_tier: char,
    pub etp_flag: char,
    pub etp_leverage_factor: u32,
    pub inverse_indicator: char,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockTradingAction {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub stock: Alpha<8>,
    pub trading_state: char,
    pub reserved: char,
    pub reason: Alpha<4>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegShoRestriction {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub stock: Alpha<8>,
    pub reg_sho_action: char,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketParticipantPosition {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub mpid: Alpha<4>,
    pub stock: Alpha<8>,
    pub primary_market_maker: char,
    pub market_maker_mode: char,
    pub market_participant_state: char,
}

/// Decline levels carry eight implied decimals and are kept as raw integers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MwcbDeclineLevel {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub level_1: u64,
    pub level_2: u64,
    pub level_3: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MwcbStatus {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub breached_level: char,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IpoQuotingPeriod {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub stock: Alpha<8>,
    pub release_time: u32,
    pub release_qualifier: char,
    pub ipo_price: Price4,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddOrder {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub order_reference_number: u64,
    pub buy_sell_indicator: char,
    pub shares: u32,
    pub stock: Alpha<8>,
    pub price: Price4,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddOrderMpid {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub order_reference_number: u64,
    pub buy_sell_indicator: char,
    pub shares: u32,
    pub stock: Alpha<8>,
    pub price: Price4,
    pub attribution: Alpha<4>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderExecuted {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub order_reference_number: u64,
    pub executed_shares: u32,
    pub match_number: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderExecutedWithPrice {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub order_reference_number: u64,
    pub executed_shares: u32,
    pub match_number: u64,
    pub printable: char,
    pub execution_price: Price4,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderCancel {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub order_reference_number: u64,
    pub cancelled_shares: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDelete {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub order_reference_number: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderReplace {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub original_order_reference_number: u64,
    pub new_order_reference_number: u64,
    pub shares: u32,
    pub price: Price4,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub order_reference_number: u64,
    pub buy_sell_indicator: char,
    pub shares: u32,
    pub stock: Alpha<8>,
    pub price: Price4,
    pub match_number: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTrade {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub shares: u64,
    pub stock: Alpha<8>,
    pub cross_price: Price4,
    pub match_number: u64,
    pub cross_type: char,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrokenTrade {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub match_number: u64,
}

/// Net order imbalance indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Noii {
    #[serde(flatten)]
    pub header: MessageHeader,
    pub paired_shares: u64,
    pub imbalance_shares: u64,
    pub imbalance_direction: char,
    pub stock: Alpha<8>,
    pub far_price: Price4,
    pub near_price: Price4,
    pub current_reference_price: Price4,
    pub cross_type: char,
    pub price_variation_indicator: char,
}

//==================================================================================
// 3. BinaryMessage
//==================================================================================

/// One decoded frame of the tagged feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum BinaryMessage {
    SystemEvent(SystemEvent),
    StockDirectory(StockDirectory),
    StockTradingAction(StockTradingAction),
    RegShoRestriction(RegShoRestriction),
    MarketParticipantPosition(MarketParticipantPosition),
    MwcbDeclineLevel(MwcbDeclineLevel),
    MwcbStatus(MwcbStatus),
    IpoQuotingPeriod(IpoQuotingPeriod),
    AddOrder(AddOrder),
    AddOrderMpid(AddOrderMpid),
    OrderExecuted(OrderExecuted),
    OrderExecutedWithPrice(OrderExecutedWithPrice),
    OrderCancel(OrderCancel),
    OrderDelete(OrderDelete),
    OrderReplace(OrderReplace),
    Trade(Trade),
    CrossTrade(CrossTrade),
    BrokenTrade(BrokenTrade),
    Noii(Noii),
    /// A frame whose tag has no layout, kept verbatim (tag byte included).
    Unrecognized { tag: u8, payload: Vec<u8> },
}

impl BinaryMessage {
    /// The tag byte that selected this message's layout.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Unrecognized { tag, .. } => *tag,
            other => other.header().map_or(0, |h| h.tag as u8),
        }
    }

    /// The common prefix, for every recognized message.
    pub fn header(&self) -> Option<&MessageHeader> {
        let header = match self {
            Self::SystemEvent(m) => &m.header,
            Self::StockDirectory(m) => &m.header,
            Self::StockTradingAction(m) => &m.header,
            Self::RegShoRestriction(m) => &m.header,
            Self::MarketParticipantPosition(m) => &m.header,
            Self::MwcbDeclineLevel(m) => &m.header,
            Self::MwcbStatus(m) => &m.header,
            Self::IpoQuotingPeriod(m) => &m.header,
            Self::AddOrder(m) => &m.header,
            Self::AddOrderMpid(m) => &m.header,
            Self::OrderExecuted(m) => &m.header,
            Self::OrderExecutedWithPrice(m) => &m.header,
            Self::OrderCancel(m) => &m.header,
            Self::OrderDelete(m) => &m.header,
            Self::OrderReplace(m) => &m.header,
            Self::Trade(m) => &m.header,
            Self::CrossTrade(m) => &m.header,
            Self::BrokenTrade(m) => &m.header,
            Self::Noii(m) => &m.header,
            Self::Unrecognized { .. } => return None,
        };
        Some(header)
    }

    /// Serializes the message as one JSON object.
    pub fn to_json(&self) -> Result<String, crate::error::TaqError> {
        Ok(serde_json::to_string(self)?)
    }
}
