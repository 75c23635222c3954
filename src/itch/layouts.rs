//! The static tag → layout dispatch table and the per-tag body decoders.

use std::io::{Cursor, Read};

use super::message::*;
use crate::error::TaqError;
use crate::kernels::be_uint;

/// Bytes in the prefix shared by all messages: tag, locate, tracking, timestamp.
pub const HEADER_LEN: usize = 11;

type DecodeFn = fn(&mut FieldReader<'_>, MessageHeader) -> Result<BinaryMessage, TaqError>;

/// How to decode one message tag.
#[derive(Clone, Copy)]
pub struct MessageLayout {
    pub tag: u8,
    pub name: &'static str,
    /// Payload length in bytes, tag included.
    pub len: usize,
    decode: DecodeFn,
}

impl std::fmt::Debug for MessageLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageLayout")
            .field("tag", &(self.tag as char))
            .field("name", &self.name)
            .field("len", &self.len)
            .finish()
    }
}

impl MessageLayout {
    /// Decodes `payload`, which must be exactly `self.len` bytes.
    pub fn decode(&self, payload: &[u8]) -> Result<BinaryMessage, TaqError> {
        if payload.len() != self.len {
            return Err(TaqError::MalformedMessage {
                tag: self.tag as char,
                expected: self.len,
                actual: payload.len(),
            });
        }
        let mut reader = FieldReader::new(payload);
        let header = reader.header()?;
        let message = (self.decode)(&mut reader, header)?;
        if reader.position() != self.len {
            return Err(TaqError::MalformedMessage {
                tag: self.tag as char,
                expected: self.len,
                actual: reader.position(),
            });
        }
        Ok(message)
    }
}

pub static MESSAGE_LAYOUTS: &[MessageLayout] = &[
    MessageLayout { tag: b'S', name: "System Event", len: 12, decode: system_event },
    MessageLayout { tag: b'R', name: "Stock Directory", len: 39, decode: stock_directory },
    MessageLayout { tag: b'H', name: "Stock Trading Action", len: 25, decode: stock_trading_action },
    MessageLayout { tag: b'Y', name: "Reg SHO Restriction", len: 20, decode: reg_sho_restriction },
    MessageLayout { tag: b'L', name: "Market Participant Position", len: 26, decode: market_participant_position },
    MessageLayout { tag: b'V', name: "MWCB Decline Level", len: 35, decode: mwcb_decline_level },
    MessageLayout { tag: b'W', name: "MWCB Status", len: 12, decode: mwcb_status },
    MessageLayout { tag: b'K', name: "IPO Quoting Period Update", len: 28, decode: ipo_quoting_period },
    MessageLayout { tag: b'A', name: "Add Order", len: 36, decode: add_order },
    MessageLayout { tag: b'F', name: "Add Order with MPID", len: 40, decode: add_order_mpid },
    MessageLayout { tag: b'E', name: "Order Executed", len: 31, decode: order_executed },
    MessageLayout { tag: b'C', name: "Order Executed with Price", len: 36, decode: order_executed_with_price },
    MessageLayout { tag: b'X', name: "Order Cancel", len: 23, decode: order_cancel },
    MessageLayout { tag: b'D', name: "Order Delete", len: 19, decode: order_delete },
    MessageLayout { tag: b'U', name: "Order Replace", len: 35, decode: order_replace },
    MessageLayout { tag: b'P', name: "Trade", len: 44, decode: trade },
    MessageLayout { tag: b'Q', name: "Cross Trade", len: 40, decode: cross_trade },
    MessageLayout { tag: b'B', name: "Broken Trade", len: 19, decode: broken_trade },
    MessageLayout { tag: b'I', name: "NOII", len: 50, decode: noii },
];

/// Looks up the layout for a tag byte.
pub fn layout_for(tag: u8) -> Option<&'static MessageLayout> {
    MESSAGE_LAYOUTS.iter().find(|layout| layout.tag == tag)
}

//==================================================================================
// 1. Field Reader
//==================================================================================

/// Sequential big-endian reads over one payload.
pub struct FieldReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> FieldReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(payload),
        }
    }

    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    fn bytes<const N: usize>(&mut self) -> Result<[u8; N], TaqError> {
        let mut buf = [0u8; N];
        self.cursor.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn char(&mut self) -> Result<char, TaqError> {
        Ok(char::from(self.bytes::<1>()?[0]))
    }

    fn u16(&mut self) -> Result<u16, TaqError> {
        Ok(u16::from_be_bytes(self.bytes()?))
    }

    fn u32(&mut self) -> Result<u32, TaqError> {
        Ok(u32::from_be_bytes(self.bytes()?))
    }

    fn u64(&mut self) -> Result<u64, TaqError> {
        Ok(u64::from_be_bytes(self.bytes()?))
    }

    fn alpha<const N: usize>(&mut self) -> Result<Alpha<N>, TaqError> {
        Ok(Alpha(self.bytes()?))
    }

    fn price4(&mut self) -> Result<Price4, TaqError> {
        Ok(Price4(self.u32()?))
    }

    fn header(&mut self) -> Result<MessageHeader, TaqError> {
        Ok(MessageHeader {
            tag: self.char()?,
            stock_locate: self.u16()?,
            tracking_number: self.u16()?,
            timestamp_ns: be_uint::read_u48(self.bytes()?),
        })
    }
}

//==================================================================================
// 2. Body Decoders
//==================================================================================

fn system_event(r: &mut FieldReader<'_>, header: MessageHeader) -> Result<BinaryMessage, TaqError> {
    Ok(BinaryMessage::SystemEvent(SystemEvent {
        header,
        event_code: r.char()?,
    }))
}

fn stock_directory(r: &mut FieldReader<'_>, header: MessageHeader) -> Result<BinaryMessage, TaqError> {
    Ok(BinaryMessage::StockDirectory(StockDirectory {
        header,
        stock: r.alpha()?,
        market_category: r.char()?,
        financial_status: r.char()?,
        round_lot_size: r.u32()?,
        round_lots_only: r.char()?,
        issue_classification: r.char()?,
        issue_sub_type: r.alpha()?,
        authenticity: r.char()?,
        short_sale_threshold: r.char()?,
        ipo_flag: r.char()?,
        luld_reference_price_tier: r.char()?,
        etp_flag: r.char()?,
        etp_leverage_factor: r.u32()?,
        inverse_indicator: r.char()?,
    }))
}

fn stock_trading_action(r: &mut FieldReader<'_>, header: MessageHeader) -> Result<BinaryMessage, TaqError> {
    Ok(BinaryMessage::StockTradingAction(StockTradingAction {
        header,
        stock: r.alpha()?,
        trading_state: r.char()?,
        reserved: r.char()?,
        reason: r.alpha()?,
    }))
}

fn reg_sho_restriction(r: &mut FieldReader<'_>, header: MessageHeader) -> Result<BinaryMessage, TaqError> {
    Ok(BinaryMessage::RegShoRestriction(RegShoRestriction {
        header,
        stock: r.alpha()?,
        reg_sho_action: r.char()?,
    }))
}

fn market_participant_position(
    r: &mut FieldReader<'_>,
    header: MessageHeader,
) -> Result<BinaryMessage, TaqError> {
    Ok(BinaryMessage::MarketParticipantPosition(MarketParticipantPosition {
        header,
        mpid: r.alpha()?,
        stock: r.alpha()?,
        primary_market_maker: r.char()?,
        market_maker_mode: r.char()?,
        market_participant_state: r.char()?,
    }))
}

fn mwcb_decline_level(r: &mut FieldReader<'_>, header: MessageHeader) -> Result<BinaryMessage, TaqError> {
    Ok(BinaryMessage::MwcbDeclineLevel(MwcbDeclineLevel {
        header,
        level_1: r.u64()?,
        level_2: r.u64()?,
        level_3: r.u64()?,
    }))
}

fn mwcb_status(r: &mut FieldReader<'_>, header: MessageHeader) -> Result<BinaryMessage, TaqError> {
    Ok(BinaryMessage::MwcbStatus(MwcbStatus {
        header,
        breached_level: r.char()?,
    }))
}

fn ipo_quoting_period(r: &mut FieldReader<'_>, header: MessageHeader) -> Result<BinaryMessage, TaqError> {
    Ok(BinaryMessage::IpoQuotingPeriod(IpoQuotingPeriod {
        header,
        stock: r.alpha()?,
        release_time: r.u32()?,
        release_qualifier: r.char()?,
        ipo_price: r.price4()?,
    }))
}

fn add_order(r: &mut FieldReader<'_>, header: MessageHeader) -> Result<BinaryMessage, TaqError> {
    Ok(BinaryMessage::AddOrder(AddOrder {
        header,
        order_reference_number: r.u64()?,
        buy_sell_indicator: r.char()?,
        shares: r.u32()?,
        stock: r.alpha()?,
        price: r.price4()?,
    }))
}

fn add_order_mpid(r: &mut FieldReader<'_>, header: MessageHeader) -> Result<BinaryMessage, TaqError> {
    Ok(BinaryMessage::AddOrderMpid(AddOrderMpid {
        header,
        order_reference_number: r.u64()?,
        buy_sell_indicator: r.char()?,
        shares: r.u32()?,
        stock: r.alpha()?,
        price: r.price4()?,
        attribution: r.alpha()?,
    }))
}

fn order_executed(r: &mut FieldReader<'_>, header: MessageHeader) -> Result<BinaryMessage, TaqError> {
    Ok(BinaryMessage::OrderExecuted(OrderExecuted {
        header,
        order_reference_number: r.u64()?,
        executed_shares: r.u32()?,
        match_number: r.u64()?,
    }))
}

fn order_executed_with_price(
    r: &mut FieldReader<'_>,
    header: MessageHeader,
) -> Result<BinaryMessage, TaqError> {
    Ok(BinaryMessage::OrderExecutedWithPrice(OrderExecutedWithPrice {
        header,
        order_reference_number: r.u64()?,
        executed_shares: r.u32()?,
        match_number: r.u64()?,
        printable: r.char()?,
        execution_price: r.price4()?,
    }))
}

fn order_cancel(r: &mut FieldReader<'_>, header: MessageHeader) -> Result<BinaryMessage, TaqError> {
    Ok(BinaryMessage::OrderCancel(OrderCancel {
        header,
        order_reference_number: r.u64()?,
        cancelled_shares: r.u32()?,
    }))
}

fn order_delete(r: &mut FieldReader<'_>, header: MessageHeader) -> Result<BinaryMessage, TaqError> {
    Ok(BinaryMessage::OrderDelete(OrderDelete {
        header,
        order_reference_number: r.u64()?,
    }))
}

fn order_replace(r: &mut FieldReader<'_>, header: MessageHeader) -> Result<BinaryMessage, TaqError> {
    Ok(BinaryMessage::OrderReplace(OrderReplace {
        header,
        original_order_reference_number: r.u64()?,
        new_order_reference_number: r.u64()?,
        shares: r.u32()?,
        price: r.price4()?,
    }))
}

fn trade(r: &mut FieldReader<'_>, header: MessageHeader) -> Result<BinaryMessage, TaqError> {
    Ok(BinaryMessage::Trade(Trade {
        header,
        order_reference_number: r.u64()?,
        buy_sell_indicator: r.char()?,
        shares: r.u32()?,
        stock: r.alpha()?,
        price: r.price4()?,
        match_number: r.u64()?,
    }))
}

fn cross_trade(r: &mut FieldReader<'_>, header: MessageHeader) -> Result<BinaryMessage, TaqError> {
    Ok(BinaryMessage::CrossTrade(CrossTrade {
        header,
        shares: r.u64()?,
        stock: r.alpha()?,
        cross_price: r.price4()?,
        match_number: r.u64()?,
        cross_type: r.char()?,
    }))
}

fn broken_trade(r: &mut FieldReader<'_>, header: MessageHeader) -> Result<BinaryMessage, TaqError> {
    Ok(BinaryMessage::BrokenTrade(BrokenTrade {
        header,
        match_number: r.u64()?,
    }))
}

fn noii(r: &mut FieldReader<'_>, header: MessageHeader) -> Result<BinaryMessage, TaqError> {
    Ok(BinaryMessage::Noii(Noii {
        header,
        paired_shares: r.u64()?,
        imbalance_shares: r.u64()?,
        imbalance_direction: r.char()?,
        stock: r.alpha()?,
        far_price: r.price4()?,
        near_price: r.price4()?,
        current_reference_price: r.price4()?,
        cross_type: r.char()?,
        price_variation_indicator: r.char()?,
    }))
}
