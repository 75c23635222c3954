// In: tests/common/mod.rs

//! Builders for synthetic quote files and message feeds.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use taq_stream::decoder::format_header;
use taq_stream::kernels::ascii_int;
use taq_stream::{RawRecordBatch, RecordLayout};

pub const FULL_WIDTH: usize = 98;

/// One quote as the tests describe it.
#[derive(Debug, Clone)]
pub struct Quote {
    pub hour: u64,
    pub minute: u64,
    pub msec: u64,
    pub symbol: String,
    pub bid_ticks: u64,
    pub ask_ticks: u64,
    pub bid_size: u64,
    pub ask_size: u64,
    pub seq: u64,
}

impl Quote {
    pub fn at(hour: u64, minute: u64, symbol: &str, seq: u64) -> Self {
        Self {
            hour,
            minute,
            msec: 0,
            symbol: symbol.to_string(),
            bid_ticks: 1_000_000,
            ask_ticks: 1_000_100,
            bid_size: 1,
            ask_size: 1,
            seq,
        }
    }

    /// Renders the quote as one full-width line.
    pub fn line(&self) -> Vec<u8> {
        let layout = Arc::new(RecordLayout::bbo(FULL_WIDTH, &[]).unwrap());
        let mut blank = vec![b' '; FULL_WIDTH - 2];
        blank.extend_from_slice(b"\r\n");
        let mut batch = RawRecordBatch::new(layout, blank).unwrap();

        for (name, width, value) in [
            ("hour", 2, self.hour),
            ("minute", 2, self.minute),
            ("msec", 5, self.msec),
            ("Bid_Price", 11, self.bid_ticks),
            ("Bid_Size", 7, self.bid_size),
            ("Ask_Price", 11, self.ask_ticks),
            ("Ask_Size", 7, self.ask_size),
            ("Sequence_Number", 16, self.seq),
        ] {
            let digits = ascii_int::format_padded(value, width).unwrap();
            batch.set_field(0, name, &digits).unwrap();
        }

        let mut symbol = self.symbol.clone().into_bytes();
        symbol.resize(6, b' ');
        batch.set_field(0, "Symbol_root", &symbol).unwrap();
        batch.set_field(0, "Exchange", b"T").unwrap();
        batch.into_bytes()
    }
}

/// A complete quote file: header plus one line per quote.
pub fn quote_file(date: NaiveDate, quotes: &[Quote]) -> Vec<u8> {
    let mut bytes = format_header(date, Some(quotes.len() as u64), FULL_WIDTH).unwrap();
    for quote in quotes {
        bytes.extend_from_slice(&quote.line());
    }
    bytes
}

/// `n` quotes cycling through a few symbols, in sequence order.
pub fn many_quotes(n: u64) -> Vec<Quote> {
    const SYMBOLS: [&str; 3] = ["AAPL", "IBM", "MSFT"];
    (0..n)
        .map(|i| {
            let mut q = Quote::at(9 + i / 3600 % 7, i / 60 % 60, SYMBOLS[(i / 10) as usize % 3], i + 1);
            q.msec = (i % 60) * 1000;
            q
        })
        .collect()
}

pub fn write_zip(path: &Path, member: &str, bytes: &[u8]) {
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    writer.start_file(member, options).unwrap();
    writer.write_all(bytes).unwrap();
    writer.finish().unwrap();
}

pub fn write_gzip(path: &Path, bytes: &[u8]) {
    let mut encoder = flate2::write::GzEncoder::new(File::create(path).unwrap(), flate2::Compression::fast());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap();
}

/// Frames `payload` with its big-endian `u16` length.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut out = (payload.len() as u16).to_be_bytes().to_vec();
    out.extend_from_slice(payload);
    out
}

/// An add-order payload for `stock` at `price_ticks`.
pub fn add_order(order_ref: u64, stock: &str, price_ticks: u32, timestamp_ns: u64) -> Vec<u8> {
    let mut p = vec![b'A'];
    p.extend_from_slice(&0u16.to_be_bytes());
    p.extend_from_slice(&0u16.to_be_bytes());
    p.extend_from_slice(&timestamp_ns.to_be_bytes()[2..]);
    p.extend_from_slice(&order_ref.to_be_bytes());
    p.push(b'S');
    p.extend_from_slice(&200u32.to_be_bytes());
    let mut name = stock.as_bytes().to_vec();
    name.resize(8, b' ');
    p.extend_from_slice(&name);
    p.extend_from_slice(&price_ticks.to_be_bytes());
    p
}

/// An order-delete payload.
pub fn order_delete(order_ref: u64, timestamp_ns: u64) -> Vec<u8> {
    let mut p = vec![b'D'];
    p.extend_from_slice(&0u16.to_be_bytes());
    p.extend_from_slice(&0u16.to_be_bytes());
    p.extend_from_slice(&timestamp_ns.to_be_bytes()[2..]);
    p.extend_from_slice(&order_ref.to_be_bytes());
    p
}
