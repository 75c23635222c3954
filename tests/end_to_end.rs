// In: tests/end_to_end.rs

mod common;

use arrow::array::{Array, FixedSizeBinaryArray, Float64Array};
use arrow::record_batch::RecordBatch;
use chrono::{NaiveDate, TimeZone};
use chrono_tz::America::New_York;

use common::*;
use taq_stream::itch::BinaryMessage;
use taq_stream::{
    BatchStreamExt, ChunkedDecoder, DecoderConfig, DecoderState, FeedConfig, MessageDecoder,
    RawRecordBatch, TaqError, TransformContext,
};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 2).unwrap()
}

fn f64_column<'a>(batch: &'a RecordBatch, name: &str) -> &'a Float64Array {
    batch
        .column_by_name(name)
        .unwrap()
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap()
}

#[test]
fn test_zip_archive_single_quote() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("EQY_US_ALL_BBO_20150102.zip");
    write_zip(&path, "taqnbbo20150102", &quote_file(date(), &[Quote::at(9, 30, "AAPL", 1)]));

    let mut decoder = ChunkedDecoder::open(&path, DecoderConfig::default()).unwrap();
    assert_eq!(decoder.metadata().date, date());
    assert_eq!(decoder.metadata().declared_rows, Some(1));

    let batch = decoder.next_typed_batch().unwrap().unwrap();
    let midnight = New_York
        .from_local_datetime(&date().and_hms_opt(0, 0, 0).unwrap())
        .unwrap()
        .timestamp() as f64;
    assert_eq!(f64_column(&batch, "Time").value(0), midnight + 34_200.0);
    assert_eq!(f64_column(&batch, "Bid_Price").value(0), 100.0);
    assert_eq!(f64_column(&batch, "Ask_Price").value(0), 100.01);

    assert!(decoder.next_typed_batch().unwrap().is_none());
    assert_eq!(decoder.state(), DecoderState::Closed);
}

#[test]
fn test_gzip_rows_sum_to_file_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quotes.txt.gz");
    write_gzip(&path, &quote_file(date(), &many_quotes(2_500)));

    let decoder = ChunkedDecoder::open(&path, DecoderConfig::with_batch_size(1_000)).unwrap();
    let sizes: Vec<usize> = decoder
        .into_typed_batches()
        .map(|b| b.unwrap().num_rows())
        .collect();
    assert_eq!(sizes, vec![1_000, 1_000, 500]);
    assert_eq!(sizes.iter().sum::<usize>(), 2_500);
}

#[test]
fn test_time_is_non_decreasing_within_each_batch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quotes.txt.gz");
    // 600 quotes, one per second, spanning ten minutes.
    write_gzip(&path, &quote_file(date(), &many_quotes(600)));

    let decoder = ChunkedDecoder::open(&path, DecoderConfig::with_batch_size(128)).unwrap();
    let mut rows = 0;
    for batch in decoder.into_typed_batches() {
        let batch = batch.unwrap();
        rows += batch.num_rows();
        let times = f64_column(&batch, "Time").values();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }
    assert_eq!(rows, 600);
}

#[test]
fn test_symbol_runs_across_batch_boundaries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quotes.txt");
    std::fs::write(&path, quote_file(date(), &many_quotes(95))).unwrap();

    let decoder = ChunkedDecoder::open(&path, DecoderConfig::with_batch_size(25)).unwrap();
    let runs: Vec<RecordBatch> = decoder
        .into_typed_batches()
        .split_by_key(["Symbol_root"])
        .join_adjacent(["Symbol_root"])
        .map(|b| b.unwrap())
        .collect();

    // Symbols change every 10 quotes.
    let lens: Vec<usize> = runs.iter().map(|b| b.num_rows()).collect();
    assert_eq!(lens, [vec![10; 9], vec![5]].concat());
    for run in &runs {
        let symbols = run
            .column_by_name("Symbol_root")
            .unwrap()
            .as_any()
            .downcast_ref::<FixedSizeBinaryArray>()
            .unwrap();
        assert!((0..symbols.len()).all(|i| symbols.value(i) == symbols.value(0)));
    }
}

#[test]
fn test_anonymized_raw_batches_write_back_as_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    std::fs::write(&input, quote_file(date(), &many_quotes(40))).unwrap();

    let config = DecoderConfig {
        convert: false,
        ..DecoderConfig::with_batch_size(16)
    };
    let decoder = ChunkedDecoder::open(&input, config).unwrap();
    let mut output = decoder.metadata().header_line.clone();

    let anonymize = |mut batch: RawRecordBatch, ctx: &mut TransformContext| -> Result<RawRecordBatch, TaqError> {
        for row in 0..batch.num_rows() {
            let symbol = batch.field(row, "Symbol_root").unwrap_or_default().to_vec();
            let code = ctx.remap(&symbol, |n| format!("SYM{:03}", n).into_bytes()).to_vec();
            batch.set_field(row, "Symbol_root", &code)?;
        }
        Ok(batch)
    };
    let mut ctx = TransformContext::new();
    for batch in decoder.into_raw_batches().transform(anonymize, &mut ctx) {
        output.extend_from_slice(batch.unwrap().as_bytes());
    }
    assert_eq!(ctx.remapped_len(), 3);

    let rewritten = dir.path().join("out.txt");
    std::fs::write(&rewritten, &output).unwrap();
    let mut decoder = ChunkedDecoder::open(&rewritten, DecoderConfig::default()).unwrap();
    let batch = decoder.next_typed_batch().unwrap().unwrap();
    assert_eq!(batch.num_rows(), 40);
    let symbols = batch
        .column_by_name("Symbol_root")
        .unwrap()
        .as_any()
        .downcast_ref::<FixedSizeBinaryArray>()
        .unwrap();
    assert_eq!(symbols.value(0), b"SYM000");
    assert_eq!(symbols.value(39), b"SYM000");
    assert_eq!(symbols.value(10), b"SYM001");
}

#[test]
fn test_config_loaded_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("decoder.json");
    std::fs::write(
        &config_path,
        r#"{"batch_size_rows": 7, "computed_fields": [], "archive_format": "plain"}"#,
    )
    .unwrap();
    let config = DecoderConfig::from_json_file(&config_path).unwrap();

    let data_path = dir.path().join("quotes.bin");
    std::fs::write(&data_path, quote_file(date(), &many_quotes(10))).unwrap();
    let decoder = ChunkedDecoder::open(&data_path, config).unwrap();
    assert!(decoder.schema().field_with_name("Time").is_err());
    let sizes: Vec<usize> = decoder.map(|b| b.unwrap().num_rows()).collect();
    assert_eq!(sizes, vec![7, 3]);
}

#[test]
fn test_gzip_message_feed() {
    let mut bytes = frame(&add_order(7, "AAPL", 1_234_500, 34_200_000_000_000));
    bytes.extend(frame(b"\x00"));
    bytes.extend(frame(&order_delete(7, 34_200_000_000_500)));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("S010215-v50.txt.gz");
    write_gzip(&path, &bytes);

    let mut decoder = MessageDecoder::open(&path, FeedConfig::default()).unwrap();
    let messages: Vec<BinaryMessage> = decoder.by_ref().map(|m| m.unwrap()).collect();
    assert_eq!(messages.len(), 2);

    match &messages[0] {
        BinaryMessage::AddOrder(order) => {
            assert_eq!(order.header.timestamp_ns, 34_200_000_000_000);
            assert_eq!(order.stock.as_str(), "AAPL");
            assert_eq!(order.price.to_f64(), 123.45);
        }
        other => panic!("expected add order, got {:?}", other),
    }
    assert!(matches!(&messages[1], BinaryMessage::OrderDelete(d) if d.order_reference_number == 7));

    let stats = decoder.stats();
    assert_eq!((stats.frames, stats.messages, stats.skipped_unknown), (3, 2, 1));
}
