use std::sync::Arc;

use sextant_indicators::{
    Atr, BollingerBands, BollingerParams, DepthBook, HeatmapParams, Indicator, Macd, MacdParams,
    NativeTaLibrary, OrderbookHeatmap, PeriodParams, VolumeProfile, VolumeProfileParams,
};
use sextant_types::{Candle, Trade, TradeSide};

const MINUTE: i64 = 60_000_000_000;

fn candles(count: usize) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            let close = 100.0 + 10.0 * (t * 0.7).sin() + t * 0.1;
            let timestamp_ns = i as i64 * MINUTE;
            let trades = vec![
                Trade::new(timestamp_ns, close - 0.5, 1.0 + t * 0.01, TradeSide::Buy),
                Trade::new(timestamp_ns + 1, close + 0.5, 2.0, TradeSide::Sell),
            ];
            let mut candle = Candle::from_trades(timestamp_ns, MINUTE, trades).unwrap();
            candle.close = close;
            candle.high = candle.high.max(close);
            candle.low = candle.low.min(close);
            candle
        })
        .collect()
}

/// Feeds `split` candles to `original`, restores a fresh instance from its
/// state and checks both produce the same values for the remaining candles.
fn assert_resumes_identically<I: Indicator>(
    mut original: I,
    mut fresh: I,
    feed: &[Candle],
    split: usize,
) {
    for candle in &feed[..split] {
        original.add_candle(candle).unwrap();
    }

    let state = original.serialize_state().unwrap();
    let encoded = serde_json::to_string(&state).unwrap();
    fresh
        .restore_state(serde_json::from_str(&encoded).unwrap())
        .unwrap();
    assert_eq!(fresh.is_ready(), original.is_ready());

    for candle in &feed[split..] {
        original.add_candle(candle).unwrap();
        fresh.add_candle(candle).unwrap();

        let expected = original.all_values();
        let actual = fresh.all_values();
        assert_eq!(expected.len(), actual.len());
        for (key, value) in &expected {
            assert_eq!(value.to_bits(), actual[key].to_bits(), "{key} diverged");
        }
    }
}

#[test]
fn test_volume_profile_resumes_identically() {
    let params = VolumeProfileParams {
        interval: 12,
        volume_rows: 6,
        value_area_percent: 68.0,
        use_trades: true,
    };
    let feed = candles(40);
    let original = VolumeProfile::new("vp", params).unwrap();
    let fresh = VolumeProfile::new("vp", params).unwrap();

    let mut reference = original.clone();
    assert_resumes_identically(original, fresh, &feed, 17);

    // the bars themselves match too
    let mut restored = VolumeProfile::new("vp", params).unwrap();
    for candle in &feed[..17] {
        reference.add_candle(candle).unwrap();
    }
    restored
        .restore_state(reference.serialize_state().unwrap())
        .unwrap();
    for candle in &feed[17..] {
        reference.add_candle(candle).unwrap();
        restored.add_candle(candle).unwrap();
        assert_eq!(restored.bars(), reference.bars());
        assert_eq!(restored.value_area(), reference.value_area());
    }
}

#[test]
fn test_heatmap_resumes_identically() {
    let params = HeatmapParams {
        interval: 4,
        price_step_bucket: 2.5,
        ..HeatmapParams::default()
    };
    let mut original = OrderbookHeatmap::new("depth", params).unwrap();
    let mut restored = OrderbookHeatmap::new("depth", params).unwrap();

    let mut book = DepthBook::new();
    for level in 1..=20 {
        let offset = f64::from(level);
        book.set_ask(100.0 + offset * 0.5, offset);
        book.set_bid(100.0 - offset * 0.5, 2.0 * offset);
    }

    let feed = candles(10);
    let mut now = 0;
    for (i, candle) in feed.iter().enumerate() {
        if i == 5 {
            restored
                .restore_state(original.serialize_state().unwrap())
                .unwrap();
        }
        for heatmap in [&mut original, &mut restored] {
            heatmap.sync(candle, 100.0 + (i % 3) as f64);
        }
        for _ in 0..3 {
            book.set_ask(101.0, 1.0 + (now / MINUTE) as f64);
            original.sample(Some(&book), now);
            if i >= 5 {
                restored.sample(Some(&book), now);
            }
            now += MINUTE;
        }
        original.add_candle(candle).unwrap();
        if i >= 5 {
            restored.add_candle(candle).unwrap();
            assert_eq!(restored.latest(), original.latest());
            assert_eq!(restored.all_values(), original.all_values());
        }
    }
    assert_eq!(original.history().len(), 4);
}

#[test]
fn test_thin_indicators_resume_identically() {
    let feed = candles(80);
    let library = Arc::new(NativeTaLibrary::new());

    assert_resumes_identically(
        Atr::new("atr", PeriodParams::new(5), library.clone()).unwrap(),
        Atr::new("atr", PeriodParams::new(5), library.clone()).unwrap(),
        &feed,
        20,
    );
    assert_resumes_identically(
        Macd::new("macd", MacdParams::default(), library.clone()).unwrap(),
        Macd::new("macd", MacdParams::default(), library.clone()).unwrap(),
        &feed,
        45,
    );
    assert_resumes_identically(
        BollingerBands::new("bb", BollingerParams::default(), library.clone()).unwrap(),
        BollingerBands::new("bb", BollingerParams::default(), library).unwrap(),
        &feed,
        30,
    );
}
