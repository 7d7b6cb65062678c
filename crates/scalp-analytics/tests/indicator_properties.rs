//! 지표 엔진 시나리오 및 속성 테스트.

use proptest::prelude::*;
use scalp_analytics::{
    bollinger_bands, ema_value, macd, natr14, pivot_levels, rsi, sma, BollingerBandsParams,
    IndicatorError, MacdParams,
};

#[test]
fn test_pivot_scenario() {
    let p = pivot_levels(110.0, 90.0, 100.0);
    assert_eq!(
        (p.pivot, p.r1, p.s1, p.r2, p.s2),
        (100.0, 110.0, 90.0, 120.0, 80.0)
    );
}

#[test]
fn test_rsi_monotonic_series() {
    let up: Vec<f64> = (1..=50).map(|i| i as f64 * 1.5).collect();
    let down: Vec<f64> = up.iter().rev().copied().collect();

    assert_eq!(rsi(&up, 14).unwrap(), 100.0);
    assert_eq!(rsi(&down, 14).unwrap(), 0.0);
}

#[test]
fn test_bollinger_zero_multiplier_collapses_bands() {
    let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i % 7) as f64).collect();
    let bb = bollinger_bands(
        &closes,
        BollingerBandsParams {
            period: 20,
            std_mult: 0.0,
        },
    )
    .unwrap();

    assert!(bb.std_dev > 0.0);
    assert_eq!(bb.upper, bb.middle);
    assert_eq!(bb.lower, bb.middle);
}

#[test]
fn test_macd_rejects_fast_not_below_slow() {
    let closes: Vec<f64> = (0..100).map(|i| i as f64).collect();

    for (fast, slow) in [(26, 26), (30, 26)] {
        let result = macd(
            &closes,
            MacdParams {
                fast_period: fast,
                slow_period: slow,
                signal_period: 9,
            },
        );
        assert!(matches!(result, Err(IndicatorError::InvalidParameter(_))));
    }
}

#[test]
fn test_natr14_below_fifteen_bars_is_zero() {
    let highs = vec![105.0; 14];
    let lows = vec![95.0; 14];
    let closes = vec![100.0; 14];
    assert_eq!(natr14(&highs, &lows, &closes), 0.0);

    let highs = vec![105.0; 15];
    let lows = vec![95.0; 15];
    let closes = vec![100.0; 15];
    assert!(natr14(&highs, &lows, &closes) > 0.0);
}

#[test]
fn test_indicators_are_order_independent() {
    let closes: Vec<f64> = (0..80).map(|i| 50.0 + (i as f64 * 0.3).cos() * 4.0).collect();

    let first = (rsi(&closes, 14).unwrap(), ema_value(&closes, 21).unwrap());
    let _ = macd(&closes, MacdParams::default()).unwrap();
    let second = (rsi(&closes, 14).unwrap(), ema_value(&closes, 21).unwrap());

    assert_eq!(first, second);
}

proptest! {
    #[test]
    fn prop_sma_is_mean_of_tail(
        values in prop::collection::vec(-1.0e6f64..1.0e6, 1..200),
        period in 1usize..50,
    ) {
        if values.len() >= period {
            let tail = &values[values.len() - period..];
            let mut sum = 0.0;
            for v in tail {
                sum += v;
            }
            prop_assert_eq!(sma(&values, period).unwrap(), sum / period as f64);
        } else {
            prop_assert_eq!(
                sma(&values, period),
                Err(IndicatorError::InsufficientData { required: period, provided: values.len() })
            );
        }
    }

    #[test]
    fn prop_ema_constant_series_is_fixed_point(
        value in -1.0e4f64..1.0e4,
        len in 1usize..120,
        period in 1usize..40,
    ) {
        prop_assume!(len >= period);
        let series = vec![value; len];
        let ema = ema_value(&series, period).unwrap();
        prop_assert!((ema - value).abs() <= value.abs() * 1e-12);
    }
}
