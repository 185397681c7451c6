mod common;

use bbl_digest::types::TimeAxis;
use bbl_digest::{digest_bytes, BlackboxDecoder, DigestConfig, DigestError, FrameSchema};
use common::{recording, LogBuilder, MARKER};

fn concat(parts: &[Vec<u8>]) -> Vec<u8> {
    parts.iter().flatten().copied().collect()
}

#[test]
fn test_longest_recording_wins_regardless_of_order() {
    let short = recording(2, "short");
    let long = recording(10, "long");

    for (data, long_index) in [
        (concat(&[short.clone(), long.clone()]), 1),
        (concat(&[long.clone(), short.clone()]), 0),
    ] {
        let digest = digest_bytes(&data, &BlackboxDecoder, &DigestConfig::default()).unwrap();
        let meta = &digest.document.meta;
        assert_eq!(meta.log_count, 2);
        assert_eq!(meta.log_index, long_index);
        assert_eq!(meta.craft, "long");
        assert_eq!(meta.duration_s, 10.0);
        assert_eq!(meta.total_frames, 10_000);
    }
}

#[test]
fn test_longest_recording_wins_even_when_smaller_in_bytes() {
    // 2 s at 8 kHz outweighs 10 s at 100 Hz on disk
    let mut dense = LogBuilder::new(125).craft("dense");
    dense.frames(1_000_000, 16_000);
    let dense = dense.build();
    let mut sparse = LogBuilder::new(10_000).craft("sparse");
    sparse.frames(1_000_000, 1_000);
    let sparse = sparse.build();
    assert!(dense.len() > sparse.len());

    for (data, sparse_index) in [
        (concat(&[dense.clone(), sparse.clone()]), 1),
        (concat(&[sparse.clone(), dense.clone()]), 0),
    ] {
        let digest = digest_bytes(&data, &BlackboxDecoder, &DigestConfig::default()).unwrap();
        let meta = &digest.document.meta;
        assert_eq!(meta.log_index, sparse_index);
        assert_eq!(meta.craft, "sparse");
        assert_eq!(meta.total_frames, 1_000);
    }
}

#[test]
fn test_legacy_mode_takes_first_recording() {
    let data = concat(&[recording(2, "short"), recording(10, "long")]);
    let digest = digest_bytes(&data, &BlackboxDecoder, &DigestConfig::legacy()).unwrap();
    let meta = &digest.document.meta;
    assert_eq!(meta.log_index, 0);
    assert_eq!(meta.craft, "short");
    assert_eq!(meta.segment_count, 1);
}

#[test]
fn test_undecodable_recording_is_skipped() {
    let broken = format!("{}\nH Data version:2\nH looptime:125\n", MARKER).into_bytes();
    let data = concat(&[broken, recording(3, "good")]);
    let digest = digest_bytes(&data, &BlackboxDecoder, &DigestConfig::default()).unwrap();
    assert_eq!(digest.document.meta.log_index, 1);
    assert_eq!(digest.document.meta.craft, "good");
}

#[test]
fn test_all_recordings_failing_reports_decode_error() {
    let broken = format!("{}\nH Data version:2\n", MARKER).into_bytes();
    let data = concat(&[broken.clone(), broken]);
    let err = digest_bytes(&data, &BlackboxDecoder, &DigestConfig::default()).unwrap_err();
    assert!(matches!(err, DigestError::Decode(_)));
    assert_eq!(err.kind(), "decode_failed");
    assert!(err.to_string().starts_with("Failed to decode BBL: "));
}

#[test]
fn test_longest_segment_by_duration_not_sample_count() {
    let mut builder = LogBuilder::new(1000);
    // 50 sparse samples over 0.49 s, then a 3.5 s gap, then 200 dense samples over 0.199 s
    builder.frames_spaced(1_000_000, 50, 10_000);
    builder.frames_spaced(5_000_000, 200, 1_000);
    let data = builder.build();

    let digest = digest_bytes(&data, &BlackboxDecoder, &DigestConfig::default()).unwrap();
    let meta = &digest.document.meta;
    assert_eq!(meta.segment_count, 2);
    assert_eq!(meta.segment_index, 0);
    assert_eq!(meta.total_frames, 50);
    assert_eq!(meta.duration_s, 0.5);
}

#[test]
fn test_segment_split_disabled_keeps_whole_recording() {
    let mut builder = LogBuilder::new(1000);
    builder.frames_spaced(1_000_000, 50, 10_000);
    builder.frames_spaced(5_000_000, 200, 1_000);
    let data = builder.build();

    let config = DigestConfig {
        split_segments: false,
        ..DigestConfig::default()
    };
    let digest = digest_bytes(&data, &BlackboxDecoder, &config).unwrap();
    assert_eq!(digest.document.meta.segment_count, 1);
    assert_eq!(digest.document.meta.total_frames, 250);
}

#[test]
fn test_highest_rate_that_fits() {
    let data = recording(10, "quad");
    let config = DigestConfig::default();
    let digest = digest_bytes(&data, &BlackboxDecoder, &config).unwrap();
    let meta = &digest.document.meta;

    assert_eq!(meta.original_rate_hz, 1000.0);
    assert_eq!(meta.sample_rate_hz, 100.0);
    assert_eq!(meta.effective_rate_hz, 100.0);
    assert_eq!(meta.points, 1000);
    assert!(!digest.used_fallback);
    assert!(digest.within_budget(config.max_chars));

    let frames = &digest.document.frames;
    assert!(matches!(frames.t, TimeAxis::Explicit(ref t) if t.len() == 1000 && t[1] - t[0] == 10));
    assert_eq!(frames.g.len(), 1000);
    assert_eq!(frames.m[0], [1200, 1210, 1190, 1205]);
    assert_eq!(frames.rc[0], vec![10, -20, 5, 1500]);
    assert_eq!(frames.v[0], 16.2);
    assert!(frames.sp.is_empty());
    assert!(frames.rpm.is_empty());
}

#[test]
fn test_budget_fallback_uses_delta_time() {
    let data = recording(10, "quad");
    let config = DigestConfig {
        max_chars: 5_000,
        ..DigestConfig::default()
    };
    let digest = digest_bytes(&data, &BlackboxDecoder, &config).unwrap();

    assert!(digest.used_fallback);
    assert!(!digest.within_budget(config.max_chars));
    assert_eq!(digest.document.meta.sample_rate_hz, 25.0);
    assert_eq!(digest.document.meta.points, 250);
    assert_eq!(
        digest.document.frames.t,
        TimeAxis::Delta { t0: 1000, dt: 40 }
    );
}

#[test]
fn test_native_rate_below_target_keeps_every_sample() {
    let mut builder = LogBuilder::new(10_000);
    builder.frames(1_000_000, 500);
    let data = builder.build();

    let digest = digest_bytes(&data, &BlackboxDecoder, &DigestConfig::default()).unwrap();
    let meta = &digest.document.meta;
    assert_eq!(meta.original_rate_hz, 100.0);
    assert_eq!(meta.points, 500);
    assert_eq!(meta.effective_rate_hz, 100.0);
}

#[test]
fn test_trimmed_schema() {
    let data = recording(3, "quad");
    let config = DigestConfig {
        frame_schema: FrameSchema::Trimmed,
        ..DigestConfig::default()
    };
    let digest = digest_bytes(&data, &BlackboxDecoder, &config).unwrap();
    assert_eq!(digest.document.frames.rc[0], vec![1500]);
}

#[test]
fn test_cli_sections_only_carry_known_settings() {
    let data = recording(3, "quad");
    let digest = digest_bytes(&data, &BlackboxDecoder, &DigestConfig::default()).unwrap();
    let cli = &digest.document.cli;

    assert!(cli.core.contains("set looptime = 1000"));
    assert!(cli.core.contains("set Craft name = quad"));
    assert_eq!(cli.filters, "set rollPID = 45,80,30");
    assert_eq!(cli.controls, "set rates = 70,70,65");
    assert!(!digest.json.contains("debug_mode"));
    assert!(!digest.json.contains("Field I"));
}

#[test]
fn test_unknown_event_does_not_lose_frames() {
    let mut builder = LogBuilder::new(1000);
    builder.frames(1_000_000, 100);
    builder.unknown_event();
    builder.frames(1_100_000, 100);
    let data = builder.build();

    let digest = digest_bytes(&data, &BlackboxDecoder, &DigestConfig::default()).unwrap();
    assert_eq!(digest.document.meta.total_frames, 200);
}

#[test]
fn test_stats_from_decoded_channels() {
    let data = recording(2, "quad");
    let digest = digest_bytes(&data, &BlackboxDecoder, &DigestConfig::default()).unwrap();
    let stats = &digest.document.stats;

    assert_eq!(stats.gyro_rms.r, 40.0);
    assert_eq!(stats.gyro_rms.p, 12.0);
    assert_eq!(stats.gyro_peak_hz.r, 500);
    assert_eq!(stats.motor_avg, [1200, 1210, 1190, 1205]);
    assert_eq!(stats.motor_max, [1200, 1210, 1190, 1205]);
    assert_eq!(stats.vbat, [16.2, 16.2]);
    assert_eq!(stats.amp, [0.0, 0.0]);
}

#[test]
fn test_concurrent_digests_are_independent() {
    let inputs = [recording(2, "alpha"), recording(4, "bravo"), recording(6, "charlie")];
    let config = DigestConfig::default();

    let sequential: Vec<String> = inputs
        .iter()
        .map(|data| digest_bytes(data, &BlackboxDecoder, &config).unwrap().json)
        .collect();

    let concurrent: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|data| {
                let config = &config;
                scope.spawn(move || digest_bytes(data, &BlackboxDecoder, config).unwrap().json)
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(sequential, concurrent);
}
