//! 会话判定与身份编解码性能基准测试

use std::hint::black_box;

use chrono::{TimeDelta, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use visitrack::identity::{
    MAX_SESSION_HISTORY, SessionRecord, VisitorIdentity, decode_identity, encode_identity,
};
use visitrack::session::{DeviceType, UrlParams, decide};

fn sample_identity(sessions: usize) -> VisitorIdentity {
    let start = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();
    let mut identity = VisitorIdentity::with_id("6f1c3a52-8d0e-4b8b-9b1e-2f6f1a7c9d10");
    for i in 0..sessions {
        identity.push_session(SessionRecord {
            session_id: uuid::Uuid::new_v4().to_string(),
            last_activity: start + TimeDelta::hours(i as i64),
            utm_source: Some(format!("campaign_{}", i)),
        });
    }
    identity
}

// ============== Detector 基准测试 ==============

fn bench_decide(c: &mut Criterion) {
    let identity = sample_identity(MAX_SESSION_HISTORY);
    let last = identity.last_session().map(|s| s.last_activity).unwrap();

    let cases = [
        ("continue", last + TimeDelta::minutes(5), ""),
        ("idle_timeout", last + TimeDelta::hours(2), ""),
        ("campaign_change", last, "utm_source=newsletter"),
    ];

    let mut group = c.benchmark_group("detector/decide");
    for (name, now, query) in cases {
        let params = UrlParams::from_query(query, "ref");
        group.bench_function(name, |b| {
            b.iter(|| decide(black_box(Some(&identity)), None, now, black_box(&params), None))
        });
    }
    group.bench_function("first_visit", |b| {
        let params = UrlParams::default();
        b.iter(|| decide(None, None, last, black_box(&params), None))
    });
    group.finish();
}

fn bench_url_params(c: &mut Criterion) {
    let url = "https://shop.example.com/collections/eid?utm_source=facebook&utm_medium=cpc&utm_campaign=eid_sale&ref=ref42&fbclid=abc";
    c.bench_function("attribution/from_url", |b| {
        b.iter(|| UrlParams::from_url(black_box(url), "ref"))
    });

    let ua = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
    c.bench_function("device/classify", |b| {
        b.iter(|| DeviceType::classify(black_box(Some(ua))))
    });
}

// ============== Identity 编解码基准测试 ==============

fn bench_identity_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("identity/codec");

    for size in [0, 1, MAX_SESSION_HISTORY] {
        let identity = sample_identity(size);
        let encoded = encode_identity(&identity).unwrap();
        group.throughput(Throughput::Bytes(encoded.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", size), &identity, |b, identity| {
            b.iter(|| encode_identity(black_box(identity)))
        });
        group.bench_with_input(BenchmarkId::new("decode", size), &encoded, |b, encoded| {
            b.iter(|| decode_identity(black_box(encoded)))
        });
    }

    group.bench_function("decode_malformed", |b| {
        b.iter(|| decode_identity(black_box("%7Bnot-json")))
    });
    group.finish();
}

criterion_group!(benches, bench_decide, bench_url_params, bench_identity_codec);
criterion_main!(benches);
