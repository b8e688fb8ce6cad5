use criterion::{Criterion, SamplingMode, black_box, criterion_group, criterion_main};
use std::env;
use std::time::Duration;

use laxdata::options::StreamLimits;
use laxdata::stream::json::JsonStreamBatchCollector;
use laxdata::{RepairConfig, Schema, Value};

fn permissive_schema() -> Schema {
    Schema::new(Value::Object(Default::default()))
}

fn bench_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream");
    group.sampling_mode(SamplingMode::Flat);
    if let Some(ss) = env::var("LAXDATA_SAMPLE_SIZE").ok().and_then(|v| v.parse::<usize>().ok()) {
        group.sample_size(ss.max(10));
    } else {
        group.sample_size(10);
    }
    if let Some(meas) = env::var("LAXDATA_MEAS_SEC").ok().and_then(|v| v.parse::<u64>().ok()) {
        group.measurement_time(Duration::from_secs(meas));
    } else {
        group.measurement_time(Duration::from_secs(6));
    }
    if let Some(warm) = env::var("LAXDATA_WARMUP_SEC").ok().and_then(|v| v.parse::<u64>().ok()) {
        group.warm_up_time(Duration::from_secs(warm));
    } else {
        group.warm_up_time(Duration::from_secs(2));
    }

    group.bench_function("batch_collector_1000_objects", |b| {
        b.iter(|| {
            let mut collector =
                JsonStreamBatchCollector::new(permissive_schema(), RepairConfig::default(), StreamLimits::default());
            let mut total = 0usize;
            for i in 0..1000 {
                let chunk = if i % 2 == 0 { "{a:1} " } else { "{b:2} " };
                let outcome = collector.append(black_box(chunk));
                if let Some(items) = outcome.value {
                    total += items.len();
                }
                let polled = collector.poll();
                if let Some(items) = polled.value {
                    total += items.len();
                }
            }
            collector.close();
            let tail = collector.poll();
            if let Some(items) = tail.value {
                total += items.len();
            }
            black_box(total);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_stream);
criterion_main!(benches);
