use std::{env, sync::Arc, time::Duration};

use beacon_buffer::{CapacityHint, RecordBufferFactory};
use beacon_record::{GenericRecord, RecordSchema, Schema, Value};
use bytes::Buf;
use criterion::{BenchmarkId, Criterion, black_box};

/// 编码工厂基准：对比“提示已预热”与“从小提示冷启动”两种路径的成本。
///
/// # 设计背景（Why）
/// - 稳态下绝大多数编码应一次成功，基准需要确认此时成本接近一次直写；
/// - 冷启动路径包含多次溢出与重试，用于观察增长系数对首批记录的影响。
///
/// # 逻辑解析（How）
/// - `warm`：共享同一个已增长的提示，循环编码并读取全部字节；
/// - `cold`：每轮新建容量为 16 的提示，测量“溢出 -> 增长 -> 重试”的完整代价。
fn bench_encode(c: &mut Criterion) {
    let schema = Arc::new(Schema::Record(
        RecordSchema::new("bench_event")
            .field("party_id", Schema::String)
            .field("timestamp", Schema::Long)
            .field("payload", Schema::Bytes),
    ));

    let mut group = c.benchmark_group("record_buffer_encode");
    for payload in [64usize, 512, 4096] {
        let record = GenericRecord::new(
            Arc::clone(&schema),
            Value::Record(vec![
                Value::String("0:bench-party".into()),
                Value::Long(1_700_000_000_000),
                Value::Bytes(vec![0x42; payload]),
            ]),
        )
        .expect("基准记录必须合法");

        let warm_hint = CapacityHint::new(payload * 2);
        let warm = RecordBufferFactory::with_hint(&warm_hint);
        group.bench_with_input(BenchmarkId::new("warm", payload), &record, |b, record| {
            b.iter(|| {
                let buffer = warm.encode("bench", record).expect("编码应成功");
                let mut slice = buffer.slice();
                slice.advance(slice.remaining());
                black_box(buffer.size())
            });
        });

        group.bench_with_input(BenchmarkId::new("cold", payload), &record, |b, record| {
            b.iter(|| {
                let hint = CapacityHint::new(16);
                let (_, report) = RecordBufferFactory::with_hint(&hint)
                    .encode_with_report("bench", record)
                    .expect("编码应成功");
                black_box(report.attempts)
            });
        });
    }
    group.finish();
}

fn main() {
    let mut quick_mode = false;
    for arg in env::args().skip(1) {
        if arg == "--quick" {
            quick_mode = true;
        }
    }

    let mut criterion = Criterion::default();
    if quick_mode {
        criterion = criterion
            .sample_size(10)
            .warm_up_time(Duration::from_millis(100))
            .measurement_time(Duration::from_millis(250));
    }

    bench_encode(&mut criterion);
    criterion.final_summary();
}
