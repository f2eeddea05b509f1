#![cfg(not(any(loom, spark_loom)))]

use std::sync::Arc;

use beacon_buffer::{CapacityHint, RecordBufferFactory, next_capacity};
use beacon_record::{GenericRecord, RecordSchema, Schema, Value};
use proptest::prelude::*;

fn blob_record(len: usize) -> GenericRecord {
    let schema = Arc::new(Schema::Record(
        RecordSchema::new("blob").field("payload", Schema::Bytes),
    ));
    GenericRecord::new(schema, Value::Record(vec![Value::Bytes(vec![0xa5; len])]))
        .expect("合法 Schema")
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    /// 任意提议序列（含过期观测值）下，提示都只增不减，且仅在观测值命中时变化。
    #[test]
    fn prop_hint_is_monotonic(
        initial in 0usize..4096,
        proposals in proptest::collection::vec(any::<bool>(), 1..64),
    ) {
        let hint = CapacityHint::new(initial);
        let mut last = hint.current();
        for use_current in proposals {
            let observed = if use_current { last } else { last / 2 };
            let committed = hint.propose_growth(observed);
            let now = hint.current();
            prop_assert!(now >= last);
            if committed {
                prop_assert_eq!(now, next_capacity(last));
            } else {
                prop_assert_eq!(now, last);
            }
            last = now;
        }
    }

    /// 无论初始提示多小，编码都会在有限次尝试后成功，且成功容量不小于编码长度。
    #[test]
    fn prop_any_record_eventually_fits(initial in 0usize..32, payload in 0usize..2048) {
        let hint = CapacityHint::new(initial);
        let factory = RecordBufferFactory::with_hint(&hint);
        let (buffer, report) = factory
            .encode_with_report("prop", &blob_record(payload))
            .expect("编码应成功");
        prop_assert_eq!(buffer.size(), report.encoded_len);
        prop_assert!(report.capacity >= buffer.size());
        prop_assert!(hint.current() >= buffer.size());
        prop_assert!(report.attempts >= 1);
    }

    #[test]
    fn prop_next_capacity_grows_strictly(observed in 0usize..(usize::MAX / 16)) {
        let next = next_capacity(observed);
        prop_assert!(next > observed);
        prop_assert!(next <= observed + observed / 10 + 1);
    }
}

#[test]
fn next_capacity_saturates_at_the_top() {
    assert_eq!(next_capacity(usize::MAX), usize::MAX);
}
