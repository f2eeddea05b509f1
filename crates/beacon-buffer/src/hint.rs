use std::sync::OnceLock;

// `loom` 运行时需要接管原子操作以枚举调度交错，模型检查配置下切换到它提供的原子类型。
#[cfg(not(any(loom, spark_loom)))]
use std::sync::atomic::{AtomicUsize, Ordering};
#[cfg(any(loom, spark_loom))]
use loom::sync::atomic::{AtomicUsize, Ordering};

/// 增长系数 11/10，即每次约增长 10%。
const GROWTH_NUMERATOR: usize = 11;
const GROWTH_DENOMINATOR: usize = 10;

static GLOBAL: OnceLock<CapacityHint> = OnceLock::new();

/// `CapacityHint` 保存“下一次编码应分配多大暂存区”的共享建议值。
///
/// # 设计动机（Why）
/// - 记录长度分布随流量变化，固定上限要么浪费、要么频繁失败；
///   以一个只增不减的共享值记录“迄今为止足够大的容量”，让后续编码几乎总能一次成功。
/// - 多个编码线程可能在同一容量下同时溢出，每个观测值只需要一次增长，
///   因此竞争失败的增长提议直接丢弃，而不是重试。
///
/// # 核心机制（How）
/// - 内部为单个 `AtomicUsize`；[`current`](Self::current) 只做一次读取；
/// - [`propose_growth`](Self::propose_growth) 以 `compare_exchange` 把 `observed` 替换为
///   [`next_capacity(observed)`](next_capacity)，仅当期间无人修改过该值时才生效；
/// - 值只会增长，不存在 ABA 问题：过期的观测值永远不可能再次与当前值相等。
///
/// # 契约说明（What）
/// - **单调性**：任何时刻读取到的值都不小于之前读取到的值；
/// - **无锁**：读取与增长都不会阻塞其它调用方；
/// - **生命周期**：进程级实例通过 [`global`](Self::global) 获取，初始值为
///   [`DEFAULT_CAPACITY`](Self::DEFAULT_CAPACITY)，进程结束前不会被重置。
///
/// # 风险与取舍（Trade-offs）
/// - 偶发的超大记录会把提示永久抬高，此后每次编码都按该容量分配；
///   这是“少重试”与“少占内存”之间的有意取舍。
#[derive(Debug)]
pub struct CapacityHint {
    size: AtomicUsize,
}

impl CapacityHint {
    /// 进程启动时的默认容量（字节）。
    pub const DEFAULT_CAPACITY: usize = 100;

    /// 创建独立的容量提示，便于测试或嵌入方隔离容量状态。
    pub fn new(initial: usize) -> Self {
        Self {
            size: AtomicUsize::new(initial),
        }
    }

    /// 返回进程级共享的容量提示。
    pub fn global() -> &'static CapacityHint {
        GLOBAL.get_or_init(CapacityHint::default)
    }

    /// 读取当前建议容量。
    pub fn current(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    /// 基于观测值提议一次增长。
    ///
    /// # 教案式说明
    /// - **意图 (Why)**：编码在容量 `observed` 下溢出后，需要让后续尝试（包括其它线程）使用更大的暂存区；
    /// - **执行 (How)**：计算 `next_capacity(observed)`，以 CAS 尝试把 `observed` 替换为新值；
    /// - **契约 (What)**：返回 `true` 表示本次提议被提交；返回 `false` 表示已有其它调用方先行修改，
    ///   调用方无需再做任何事，下一次 [`current`](Self::current) 必然读到更大的值。
    pub fn propose_growth(&self, observed: usize) -> bool {
        let next = next_capacity(observed);
        self.size
            .compare_exchange(observed, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for CapacityHint {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// 计算基于 `observed` 的下一档容量：`max(observed + 1, round(observed * 1.1))`。
///
/// - 四舍五入以整数运算 `(observed * 11 + 5) / 10` 完成，乘法饱和于 `usize::MAX`；
/// - `observed + 1` 的下限保证 0..=4 等小基数也能严格增长。
pub fn next_capacity(observed: usize) -> usize {
    let scaled = observed
        .saturating_mul(GROWTH_NUMERATOR)
        .saturating_add(GROWTH_DENOMINATOR / 2)
        / GROWTH_DENOMINATOR;
    scaled.max(observed.saturating_add(1))
}

#[cfg(all(test, not(any(loom, spark_loom))))]
mod tests {
    use super::*;

    #[test]
    fn growth_sequence_from_default_reaches_177_in_six_steps() {
        let steps: Vec<usize> =
            std::iter::successors(Some(CapacityHint::DEFAULT_CAPACITY), |size| {
                Some(next_capacity(*size))
            })
            .skip(1)
            .take(6)
            .collect();
        assert_eq!(steps, vec![110, 121, 133, 146, 161, 177]);
    }

    #[test]
    fn growth_is_strict_for_small_bases() {
        for observed in 0..=16 {
            assert!(next_capacity(observed) > observed, "基数 {observed} 必须严格增长");
        }
        assert_eq!(next_capacity(0), 1);
        assert_eq!(next_capacity(4), 5);
    }

    #[test]
    fn propose_growth_commits_once_per_observation() {
        let hint = CapacityHint::new(100);
        assert!(hint.propose_growth(100), "首次提议应提交");
        assert_eq!(hint.current(), 110);
        assert!(!hint.propose_growth(100), "过期观测值的提议应被丢弃");
        assert_eq!(hint.current(), 110, "丢弃的提议不得改变提示");
    }

    #[test]
    fn global_hint_is_a_single_instance() {
        let first = CapacityHint::global() as *const CapacityHint;
        let second = CapacityHint::global() as *const CapacityHint;
        assert_eq!(first, second);
        assert!(CapacityHint::global().current() >= CapacityHint::DEFAULT_CAPACITY);
    }
}
