//! 字段注入器

use std::ops::AddAssign;

use crate::inject::Injectable;
use crate::registry::BeanRegistry;

/// 一次注入的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InjectionSummary {
    /// 成功写入的字段
    pub injected: usize,

    /// 注册表中没有对应类型而保持原样的字段
    pub skipped: usize,

    /// 写入失败的字段
    pub failed: usize,
}

impl AddAssign for InjectionSummary {
    fn add_assign(&mut self, other: Self) {
        self.injected += other.injected;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// 按类型从注册表中填充 `#[inject]` 字段
pub struct Injector<'a> {
    registry: &'a BeanRegistry,
}

impl<'a> Injector<'a> {
    pub fn new(registry: &'a BeanRegistry) -> Self {
        Self { registry }
    }

    /// 注入单个对象
    ///
    /// 注册表中不存在的类型直接跳过，不视为错误。
    /// 也可用于不受容器管理的对象。
    pub fn inject(&self, target: &dyn Injectable) -> InjectionSummary {
        self.inject_into(target, "<unmanaged>")
    }

    /// 注入注册表中的所有 Bean，每个 Bean 只处理一次
    pub fn inject_all(&self) -> InjectionSummary {
        let mut summary = InjectionSummary::default();

        for bean in self.registry.beans() {
            match bean.descriptor().as_injectable(bean.instance()) {
                Some(target) => summary += self.inject_into(target.as_ref(), bean.name()),
                None => tracing::warn!(
                    "Bean '{}' does not match its descriptor, field injection skipped",
                    bean.name()
                ),
            }
        }

        tracing::info!(
            "Field injection completed: {} injected, {} skipped, {} failed",
            summary.injected,
            summary.skipped,
            summary.failed
        );
        summary
    }

    fn inject_into(&self, target: &dyn Injectable, owner: &str) -> InjectionSummary {
        let mut summary = InjectionSummary::default();

        for point in target.injection_points() {
            let Some(bean) = self.registry.get_ref(&point.key) else {
                tracing::trace!(
                    "No bean of type [{}] for field '{}' on '{}'",
                    point.key,
                    point.field,
                    owner
                );
                summary.skipped += 1;
                continue;
            };

            match point.slot.fill(&bean) {
                Ok(()) => {
                    tracing::debug!("Injected [{}] into '{}.{}'", point.key, owner, point.field);
                    summary.injected += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to inject field '{}.{}': {}", owner, point.field, e);
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::BeanDescriptor;
    use crate::inject::{Inject, InjectionPoint};
    use crate::key::BeanRef;
    use std::sync::Arc;

    struct Clock;
    struct Absent;

    impl Injectable for Clock {}

    #[derive(Default)]
    struct Scheduler {
        clock: Inject<Clock>,
        absent: Inject<Absent>,
        label: &'static str,
    }

    impl Injectable for Scheduler {
        fn injection_points(&self) -> Vec<InjectionPoint<'_>> {
            vec![
                InjectionPoint::new("clock", &self.clock),
                InjectionPoint::new("absent", &self.absent),
            ]
        }
    }

    fn descriptor<T: Injectable>(name: &str) -> Arc<BeanDescriptor> {
        Arc::new(BeanDescriptor::builder::<T>(name).build())
    }

    #[test]
    fn test_inject_sets_present_and_skips_absent() {
        let registry = BeanRegistry::new();
        let clock = Arc::new(Clock);
        registry
            .put(&descriptor::<Clock>("tests::Clock"), BeanRef::new(Arc::clone(&clock)))
            .unwrap();

        let scheduler = Scheduler::default();
        let summary = Injector::new(&registry).inject(&scheduler);

        assert_eq!(
            summary,
            InjectionSummary {
                injected: 1,
                skipped: 1,
                failed: 0
            }
        );
        assert!(Arc::ptr_eq(&scheduler.clock.get().unwrap(), &clock));
        assert!(!scheduler.absent.is_set());
        assert_eq!(scheduler.label, "");
    }

    #[test]
    fn test_inject_on_empty_registry_leaves_fields_unset() {
        let registry = BeanRegistry::new();
        let scheduler = Scheduler::default();

        let summary = Injector::new(&registry).inject(&scheduler);

        assert_eq!(summary.skipped, 2);
        assert!(!scheduler.clock.is_set());
    }

    #[test]
    fn test_mismatched_instance_counts_as_failure() {
        let registry = BeanRegistry::new();
        registry
            .put(&descriptor::<Clock>("tests::Clock"), BeanRef::new(Arc::new(5u32)))
            .unwrap();

        let scheduler = Scheduler::default();
        let summary = Injector::new(&registry).inject(&scheduler);

        assert_eq!(summary.failed, 1);
        assert!(!scheduler.clock.is_set());
    }

    #[test]
    fn test_inject_all_reaches_beans_registered_earlier() {
        let registry = BeanRegistry::new();
        let scheduler = Arc::new(Scheduler::default());

        registry
            .put(
                &descriptor::<Scheduler>("tests::Scheduler"),
                BeanRef::new(Arc::clone(&scheduler)),
            )
            .unwrap();
        registry
            .put(&descriptor::<Clock>("tests::Clock"), BeanRef::new(Arc::new(Clock)))
            .unwrap();

        let summary = Injector::new(&registry).inject_all();

        assert_eq!(summary.injected, 1);
        assert!(scheduler.clock.is_set());
    }
}
