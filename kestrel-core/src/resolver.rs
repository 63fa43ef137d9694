//! 依赖解析
//!
//! 两个阶段：
//!
//! 1. 按候选顺序逐个处理，构造参数都已注册的 Bean 立即实例化，其余暂缓；
//! 2. 对暂缓的 Bean 排序后各尝试一次，仍无法实例化的 Bean 被丢弃并报告。
//!
//! 默认的 [`ResolutionStrategy::Pairwise`] 只按直接依赖两两调整顺序，
//! 暂缓 Bean 之间超过两层的依赖链可能无法解析。
//! [`ResolutionStrategy::Topological`] 使用完整拓扑排序并报告循环依赖。

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::anyhow;

use crate::bean::{BeanDescriptor, ConstructorSpec};
use crate::config::ResolutionStrategy;
use crate::error::ContainerError;
use crate::key::{BeanRef, TypeKey};
use crate::registry::BeanRegistry;
use crate::utils::dependency::{pairwise_reorder, topological_order, CreationTracker};
use crate::utils::panic_message;

/// 解析结果
#[derive(Debug, Default)]
pub struct Resolution {
    /// 按构造顺序排列的已实例化 Bean
    pub constructed: Vec<String>,

    /// 被永久丢弃的 Bean
    pub unresolved: Vec<String>,

    /// 解析过程中报告的错误
    pub errors: Vec<ContainerError>,
}

impl Resolution {
    /// 所有候选都已实例化
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    fn drop_bean(&mut self, name: &str, error: ContainerError) {
        self.mark_unresolved(name);
        self.errors.push(error);
    }

    fn mark_unresolved(&mut self, name: &str) {
        if !self.unresolved.iter().any(|n| n == name) {
            self.unresolved.push(name.to_string());
        }
    }
}

/// 构造参数尚未全部就绪的 Bean
struct UnresolvedBean {
    descriptor: Arc<BeanDescriptor>,
    constructor: usize,
}

impl UnresolvedBean {
    fn name(&self) -> &str {
        self.descriptor.name()
    }

    fn constructor(&self) -> &ConstructorSpec {
        &self.descriptor.constructors()[self.constructor]
    }

    /// 构造函数是否直接依赖 `other`（具体类型或其接口）
    fn depends_on(&self, other: &UnresolvedBean) -> bool {
        self.constructor()
            .parameters()
            .iter()
            .any(|key| other.descriptor.provides(key))
    }

    fn missing(&self, registry: &BeanRegistry) -> Vec<TypeKey> {
        self.constructor()
            .parameters()
            .iter()
            .filter(|key| !registry.contains(key))
            .copied()
            .collect()
    }
}

/// 依赖解析器
///
/// 构造出的 Bean 写入给定的注册表。
pub struct DependencyResolver<'a> {
    registry: &'a BeanRegistry,
    strategy: ResolutionStrategy,
    tracker: CreationTracker,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(registry: &'a BeanRegistry, strategy: ResolutionStrategy) -> Self {
        Self {
            registry,
            strategy,
            tracker: CreationTracker::new(),
        }
    }

    pub fn strategy(&self) -> ResolutionStrategy {
        self.strategy
    }

    /// 解析并实例化候选 Bean
    pub fn resolve(&self, candidates: Vec<Arc<BeanDescriptor>>) -> Resolution {
        let mut resolution = Resolution::default();
        let mut seen = HashSet::new();
        let mut pending = Vec::new();

        tracing::debug!(
            "Resolving {} candidate bean(s) using {} ordering",
            candidates.len(),
            self.strategy
        );

        for descriptor in candidates {
            if !seen.insert(descriptor.key()) {
                tracing::warn!("Bean '{}' listed more than once, skipping", descriptor.name());
                continue;
            }

            let constructor = match descriptor.constructor_index() {
                Ok(index) => index,
                Err(e) => {
                    tracing::error!("{}", e);
                    resolution.drop_bean(descriptor.name(), e);
                    continue;
                }
            };

            let bean = UnresolvedBean {
                descriptor,
                constructor,
            };

            if bean.missing(self.registry).is_empty() {
                self.construct(&bean, &mut resolution);
            } else {
                tracing::debug!("Deferring bean '{}' until its dependencies exist", bean.name());
                pending.push(bean);
            }
        }

        if !pending.is_empty() {
            match self.strategy {
                ResolutionStrategy::Pairwise => self.resolve_pairwise(pending, &mut resolution),
                ResolutionStrategy::Topological => {
                    self.resolve_topological(pending, &mut resolution)
                }
            }
        }

        tracing::info!(
            "Resolved {} bean(s), {} unresolved",
            resolution.constructed.len(),
            resolution.unresolved.len()
        );
        resolution
    }

    fn resolve_pairwise(&self, pending: Vec<UnresolvedBean>, resolution: &mut Resolution) {
        let pending = pairwise_reorder(pending, |left, right| left.depends_on(right));

        for bean in &pending {
            self.attempt(bean, resolution);
        }
    }

    fn resolve_topological(&self, pending: Vec<UnresolvedBean>, resolution: &mut Resolution) {
        let dependencies: Vec<Vec<usize>> = pending
            .iter()
            .map(|bean| {
                (0..pending.len())
                    .filter(|&other| bean.depends_on(&pending[other]))
                    .collect()
            })
            .collect();

        let sorted = topological_order(&dependencies);

        let mut on_cycle = HashSet::new();
        for cycle in &sorted.cycles {
            let chain = cycle
                .iter()
                .map(|&index| pending[index].name())
                .collect::<Vec<_>>()
                .join(" -> ");
            tracing::warn!("Circular dependency detected: {}", chain);

            for &index in cycle {
                on_cycle.insert(index);
                resolution.mark_unresolved(pending[index].name());
            }
            resolution.errors.push(ContainerError::CircularDependency(chain));
        }

        for &index in &sorted.order {
            self.attempt(&pending[index], resolution);
        }

        // Blocked behind a cycle without being part of it
        for index in sorted.blocked {
            if !on_cycle.contains(&index) {
                self.report_unsatisfied(&pending[index], resolution);
            }
        }
    }

    /// 第二阶段的唯一一次尝试
    fn attempt(&self, bean: &UnresolvedBean, resolution: &mut Resolution) {
        if bean.missing(self.registry).is_empty() {
            self.construct(bean, resolution);
        } else {
            self.report_unsatisfied(bean, resolution);
        }
    }

    fn report_unsatisfied(&self, bean: &UnresolvedBean, resolution: &mut Resolution) {
        let missing: Vec<String> = bean
            .missing(self.registry)
            .iter()
            .map(|key| key.name().to_string())
            .collect();

        tracing::warn!(
            "Cannot instantiate [{}] bean because of unsatisfied dependencies: {}",
            bean.name(),
            missing.join(", ")
        );
        resolution.drop_bean(
            bean.name(),
            ContainerError::UnsatisfiedDependency {
                bean: bean.name().to_string(),
                missing,
            },
        );
    }

    fn construct(&self, bean: &UnresolvedBean, resolution: &mut Resolution) {
        let descriptor = &bean.descriptor;
        let name = descriptor.name();

        let Some(_guard) = self.tracker.start_creating(descriptor.key()) else {
            let error = ContainerError::AlreadyCreating(name.to_string());
            tracing::warn!("{}", error);
            resolution.drop_bean(name, error);
            return;
        };

        let constructor = bean.constructor();
        let args: Option<Vec<BeanRef>> = constructor
            .parameters()
            .iter()
            .map(|key| self.registry.get_ref(key))
            .collect();

        let Some(args) = args else {
            self.report_unsatisfied(bean, resolution);
            return;
        };

        tracing::debug!(
            "Creating bean '{}' with constructor '{}'",
            name,
            constructor.name()
        );

        let instance =
            match panic::catch_unwind(AssertUnwindSafe(|| constructor.invoke(&args))) {
                Ok(Ok(instance)) => instance,
                Ok(Err(source)) => {
                    self.report_creation_failure(name, source, resolution);
                    return;
                }
                Err(payload) => {
                    let source = anyhow!("constructor panicked: {}", panic_message(payload.as_ref()));
                    self.report_creation_failure(name, source, resolution);
                    return;
                }
            };

        match self.registry.put(descriptor, instance) {
            Ok(()) => resolution.constructed.push(name.to_string()),
            Err(e) => {
                tracing::warn!("{}", e);
                resolution.drop_bean(name, e);
            }
        }
    }

    fn report_creation_failure(&self, name: &str, source: anyhow::Error, resolution: &mut Resolution) {
        let error = ContainerError::BeanCreationFailed {
            bean: name.to_string(),
            source,
        };
        tracing::error!("{}", error);
        resolution.drop_bean(name, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::InterfaceBinding;
    use crate::inject::Injectable;

    struct A {
        b: Arc<B>,
    }
    struct B {
        c: Arc<C>,
    }
    struct C {
        d: Arc<D>,
    }
    struct D;

    impl Injectable for A {}
    impl Injectable for B {}
    impl Injectable for C {}
    impl Injectable for D {}

    fn a() -> Arc<BeanDescriptor> {
        Arc::new(
            BeanDescriptor::builder::<A>("tests::A")
                .constructor(ConstructorSpec::injected(
                    "new",
                    vec![TypeKey::of::<B>()],
                    |args| Ok(A { b: args.get::<B>(0)? }),
                ))
                .build(),
        )
    }

    fn b() -> Arc<BeanDescriptor> {
        Arc::new(
            BeanDescriptor::builder::<B>("tests::B")
                .constructor(ConstructorSpec::injected(
                    "new",
                    vec![TypeKey::of::<C>()],
                    |args| Ok(B { c: args.get::<C>(0)? }),
                ))
                .build(),
        )
    }

    fn c() -> Arc<BeanDescriptor> {
        Arc::new(
            BeanDescriptor::builder::<C>("tests::C")
                .constructor(ConstructorSpec::injected(
                    "new",
                    vec![TypeKey::of::<D>()],
                    |args| Ok(C { d: args.get::<D>(0)? }),
                ))
                .build(),
        )
    }

    fn d() -> Arc<BeanDescriptor> {
        Arc::new(
            BeanDescriptor::builder::<D>("tests::D")
                .constructor(ConstructorSpec::no_args("new", || Ok(D)))
                .build(),
        )
    }

    fn resolve(
        strategy: ResolutionStrategy,
        candidates: Vec<Arc<BeanDescriptor>>,
    ) -> (BeanRegistry, Resolution) {
        let registry = BeanRegistry::new();
        let resolution = DependencyResolver::new(&registry, strategy).resolve(candidates);
        (registry, resolution)
    }

    #[test]
    fn test_independent_beans_in_any_order() {
        struct X;
        struct Y;
        impl Injectable for X {}
        impl Injectable for Y {}

        let x = || {
            Arc::new(
                BeanDescriptor::builder::<X>("tests::X")
                    .constructor(ConstructorSpec::no_args("new", || Ok(X)))
                    .build(),
            )
        };
        let y = || {
            Arc::new(
                BeanDescriptor::builder::<Y>("tests::Y")
                    .constructor(ConstructorSpec::no_args("new", || Ok(Y)))
                    .build(),
            )
        };

        for candidates in [vec![x(), y(), d()], vec![d(), y(), x()]] {
            let (registry, resolution) = resolve(ResolutionStrategy::Pairwise, candidates);
            assert!(resolution.is_complete());
            assert_eq!(registry.len(), 3);
            assert!(registry.contains_type::<X>());
            assert!(registry.contains_type::<Y>());
            assert!(registry.contains_type::<D>());
        }
    }

    #[test]
    fn test_dependency_listed_after_dependent() {
        let (registry, resolution) = resolve(ResolutionStrategy::Pairwise, vec![c(), d()]);

        assert!(resolution.is_complete());
        assert_eq!(resolution.constructed, vec!["tests::D", "tests::C"]);

        let c = registry.get::<C>().unwrap();
        let d = registry.get::<D>().unwrap();
        assert!(Arc::ptr_eq(&c.d, &d));
    }

    #[test]
    fn test_three_level_chain_resolves_when_leaf_is_immediate() {
        // D has no parameters and is built during the first phase, leaving B
        // and C to the pairwise step.
        let (registry, resolution) = resolve(ResolutionStrategy::Pairwise, vec![b(), c(), d()]);

        assert!(resolution.is_complete());
        assert!(Arc::ptr_eq(
            &registry.get::<B>().unwrap().c,
            &registry.get::<C>().unwrap()
        ));
    }

    #[test]
    fn test_pairwise_drops_deep_pending_chain() {
        // Pending after the first phase: [A, B, C], reordered to [B, A, C].
        let (registry, resolution) =
            resolve(ResolutionStrategy::Pairwise, vec![a(), b(), c(), d()]);

        assert_eq!(resolution.constructed, vec!["tests::D", "tests::C"]);
        assert_eq!(resolution.unresolved, vec!["tests::B", "tests::A"]);
        assert!(resolution
            .errors
            .iter()
            .all(|e| matches!(e, ContainerError::UnsatisfiedDependency { .. })));
        assert!(!registry.contains_type::<A>());
        assert!(!registry.contains_type::<B>());
    }

    #[test]
    fn test_pairwise_orders_direct_edge_across_unrelated_bean() {
        struct Report {
            _source: Arc<Source>,
        }
        struct Source {
            _d: Arc<D>,
        }
        struct Mailer {
            _smtp: Arc<Smtp>,
        }
        struct Smtp;
        impl Injectable for Report {}
        impl Injectable for Source {}
        impl Injectable for Mailer {}
        impl Injectable for Smtp {}

        let report = Arc::new(
            BeanDescriptor::builder::<Report>("tests::Report")
                .constructor(ConstructorSpec::injected(
                    "new",
                    vec![TypeKey::of::<Source>()],
                    |args| Ok(Report { _source: args.get::<Source>(0)? }),
                ))
                .build(),
        );
        let mailer = Arc::new(
            BeanDescriptor::builder::<Mailer>("tests::Mailer")
                .constructor(ConstructorSpec::injected(
                    "new",
                    vec![TypeKey::of::<Smtp>()],
                    |args| Ok(Mailer { _smtp: args.get::<Smtp>(0)? }),
                ))
                .build(),
        );
        let source = Arc::new(
            BeanDescriptor::builder::<Source>("tests::Source")
                .constructor(ConstructorSpec::injected(
                    "new",
                    vec![TypeKey::of::<D>()],
                    |args| Ok(Source { _d: args.get::<D>(0)? }),
                ))
                .build(),
        );
        let smtp = Arc::new(
            BeanDescriptor::builder::<Smtp>("tests::Smtp")
                .constructor(ConstructorSpec::no_args("new", || Ok(Smtp)))
                .build(),
        );

        // Pending after the first phase: [Report, Mailer, Source].
        let (registry, resolution) = resolve(
            ResolutionStrategy::Pairwise,
            vec![report, mailer, source, smtp, d()],
        );

        assert!(resolution.is_complete());
        assert_eq!(
            resolution.constructed,
            vec![
                "tests::Smtp",
                "tests::D",
                "tests::Source",
                "tests::Report",
                "tests::Mailer"
            ]
        );
        assert!(registry.contains_type::<Report>());
    }

    #[test]
    fn test_topological_resolves_deep_chain() {
        let registry = BeanRegistry::new();
        let resolver = DependencyResolver::new(&registry, ResolutionStrategy::Topological);
        assert_eq!(resolver.strategy(), ResolutionStrategy::Topological);

        let resolution = resolver.resolve(vec![a(), b(), c(), d()]);

        assert!(resolution.is_complete());
        assert_eq!(
            resolution.constructed,
            vec!["tests::D", "tests::C", "tests::B", "tests::A"]
        );

        let a = registry.get::<A>().unwrap();
        assert!(Arc::ptr_eq(&a.b, &registry.get::<B>().unwrap()));
        assert!(Arc::ptr_eq(&a.b.c.d, &registry.get::<D>().unwrap()));
    }

    struct Ping {
        _pong: Arc<Pong>,
    }
    struct Pong {
        _ping: Arc<Ping>,
    }
    impl Injectable for Ping {}
    impl Injectable for Pong {}

    fn cycle() -> Vec<Arc<BeanDescriptor>> {
        vec![
            Arc::new(
                BeanDescriptor::builder::<Ping>("tests::Ping")
                    .constructor(ConstructorSpec::injected(
                        "new",
                        vec![TypeKey::of::<Pong>()],
                        |args| Ok(Ping { _pong: args.get::<Pong>(0)? }),
                    ))
                    .build(),
            ),
            Arc::new(
                BeanDescriptor::builder::<Pong>("tests::Pong")
                    .constructor(ConstructorSpec::injected(
                        "new",
                        vec![TypeKey::of::<Ping>()],
                        |args| Ok(Pong { _ping: args.get::<Ping>(0)? }),
                    ))
                    .build(),
            ),
        ]
    }

    #[test]
    fn test_topological_reports_cycle() {
        let mut candidates = cycle();
        candidates.push(d());

        let (registry, resolution) = resolve(ResolutionStrategy::Topological, candidates);

        assert_eq!(resolution.constructed, vec!["tests::D"]);
        assert_eq!(resolution.unresolved, vec!["tests::Ping", "tests::Pong"]);
        assert!(matches!(
            resolution.errors.as_slice(),
            [ContainerError::CircularDependency(chain)] if chain == "tests::Ping -> tests::Pong -> tests::Ping"
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_pairwise_drops_cycle_without_detecting_it() {
        let (_, resolution) = resolve(ResolutionStrategy::Pairwise, cycle());

        assert_eq!(resolution.unresolved.len(), 2);
        assert!(resolution
            .errors
            .iter()
            .all(|e| matches!(e, ContainerError::UnsatisfiedDependency { .. })));
    }

    #[test]
    fn test_missing_dependency_is_reported() {
        let (_, resolution) = resolve(ResolutionStrategy::Pairwise, vec![c()]);

        assert_eq!(resolution.unresolved, vec!["tests::C"]);
        match &resolution.errors[0] {
            ContainerError::UnsatisfiedDependency { bean, missing } => {
                assert_eq!(bean, "tests::C");
                assert_eq!(missing, &vec![std::any::type_name::<D>().to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_multiple_inject_constructors_isolated() {
        struct Ambiguous;
        impl Injectable for Ambiguous {}

        let ambiguous = Arc::new(
            BeanDescriptor::builder::<Ambiguous>("tests::Ambiguous")
                .constructor(ConstructorSpec::injected("first", vec![], |_| Ok(Ambiguous)))
                .constructor(ConstructorSpec::injected("second", vec![], |_| Ok(Ambiguous)))
                .build(),
        );

        let (registry, resolution) =
            resolve(ResolutionStrategy::Pairwise, vec![ambiguous, c(), d()]);

        assert_eq!(resolution.unresolved, vec!["tests::Ambiguous"]);
        assert!(matches!(
            resolution.errors[0],
            ContainerError::MultipleInjectConstructors { count: 2, .. }
        ));
        assert!(!registry.contains_type::<Ambiguous>());
        assert!(registry.contains_type::<C>());
        assert!(registry.contains_type::<D>());
    }

    #[test]
    fn test_failing_constructors_are_isolated() {
        struct Faulty;
        struct Panicky;
        impl Injectable for Faulty {}
        impl Injectable for Panicky {}

        let faulty = Arc::new(
            BeanDescriptor::builder::<Faulty>("tests::Faulty")
                .constructor(ConstructorSpec::no_args("new", || -> anyhow::Result<Faulty> {
                    Err(anyhow!("database unreachable"))
                }))
                .build(),
        );
        let panicky = Arc::new(
            BeanDescriptor::builder::<Panicky>("tests::Panicky")
                .constructor(ConstructorSpec::no_args("new", || -> anyhow::Result<Panicky> {
                    panic!("constructor blew up")
                }))
                .build(),
        );

        let (registry, resolution) =
            resolve(ResolutionStrategy::Pairwise, vec![faulty, panicky, d()]);

        assert_eq!(resolution.constructed, vec!["tests::D"]);
        assert_eq!(resolution.unresolved, vec!["tests::Faulty", "tests::Panicky"]);
        assert!(resolution.errors.iter().all(|e| matches!(
            e,
            ContainerError::BeanCreationFailed { .. }
        )));
        assert!(resolution.errors[1].to_string().contains("constructor blew up"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_candidate_constructed_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        static CREATED: AtomicUsize = AtomicUsize::new(0);

        struct Counted;
        impl Injectable for Counted {}

        let counted = Arc::new(
            BeanDescriptor::builder::<Counted>("tests::Counted")
                .constructor(ConstructorSpec::no_args("new", || {
                    CREATED.fetch_add(1, Ordering::SeqCst);
                    Ok(Counted)
                }))
                .build(),
        );

        let (registry, resolution) = resolve(
            ResolutionStrategy::Pairwise,
            vec![Arc::clone(&counted), counted],
        );

        assert!(resolution.is_complete());
        assert_eq!(CREATED.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    trait Store: Send + Sync {
        fn kind(&self) -> &'static str;
    }

    struct MemoryStore {
        _d: Arc<D>,
    }
    struct Service {
        store: Arc<dyn Store>,
    }

    impl Store for MemoryStore {
        fn kind(&self) -> &'static str {
            "memory"
        }
    }
    impl Injectable for MemoryStore {}
    impl Injectable for Service {}

    #[test]
    fn test_interface_parameter_orders_implementor_first() {
        // Both pending after the first phase; Service only reaches MemoryStore
        // through `dyn Store`.
        let service = Arc::new(
            BeanDescriptor::builder::<Service>("tests::Service")
                .constructor(ConstructorSpec::injected(
                    "new",
                    vec![TypeKey::of::<dyn Store>()],
                    |args| Ok(Service { store: args.get::<dyn Store>(0)? }),
                ))
                .build(),
        );
        let store = Arc::new(
            BeanDescriptor::builder::<MemoryStore>("tests::MemoryStore")
                .constructor(ConstructorSpec::injected(
                    "new",
                    vec![TypeKey::of::<D>()],
                    |args| Ok(MemoryStore { _d: args.get::<D>(0)? }),
                ))
                .interface(InterfaceBinding::new::<MemoryStore, dyn Store>(
                    |s: Arc<MemoryStore>| -> Arc<dyn Store> { s },
                ))
                .build(),
        );

        let (registry, resolution) =
            resolve(ResolutionStrategy::Pairwise, vec![service, store, d()]);

        assert!(resolution.is_complete());
        assert_eq!(registry.get::<Service>().unwrap().store.kind(), "memory");
    }
}
