use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use kestrel_core::prelude::*;
use kestrel_core_macros::{bean_methods, Bean, Injectable};

// ==================== 接口 ====================

pub trait GreetingStore: Send + Sync {
    fn template(&self, language: &str) -> Option<String>;
}

// ==================== Bean ====================

/// 时钟 - 无参构造，通过 Default 创建
#[derive(Bean, Default)]
#[bean(default)]
pub struct Clock {
    ticks: AtomicU64,
}

impl Clock {
    pub fn tick(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// 问候语仓库 - 以 GreetingStore 接口注册
#[derive(Bean)]
#[bean(implements(dyn GreetingStore))]
pub struct GreetingRepository {
    templates: Vec<(&'static str, &'static str)>,
}

#[bean_methods]
impl GreetingRepository {
    pub fn new() -> Self {
        Self {
            templates: vec![("en", "Hello, {}!"), ("fr", "Bonjour, {} !")],
        }
    }

    #[post_construct]
    fn report(&self) {
        tracing::info!("Loaded {} greeting template(s)", self.templates.len());
    }
}

impl GreetingStore for GreetingRepository {
    fn template(&self, language: &str) -> Option<String> {
        self.templates
            .iter()
            .find(|(lang, _)| *lang == language)
            .map(|(_, template)| template.to_string())
    }
}

/// 问候服务 - 构造函数注入仓库，字段注入时钟
#[derive(Bean)]
pub struct GreetingService {
    store: Arc<dyn GreetingStore>,

    #[inject]
    clock: Inject<Clock>,
}

#[bean_methods]
impl GreetingService {
    #[inject]
    pub fn new(store: Arc<dyn GreetingStore>) -> Self {
        Self {
            store,
            clock: Inject::new(),
        }
    }

    #[post_construct]
    fn check_clock(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.clock.is_set(), "clock was not injected");
        Ok(())
    }

    pub fn greet(&self, language: &str, name: &str) -> String {
        let tick = self.clock.get().map(|clock| clock.tick()).unwrap_or_default();
        let template = self
            .store
            .template(language)
            .unwrap_or_else(|| "Hi, {}.".to_string());
        format!("[{}] {}", tick, template.replace("{}", name))
    }
}

// ==================== 非托管对象 ====================

/// 控制台视图 - 不是 Bean，只通过入口函数注入字段
#[derive(Injectable, Default)]
pub struct ConsoleView {
    #[inject]
    service: Inject<GreetingService>,
}

impl ConsoleView {
    fn render(&self, language: &str, name: &str) {
        match self.service.get() {
            Some(service) => println!("{}", service.greet(language, name)),
            None => println!("(greeting service unavailable)"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let base = Path::new(env!("CARGO_MANIFEST_DIR"));

    let mut config = ContainerConfig::from_file(base.join("kestrel.toml"))?.with_env_overrides()?;
    if config.bean_list.is_relative() {
        config.bean_list = base.join(&config.bean_list);
    }

    let logging = config.logging_config().unwrap_or_else(LoggingConfig::from_env);
    let context = Binder::new(config).logging(logging).bind();

    println!("Registered beans:");
    for name in context.registry().bean_names() {
        println!("  - {}", name);
    }

    let view = ConsoleView::default();
    let summary = context.inject_fields(&view);
    println!(
        "ConsoleView: {} field(s) injected, {} skipped",
        summary.injected, summary.skipped
    );

    view.render("en", "Kestrel");
    view.render("fr", "Kestrel");
    view.render("de", "Kestrel");

    if let Some(store) = context.get::<dyn GreetingStore>() {
        println!("Interface lookup: {:?}", store.template("en"));
    }

    Ok(())
}
