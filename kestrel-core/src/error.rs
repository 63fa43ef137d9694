use std::path::PathBuf;
use thiserror::Error;

/// 容器错误
///
/// 绑定过程中的所有错误都只影响单个 Bean、字段或钩子，
/// 由调用方记录到 tracing 后继续执行，不会终止进程。
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Bean 名称清单中的类型在元数据中不存在
    #[error("Unknown bean type '{0}'")]
    UnknownBeanType(String),

    /// 同一类型上存在多个 #[inject] 构造函数
    #[error("[{bean}]: At most 1 constructor can be marked with #[inject]. Found [{count}].")]
    MultipleInjectConstructors { bean: String, count: usize },

    /// 既没有 #[inject] 构造函数，也没有无参构造函数
    #[error("Bean '{0}' has no #[inject] constructor and no no-argument constructor")]
    NoDefaultConstructor(String),

    /// 构造参数在解析结束时仍不可用
    #[error("Cannot instantiate bean '{bean}' because of unsatisfied dependencies: {}", missing.join(", "))]
    UnsatisfiedDependency { bean: String, missing: Vec<String> },

    /// 待解析 Bean 之间存在循环依赖
    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    /// 同一类型不能重复注册
    #[error("Bean '{0}' is already registered")]
    BeanAlreadyRegistered(String),

    /// 同一类型正在被构造
    #[error("Bean '{0}' is already being created")]
    AlreadyCreating(String),

    /// 构造函数返回错误或发生 panic
    #[error("Failed to create bean '{bean}': {source}")]
    BeanCreationFailed {
        bean: String,
        #[source]
        source: anyhow::Error,
    },

    /// 注册表中的实例无法转换为所需类型
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// 初始化钩子执行失败
    #[error("Hook '{hook}' on bean '{bean}' failed: {source}")]
    HookFailed {
        bean: String,
        hook: String,
        #[source]
        source: anyhow::Error,
    },

    /// Bean 名称清单无法读取
    #[error("Cannot read bean list file [{}]: {source}", path.display())]
    BeanListUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 日志初始化失败
    #[error("Failed to initialize logging: {0}")]
    LoggingInitFailed(String),
}

pub type ContainerResult<T> = Result<T, ContainerError>;
