use thiserror::Error;

/// Boxed error produced by user-supplied factories, constructors and hook callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),
    #[error("Hook error: {0}")]
    Hook(#[from] HookError),
    #[error("Component error: {0}")]
    Component(#[from] ComponentError),
}

/// 容器解析错误
#[derive(Debug, Error)]
pub enum ContainerError {
    /// 没有注册蓝图、蓝图为抽象类型或缺少构造函数
    #[error("Type '{id}' is not instantiable: {reason}")]
    NotInstantiable { id: String, reason: String },

    /// 构造依赖图中存在环
    #[error("Circular dependency detected: {}", .chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    /// 解析栈深度超过配置上限
    #[error("Resolution depth {depth} exceeded while resolving '{id}'")]
    DepthExceeded { id: String, depth: usize },

    /// 工厂或构造函数返回错误
    #[error("Failed to create '{id}': {source}")]
    CreationFailed {
        id: String,
        #[source]
        source: BoxError,
    },

    /// 实例类型与调用方期望不符
    #[error("Type mismatch for '{id}': expected {expected}, got {actual}")]
    TypeMismatch {
        id: String,
        expected: &'static str,
        actual: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum HookError {
    #[error("Callback for '{event}' (priority {priority}) failed: {source}")]
    CallbackFailed {
        event: String,
        priority: i32,
        #[source]
        source: BoxError,
    },
}

#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("Invalid component: {0}")]
    InvalidComponent(String),
    #[error("'{id}' is not a {expected}")]
    WrongKind { id: String, expected: &'static str },
    #[error("Component cycle detected: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
    #[error("Registration of '{id}' failed: {source}")]
    RegistrationFailed {
        id: String,
        #[source]
        source: BoxError,
    },
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error(transparent)]
    Hook(#[from] HookError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Invalid configuration value for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}
