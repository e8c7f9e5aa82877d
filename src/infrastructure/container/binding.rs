//! 绑定表条目

use super::instance::Instance;
use super::Container;
use std::fmt;
use std::sync::Arc;

/// 工厂函数，调用时传入容器本身
pub type Factory = Arc<dyn Fn(&Container) -> anyhow::Result<Instance> + Send + Sync>;

/// 生产实例的来源
#[derive(Clone)]
pub enum Source {
    /// 具体类型标识，通过蓝图构造
    Concrete(String),
    Factory(Factory),
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Concrete(id) => f.debug_tuple("Concrete").field(id).finish(),
            Source::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// 服务生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// 每次解析创建新实例
    Transient,
    /// 每个容器每个标识只创建一次
    Singleton,
}

/// 抽象标识到生产方式的映射
#[derive(Debug, Clone)]
pub struct Binding {
    pub source: Source,
    pub lifetime: Lifetime,
}

impl Binding {
    pub fn transient(source: Source) -> Self {
        Self {
            source,
            lifetime: Lifetime::Transient,
        }
    }

    pub fn singleton(source: Source) -> Self {
        Self {
            source,
            lifetime: Lifetime::Singleton,
        }
    }

    /// 可调用的绑定由 `get` 直接执行，其余交给 `resolve`
    pub fn is_invocable(&self) -> bool {
        self.lifetime == Lifetime::Singleton || matches!(self.source, Source::Factory(_))
    }
}
