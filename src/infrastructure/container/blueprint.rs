//! 构造蓝图：替代运行时反射的显式类型描述
//!
//! 每个可构造类型声明自己的标识、构造参数（按声明顺序）以及接收位置参数的构造函数。

use super::instance::{Arguments, Instance};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 构造函数：接收组装好的参数，返回实例
pub type Constructor = Arc<dyn Fn(&Arguments) -> anyhow::Result<Instance> + Send + Sync>;

/// 基础类型种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Bool,
    Int,
    Float,
    String,
    Array,
}

/// 参数的声明类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// 类类型，按标识递归解析
    Class(String),
    Builtin(Builtin),
    /// 未声明类型
    Untyped,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub ty: ParamType,
    pub default: Option<Value>,
}

impl Parameter {
    pub fn is_class(&self) -> bool {
        matches!(self.ty, ParamType::Class(_))
    }
}

/// 类型的构造描述
#[derive(Clone)]
pub struct Blueprint {
    id: String,
    instantiable: bool,
    params: Vec<Parameter>,
    constructor: Option<Constructor>,
}

impl Blueprint {
    /// 可实例化的类型
    pub fn class(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            instantiable: true,
            params: Vec::new(),
            constructor: None,
        }
    }

    /// 抽象类型或接口：只能通过绑定解析，不能直接构造
    pub fn abstract_type(id: impl Into<String>) -> Self {
        Self {
            instantiable: false,
            ..Self::class(id)
        }
    }

    /// 类类型依赖
    pub fn depends_on(mut self, name: impl Into<String>, class_id: impl Into<String>) -> Self {
        self.params.push(Parameter {
            name: name.into(),
            ty: ParamType::Class(class_id.into()),
            default: None,
        });
        self
    }

    /// 基础类型参数，可带默认值
    pub fn param(mut self, name: impl Into<String>, kind: Builtin, default: Option<Value>) -> Self {
        self.params.push(Parameter {
            name: name.into(),
            ty: ParamType::Builtin(kind),
            default,
        });
        self
    }

    pub fn untyped(mut self, name: impl Into<String>, default: Option<Value>) -> Self {
        self.params.push(Parameter {
            name: name.into(),
            ty: ParamType::Untyped,
            default,
        });
        self
    }

    /// 设置构造函数，返回值以本蓝图标识包装为 [`Instance`]
    pub fn construct<T, F>(mut self, constructor: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Arguments) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let id: Arc<str> = Arc::from(self.id.as_str());
        self.constructor = Some(Arc::new(move |args: &Arguments| {
            Ok(Instance::new(id.clone(), constructor(args)?))
        }));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_abstract(&self) -> bool {
        !self.instantiable
    }

    pub fn is_instantiable(&self) -> bool {
        self.instantiable && self.constructor.is_some()
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub(crate) fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }
}

impl fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blueprint")
            .field("id", &self.id)
            .field("instantiable", &self.instantiable)
            .field("params", &self.params)
            .field("has_constructor", &self.constructor.is_some())
            .finish()
    }
}

/// 能描述自身构造方式的 Rust 类型
///
/// ```
/// use plugkit::infrastructure::container::{Blueprint, Container, Injectable};
///
/// struct Clock;
///
/// impl Injectable for Clock {
///     fn blueprint() -> Blueprint {
///         Blueprint::class("Clock").construct(|_| Ok(Clock))
///     }
/// }
///
/// let container = Container::new();
/// container.register::<Clock>();
/// assert!(container.get_as::<Clock>("Clock").is_ok());
/// ```
pub trait Injectable: Any + Send + Sync {
    fn blueprint() -> Blueprint;
}
