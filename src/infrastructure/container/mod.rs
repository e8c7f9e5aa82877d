//! 依赖注入容器
//!
//! 以名称为键的绑定表 + 单例缓存 + 基于显式蓝图的构造解析器。

mod binding;
mod blueprint;
mod init_graph;
mod instance;
mod resolver;

pub use binding::{Binding, Factory, Lifetime, Source};
pub use blueprint::{Blueprint, Builtin, Constructor, Injectable, ParamType, Parameter};
pub use instance::{Argument, Arguments, Instance};
pub use resolver::Container;

pub use crate::errors::ContainerError;

use serde::{Deserialize, Serialize};

/// 容器选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    /// 单次解析链允许的最大构造深度
    ///
    /// 只计算蓝图构造；单例包装与工厂调用不计入。
    pub max_depth: usize,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

/// 容器统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerStats {
    /// `get` 调用次数
    pub total_resolutions: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    /// 通过蓝图实际构造的实例数
    pub constructions: usize,
}

impl ContainerStats {
    pub fn total(&self) -> usize {
        self.total_resolutions
    }

    /// 单例缓存命中率
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }
}
