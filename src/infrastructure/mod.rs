//! 基础设施层
//!
//! 依赖注入容器及其类型描述。

pub mod container;

pub use container::{Container, ContainerError, ContainerOptions, Instance, Lifetime};
