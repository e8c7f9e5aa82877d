//! 容器与构造解析器
//!
//! - 绑定表：抽象标识 -> 生产方式（具体标识 / 工厂 / 单例包装）
//! - 单例缓存：OnceCell 保证并发下只构造一次
//! - 蓝图表：显式注册的构造描述
//! - 解析栈：按线程记录正在解析的标识，用于循环依赖检测
//! - 等待图：记录单例的初始化线程，检测跨线程的循环等待

use super::binding::{Binding, Factory, Lifetime, Source};
use super::blueprint::{Blueprint, Injectable, ParamType};
use super::init_graph::{InitGraph, Turn};
use super::instance::{Argument, Arguments, Instance};
use super::{ContainerOptions, ContainerStats};
use crate::errors::ContainerError;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// 解析栈帧；同一标识的绑定调用和构造分开记录
#[derive(Debug, Clone, PartialEq, Eq)]
enum Frame {
    Binding(String),
    Construct(String),
}

impl Frame {
    fn id(&self) -> &str {
        match self {
            Frame::Binding(id) | Frame::Construct(id) => id,
        }
    }
}

/// 内部统计（原子计数器）
#[derive(Default)]
struct InnerStats {
    total_resolutions: AtomicUsize,
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
    constructions: AtomicUsize,
}

/// 依赖注入容器
///
/// 克隆共享同一份注册表与单例缓存。
#[derive(Clone)]
pub struct Container {
    bindings: Arc<DashMap<String, Binding>>,
    instances: Arc<DashMap<String, Arc<OnceCell<Instance>>>>,
    blueprints: Arc<DashMap<String, Arc<Blueprint>>>,
    stacks: Arc<DashMap<ThreadId, Vec<Frame>>>,
    inits: Arc<InitGraph>,
    options: ContainerOptions,
    stats: Arc<InnerStats>,
}

impl Container {
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    pub fn with_options(options: ContainerOptions) -> Self {
        Self {
            bindings: Arc::new(DashMap::new()),
            instances: Arc::new(DashMap::new()),
            blueprints: Arc::new(DashMap::new()),
            stacks: Arc::new(DashMap::new()),
            inits: Arc::new(InitGraph::default()),
            options,
            stats: Arc::new(InnerStats::default()),
        }
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    // ---- 蓝图注册 ----

    pub fn register_blueprint(&self, blueprint: Blueprint) {
        tracing::debug!(id = blueprint.id(), params = blueprint.params().len(), "Blueprint registered");
        self.blueprints
            .insert(blueprint.id().to_string(), Arc::new(blueprint));
    }

    pub fn register<T: Injectable>(&self) {
        self.register_blueprint(T::blueprint());
    }

    pub fn blueprint(&self, id: &str) -> Option<Arc<Blueprint>> {
        self.blueprints.get(id).map(|entry| entry.value().clone())
    }

    pub fn is_instantiable(&self, id: &str) -> bool {
        self.blueprints
            .get(id)
            .map(|entry| entry.is_instantiable())
            .unwrap_or(false)
    }

    // ---- 绑定 ----

    /// 将标识绑定到自身
    pub fn bind(&self, abstract_id: &str) {
        self.insert_binding(abstract_id, Binding::transient(Source::Concrete(abstract_id.to_string())));
    }

    pub fn bind_to(&self, abstract_id: &str, concrete_id: &str) {
        self.insert_binding(abstract_id, Binding::transient(Source::Concrete(concrete_id.to_string())));
    }

    pub fn bind_factory<T, F>(&self, abstract_id: &str, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.insert_binding(abstract_id, Binding::transient(Source::Factory(wrap_factory(abstract_id, factory))));
    }

    pub fn singleton(&self, abstract_id: &str) {
        self.insert_binding(abstract_id, Binding::singleton(Source::Concrete(abstract_id.to_string())));
    }

    pub fn singleton_to(&self, abstract_id: &str, concrete_id: &str) {
        self.insert_binding(abstract_id, Binding::singleton(Source::Concrete(concrete_id.to_string())));
    }

    pub fn singleton_factory<T, F>(&self, abstract_id: &str, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.insert_binding(abstract_id, Binding::singleton(Source::Factory(wrap_factory(abstract_id, factory))));
    }

    /// 预先构造好的共享实例
    pub fn instance<T: Any + Send + Sync>(&self, abstract_id: &str, value: T) {
        let cell = OnceCell::with_value(Instance::new(abstract_id, value));
        self.instances.insert(abstract_id.to_string(), Arc::new(cell));
        tracing::debug!(abstract_id, "Shared instance registered");
    }

    fn insert_binding(&self, abstract_id: &str, binding: Binding) {
        tracing::debug!(abstract_id, source = ?binding.source, lifetime = ?binding.lifetime, "Binding registered");
        self.bindings.insert(abstract_id.to_string(), binding);
    }

    /// 已绑定，或已有缓存实例
    pub fn has(&self, abstract_id: &str) -> bool {
        self.bindings.contains_key(abstract_id)
            || self
                .instances
                .get(abstract_id)
                .map(|cell| cell.get().is_some())
                .unwrap_or(false)
    }

    /// 已注册绑定的标识（排序）
    pub fn bindings(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.bindings.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    // ---- 解析 ----

    /// 获取实例：可调用绑定直接执行，否则构造
    pub fn get(&self, abstract_id: &str) -> Result<Instance, ContainerError> {
        self.stats.total_resolutions.fetch_add(1, Ordering::Relaxed);

        // 不要在递归解析期间持有 DashMap 的引用
        let binding = self.bindings.get(abstract_id).map(|entry| entry.value().clone());

        match binding {
            Some(binding) if binding.is_invocable() => match binding.lifetime {
                Lifetime::Singleton => self.shared(abstract_id, &binding.source),
                Lifetime::Transient => self.produce(abstract_id, &binding.source),
            },
            Some(Binding {
                source: Source::Concrete(concrete),
                ..
            }) => self.resolve(&concrete),
            _ => {
                if let Some(instance) = self.cached(abstract_id) {
                    return Ok(instance);
                }
                self.resolve(abstract_id)
            }
        }
    }

    pub fn get_as<T: Any + Send + Sync>(&self, abstract_id: &str) -> Result<Arc<T>, ContainerError> {
        self.get(abstract_id)?.downcast::<T>()
    }

    /// 直接构造具体类型，忽略该标识的绑定
    pub fn resolve(&self, concrete_id: &str) -> Result<Instance, ContainerError> {
        let blueprint = self
            .blueprint(concrete_id)
            .ok_or_else(|| ContainerError::NotInstantiable {
                id: concrete_id.to_string(),
                reason: "no blueprint registered".to_string(),
            })?;

        if !blueprint.is_instantiable() {
            return Err(ContainerError::NotInstantiable {
                id: concrete_id.to_string(),
                reason: if blueprint.is_abstract() {
                    "type is abstract".to_string()
                } else {
                    "blueprint has no constructor".to_string()
                },
            });
        }

        let _frame = self.enter(Frame::Construct(concrete_id.to_string()))?;

        let mut args = Vec::with_capacity(blueprint.params().len());
        for param in blueprint.params() {
            let arg = match &param.ty {
                ParamType::Class(class_id) => Argument::Service(self.get(class_id)?),
                ParamType::Builtin(_) | ParamType::Untyped => {
                    Argument::Value(param.default.clone().unwrap_or(Value::Null))
                }
            };
            args.push(arg);
        }

        let constructor = blueprint
            .constructor()
            .ok_or_else(|| ContainerError::NotInstantiable {
                id: concrete_id.to_string(),
                reason: "blueprint has no constructor".to_string(),
            })?;

        let instance = constructor(&Arguments::new(concrete_id, args))
            .map_err(|err| creation_error(concrete_id, err))?;

        self.stats.constructions.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(concrete_id, type_name = instance.type_name(), "Instance constructed");
        Ok(instance)
    }

    pub fn resolve_as<T: Any + Send + Sync>(&self, concrete_id: &str) -> Result<Arc<T>, ContainerError> {
        self.resolve(concrete_id)?.downcast::<T>()
    }

    fn cached(&self, abstract_id: &str) -> Option<Instance> {
        self.instances
            .get(abstract_id)
            .and_then(|cell| cell.get().cloned())
    }

    /// 单例包装：首次调用时解析并缓存，此后返回同一实例
    fn shared(&self, abstract_id: &str, source: &Source) -> Result<Instance, ContainerError> {
        if let Some(instance) = self.cached(abstract_id) {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(abstract_id, "Singleton cache hit");
            return Ok(instance);
        }

        // 在进入 OnceCell 初始化之前检测环，避免同线程重入
        let _frame = self.enter(Frame::Binding(abstract_id.to_string()))?;

        let cell = self
            .instances
            .entry(abstract_id.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        // 其他线程正在初始化时在等待图上排队，跨线程的环在阻塞前报错
        let _owner = match self.inits.acquire(abstract_id, || cell.get().cloned())? {
            Turn::Ready(instance) => {
                self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                return Ok(instance);
            }
            Turn::Initialize(guard) => guard,
        };

        let mut created = false;
        let instance = cell
            .get_or_try_init(|| {
                created = true;
                match source {
                    Source::Concrete(concrete) => self.resolve(concrete),
                    Source::Factory(factory) => self.call_factory(abstract_id, factory),
                }
            })?
            .clone();

        if created {
            self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(abstract_id, "Singleton instance cached");
        } else {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
        }
        Ok(instance)
    }

    /// 瞬态工厂
    fn produce(&self, abstract_id: &str, source: &Source) -> Result<Instance, ContainerError> {
        match source {
            Source::Concrete(concrete) => self.resolve(concrete),
            Source::Factory(factory) => {
                let _frame = self.enter(Frame::Binding(abstract_id.to_string()))?;
                self.call_factory(abstract_id, factory)
            }
        }
    }

    fn call_factory(&self, abstract_id: &str, factory: &Factory) -> Result<Instance, ContainerError> {
        factory(self).map_err(|err| creation_error(abstract_id, err))
    }

    fn enter(&self, frame: Frame) -> Result<FrameGuard<'_>, ContainerError> {
        let thread = thread::current().id();
        let mut stack = self.stacks.entry(thread).or_default();

        if let Some(pos) = stack.iter().position(|f| *f == frame) {
            // 单例包装帧后紧跟同名构造帧时只记一次
            let mut chain: Vec<String> = Vec::new();
            let mut previous: Option<&Frame> = None;
            for current in &stack[pos..] {
                let repeated = matches!(
                    (previous, current),
                    (Some(Frame::Binding(a)), Frame::Construct(b)) if a == b
                );
                if !repeated {
                    chain.push(current.id().to_string());
                }
                previous = Some(current);
            }
            chain.push(frame.id().to_string());
            tracing::warn!(chain = ?chain, "Circular dependency detected");
            return Err(ContainerError::CircularDependency { chain });
        }

        // 只有构造帧计入深度，单例包装帧不占额度
        let depth = stack.iter().filter(|f| matches!(f, Frame::Construct(_))).count();
        if matches!(frame, Frame::Construct(_)) && depth >= self.options.max_depth {
            return Err(ContainerError::DepthExceeded {
                id: frame.id().to_string(),
                depth: self.options.max_depth,
            });
        }

        stack.push(frame);
        Ok(FrameGuard {
            stacks: &self.stacks,
            thread,
        })
    }

    /// 获取容器统计信息
    pub fn stats(&self) -> ContainerStats {
        ContainerStats {
            total_resolutions: self.stats.total_resolutions.load(Ordering::Relaxed),
            cache_hits: self.stats.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.stats.cache_misses.load(Ordering::Relaxed),
            constructions: self.stats.constructions.load(Ordering::Relaxed),
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

/// 离开作用域时弹出解析栈帧
struct FrameGuard<'a> {
    stacks: &'a DashMap<ThreadId, Vec<Frame>>,
    thread: ThreadId,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        let empty = match self.stacks.get_mut(&self.thread) {
            Some(mut stack) => {
                stack.pop();
                stack.is_empty()
            }
            None => false,
        };
        if empty {
            self.stacks.remove_if(&self.thread, |_, stack| stack.is_empty());
        }
    }
}

fn wrap_factory<T, F>(abstract_id: &str, factory: F) -> Factory
where
    T: Any + Send + Sync,
    F: Fn(&Container) -> anyhow::Result<T> + Send + Sync + 'static,
{
    let id: Arc<str> = Arc::from(abstract_id);
    Arc::new(move |container: &Container| Ok(Instance::new(id.clone(), factory(container)?)))
}

/// 嵌套解析错误原样向上传递，其余错误包装为创建失败
fn creation_error(id: &str, err: anyhow::Error) -> ContainerError {
    match err.downcast::<ContainerError>() {
        Ok(inner) => inner,
        Err(err) => ContainerError::CreationFailed {
            id: id.to_string(),
            source: err.into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::container::Builtin;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    struct Clock;

    fn container_with_clock() -> Container {
        let container = Container::new();
        container.register_blueprint(Blueprint::class("Clock").construct(|_| Ok(Clock)));
        container
    }

    #[test]
    fn test_transient_binding_builds_fresh_instances() {
        let container = container_with_clock();
        container.bind("Clock");

        let a = container.get("Clock").unwrap();
        let b = container.get("Clock").unwrap();
        assert!(!a.ptr_eq(&b));
        assert!(a.is::<Clock>());
    }

    #[test]
    fn test_singleton_is_memoized() {
        let container = container_with_clock();
        container.singleton("Clock");

        let a = container.get("Clock").unwrap();
        let b = container.get("Clock").unwrap();
        assert!(a.ptr_eq(&b));

        let stats = container.stats();
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.constructions, 1);
    }

    #[test]
    fn test_unbound_get_falls_back_to_resolve() {
        let container = container_with_clock();
        assert!(!container.has("Clock"));
        assert!(container.get("Clock").unwrap().is::<Clock>());
    }

    #[test]
    fn test_missing_blueprint_is_not_instantiable() {
        let container = Container::new();
        let err = container.resolve("Ghost").unwrap_err();
        assert!(matches!(err, ContainerError::NotInstantiable { ref id, .. } if id == "Ghost"));
    }

    #[test]
    fn test_resolve_ignores_binding_for_same_id() {
        let container = container_with_clock();
        container.bind_factory("Clock", |_| Ok(String::from("not a clock")));

        assert!(container.get("Clock").unwrap().is::<String>());
        assert!(container.resolve("Clock").unwrap().is::<Clock>());
    }

    #[test]
    fn test_primitive_defaults_and_absence_marker() {
        let container = Container::new();
        container.register_blueprint(
            Blueprint::class("Pair")
                .param("left", Builtin::Int, Some(json!(3)))
                .untyped("right", None)
                .construct(|args| {
                    let left: Option<i64> = args.value(0)?;
                    let right: Option<i64> = args.value(1)?;
                    Ok((left, right))
                }),
        );

        let pair = container.resolve_as::<(Option<i64>, Option<i64>)>("Pair").unwrap();
        assert_eq!(*pair, (Some(3), None));
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let container = Container::new();
        container.register_blueprint(
            Blueprint::class("Ouroboros")
                .depends_on("tail", "Ouroboros")
                .construct(|_| Ok(())),
        );

        match container.get("Ouroboros") {
            Err(ContainerError::CircularDependency { chain }) => {
                assert_eq!(chain, ["Ouroboros", "Ouroboros"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_depth_limit() {
        let container = Container::with_options(ContainerOptions { max_depth: 3 });
        for i in 0..5 {
            let mut blueprint = Blueprint::class(format!("L{i}"));
            if i < 4 {
                blueprint = blueprint.depends_on("next", format!("L{}", i + 1));
            }
            container.register_blueprint(blueprint.construct(|_| Ok(())));
        }

        assert!(matches!(
            container.resolve("L0"),
            Err(ContainerError::DepthExceeded { depth: 3, .. })
        ));
        // 解析栈在失败后被清空
        assert!(container.stacks.is_empty());
    }

    #[test]
    fn test_singleton_wrappers_do_not_count_toward_depth() {
        let container = Container::with_options(ContainerOptions { max_depth: 3 });
        for i in 0..3 {
            let mut blueprint = Blueprint::class(format!("S{i}"));
            if i < 2 {
                blueprint = blueprint.depends_on("next", format!("S{}", i + 1));
            }
            container.register_blueprint(blueprint.construct(|_| Ok(())));
            container.singleton(&format!("S{i}"));
        }

        // 三个单例各压入两帧，但只有三个构造帧
        assert!(container.get("S0").is_ok());
        assert!(container.stacks.is_empty());
    }

    #[test]
    fn test_factory_error_is_wrapped_and_not_cached() {
        let container = Container::new();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        container.singleton_factory("Flaky", move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                anyhow::bail!("first attempt fails");
            }
            Ok(7u8)
        });

        assert!(matches!(
            container.get("Flaky"),
            Err(ContainerError::CreationFailed { ref id, .. }) if id == "Flaky"
        ));
        assert!(container.instances.get("Flaky").unwrap().get().is_none());
        assert_eq!(*container.get_as::<u8>("Flaky").unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_nested_container_error_propagates_unchanged() {
        let container = Container::new();
        container.bind_factory("Outer", |c: &Container| {
            let inner = c.get_as::<u8>("Missing")?;
            Ok(*inner)
        });

        assert!(matches!(
            container.get("Outer"),
            Err(ContainerError::NotInstantiable { ref id, .. }) if id == "Missing"
        ));
    }

    #[test]
    fn test_prebuilt_instance_counts_as_registered() {
        let container = Container::new();
        container.instance("Config", String::from("ready"));
        assert!(container.has("Config"));
        assert_eq!(*container.get_as::<String>("Config").unwrap(), "ready");
    }
}
