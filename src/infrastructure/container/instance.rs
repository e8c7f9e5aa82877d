//! 类型擦除的实例句柄与构造参数

use crate::errors::ContainerError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 容器产出的实例
///
/// 克隆只增加引用计数，单例通过 [`Instance::ptr_eq`] 判断同一性。
#[derive(Clone)]
pub struct Instance {
    id: Arc<str>,
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    pub fn new<T: Any + Send + Sync>(id: impl Into<Arc<str>>, value: T) -> Self {
        Self {
            id: id.into(),
            type_name: std::any::type_name::<T>(),
            value: Arc::new(value),
        }
    }

    /// 构造该实例的蓝图或工厂标识
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// 安全的类型转换
    pub fn downcast<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ContainerError> {
        self.value
            .clone()
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                id: self.id.to_string(),
                expected: std::any::type_name::<T>(),
                actual: self.type_name,
            })
    }

    /// 取出按契约存放的值（例如 `Arc<dyn Logger>`）的克隆
    pub fn contract<T: Any + Clone>(&self) -> Result<T, ContainerError> {
        self.downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| ContainerError::TypeMismatch {
                id: self.id.to_string(),
                expected: std::any::type_name::<T>(),
                actual: self.type_name,
            })
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// 单个位置参数
#[derive(Debug, Clone)]
pub enum Argument {
    /// 类类型参数，由容器递归解析
    Service(Instance),
    /// 基础类型参数：默认值，或 `Null` 表示缺省
    Value(Value),
}

impl Argument {
    pub fn is_absent(&self) -> bool {
        matches!(self, Argument::Value(Value::Null))
    }
}

/// 按声明顺序组装好的构造参数列表
#[derive(Debug, Clone)]
pub struct Arguments {
    owner: String,
    values: Vec<Argument>,
}

impl Arguments {
    pub(crate) fn new(owner: &str, values: Vec<Argument>) -> Self {
        Self {
            owner: owner.to_string(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.values.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.values.iter()
    }

    /// 第 `index` 个参数作为服务实例
    pub fn instance(&self, index: usize) -> anyhow::Result<&Instance> {
        match self.values.get(index) {
            Some(Argument::Service(instance)) => Ok(instance),
            Some(Argument::Value(_)) => Err(anyhow::anyhow!(
                "argument {} of '{}' is a value, not a service",
                index,
                self.owner
            )),
            None => Err(self.missing(index)),
        }
    }

    pub fn service<T: Any + Send + Sync>(&self, index: usize) -> anyhow::Result<Arc<T>> {
        Ok(self.instance(index)?.downcast::<T>()?)
    }

    pub fn contract<T: Any + Clone>(&self, index: usize) -> anyhow::Result<T> {
        Ok(self.instance(index)?.contract::<T>()?)
    }

    /// 第 `index` 个参数作为基础值；缺省标记返回 `None`
    pub fn value<T: DeserializeOwned>(&self, index: usize) -> anyhow::Result<Option<T>> {
        match self.values.get(index) {
            Some(Argument::Value(Value::Null)) => Ok(None),
            Some(Argument::Value(value)) => Ok(Some(serde_json::from_value(value.clone())?)),
            Some(Argument::Service(_)) => Err(anyhow::anyhow!(
                "argument {} of '{}' is a service, not a value",
                index,
                self.owner
            )),
            None => Err(self.missing(index)),
        }
    }

    fn missing(&self, index: usize) -> anyhow::Error {
        anyhow::anyhow!(
            "'{}' has {} constructor arguments, index {} requested",
            self.owner,
            self.values.len(),
            index
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[test]
    fn downcast_reports_both_types_on_mismatch() {
        let instance = Instance::new("Number", 7u32);
        assert_eq!(*instance.downcast::<u32>().unwrap(), 7);

        match instance.downcast::<String>() {
            Err(ContainerError::TypeMismatch { id, expected, actual }) => {
                assert_eq!(id, "Number");
                assert!(expected.contains("String"));
                assert_eq!(actual, "u32");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn contract_clones_trait_object() {
        let greeter: Arc<dyn Greeter> = Arc::new(English);
        let instance = Instance::new("Greeter", greeter);

        let resolved = instance.contract::<Arc<dyn Greeter>>().unwrap();
        assert_eq!(resolved.greet(), "hello");
    }

    #[test]
    fn clones_share_identity() {
        let a = Instance::new("A", String::from("x"));
        let b = a.clone();
        let c = Instance::new("A", String::from("x"));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn arguments_distinguish_values_and_absence() {
        let args = Arguments::new(
            "Mailer",
            vec![
                Argument::Value(serde_json::json!(25)),
                Argument::Value(Value::Null),
                Argument::Service(Instance::new("Logger", ())),
            ],
        );

        assert_eq!(args.value::<u16>(0).unwrap(), Some(25));
        assert_eq!(args.value::<u16>(1).unwrap(), None);
        assert!(args.get(1).unwrap().is_absent());
        assert!(args.value::<u16>(2).is_err());
        assert!(args.instance(0).is_err());
        assert!(args.instance(9).is_err());
    }
}
