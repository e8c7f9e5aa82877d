//! 单例初始化的跨线程等待图
//!
//! 解析栈只记录本线程的帧。两个线程各自持有环上的一个单例时，
//! 彼此等待会永久阻塞；这里记录每个单例由哪个线程初始化、
//! 每个线程在等待哪个单例，阻塞前沿等待边查找回到当前线程的环。

use crate::errors::ContainerError;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::thread::{self, ThreadId};

#[derive(Default)]
struct Graph {
    /// 单例标识 -> 正在初始化它的线程
    owners: HashMap<String, ThreadId>,
    /// 线程 -> 它正在等待的单例
    waiting: HashMap<ThreadId, String>,
    /// 被其他线程判定处于环中的等待者，唤醒后以该链失败
    aborted: HashMap<ThreadId, Vec<String>>,
}

impl Graph {
    /// 从 `wanted` 出发沿等待边前进，回到 `me` 时返回环上的标识及各自的初始化线程
    fn ring(&self, wanted: &str, me: ThreadId) -> Option<Vec<(String, ThreadId)>> {
        let mut ring = Vec::new();
        let mut id = wanted.to_string();
        for _ in 0..=self.owners.len() {
            let owner = *self.owners.get(&id)?;
            ring.push((id, owner));
            if owner == me {
                return Some(ring);
            }
            id = self.waiting.get(&owner)?.clone();
        }
        None
    }
}

/// 从第 `start` 个单例的视角展开环
fn chain_from(ring: &[(String, ThreadId)], start: usize) -> Vec<String> {
    let mut chain: Vec<String> = ring[start..]
        .iter()
        .chain(&ring[..start])
        .map(|(id, _)| id.clone())
        .collect();
    chain.push(ring[start].0.clone());
    chain
}

pub(crate) enum Turn<'a, T> {
    /// 已由其他线程初始化完成
    Ready(T),
    /// 当前线程负责初始化，守卫释放时唤醒等待者
    Initialize(InitGuard<'a>),
}

#[derive(Default)]
pub(crate) struct InitGraph {
    graph: Mutex<Graph>,
    released: Condvar,
}

impl InitGraph {
    /// 取得 `id` 的初始化权，或等待其他线程完成初始化
    ///
    /// `ready` 在持锁时调用，返回已缓存的值。
    pub(crate) fn acquire<T>(
        &self,
        id: &str,
        ready: impl Fn() -> Option<T>,
    ) -> Result<Turn<'_, T>, ContainerError> {
        let me = thread::current().id();
        let mut graph = self.graph.lock();

        loop {
            graph.waiting.remove(&me);

            if let Some(chain) = graph.aborted.remove(&me) {
                return Err(ContainerError::CircularDependency { chain });
            }
            if let Some(value) = ready() {
                return Ok(Turn::Ready(value));
            }

            let owner = match graph.owners.get(id).copied() {
                None => {
                    graph.owners.insert(id.to_string(), me);
                    return Ok(Turn::Initialize(InitGuard {
                        graph: self,
                        id: id.to_string(),
                    }));
                }
                Some(owner) => owner,
            };

            if let Some(ring) = graph.ring(id, me) {
                // 环上其余线程都在等待，逐个中止
                let last = ring.len() - 1;
                for (index, (_, thread)) in ring.iter().enumerate().take(last) {
                    graph.aborted.insert(*thread, chain_from(&ring, index));
                }
                self.released.notify_all();

                let chain = chain_from(&ring, last);
                tracing::warn!(chain = ?chain, "Circular dependency detected across threads");
                return Err(ContainerError::CircularDependency { chain });
            }

            tracing::trace!(id, ?owner, "Waiting for singleton initialization");
            graph.waiting.insert(me, id.to_string());
            self.released.wait(&mut graph);
        }
    }
}

pub(crate) struct InitGuard<'a> {
    graph: &'a InitGraph,
    id: String,
}

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        let mut graph = self.graph.graph.lock();
        graph.owners.remove(&self.id);
        drop(graph);
        self.graph.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_caller_initializes_then_others_see_value() {
        let graph = InitGraph::default();

        let guard = match graph.acquire("Clock", || None::<u8>).unwrap() {
            Turn::Initialize(guard) => guard,
            Turn::Ready(_) => panic!("nothing cached yet"),
        };
        drop(guard);

        assert!(matches!(graph.acquire("Clock", || Some(1u8)).unwrap(), Turn::Ready(1)));
        assert!(graph.graph.lock().owners.is_empty());
    }

    #[test]
    fn ring_is_rotated_per_thread() {
        let ring = vec![
            ("A".to_string(), thread::current().id()),
            ("B".to_string(), thread::current().id()),
        ];
        assert_eq!(chain_from(&ring, 0), ["A", "B", "A"]);
        assert_eq!(chain_from(&ring, 1), ["B", "A", "B"]);
    }
}
