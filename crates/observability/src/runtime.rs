//! 运行时采样
//!
//! 采集 tokio 运行时任务数、工作线程数与当前进程内存占用。

use std::sync::Mutex;
use std::time::Instant;

use contracts::RuntimeSample;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tokio::runtime::Handle;
use tracing::warn;

/// 进程运行时采样器
pub struct RuntimeSampler {
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl RuntimeSampler {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!(error = e, "Cannot resolve current pid, memory figures disabled");
                None
            }
        };

        Self {
            system: Mutex::new(System::new()),
            pid,
        }
    }

    /// 采集一次样本
    ///
    /// 在运行时之外调用时任务数与线程数为 0。
    pub fn sample(&self) -> RuntimeSample {
        let started = Instant::now();

        let (alive_tasks, worker_threads) = match Handle::try_current() {
            Ok(handle) => {
                let metrics = handle.metrics();
                (metrics.num_alive_tasks(), metrics.num_workers())
            }
            Err(_) => (0, 0),
        };

        let (resident_bytes, virtual_bytes) = self.process_memory();

        RuntimeSample {
            alive_tasks,
            worker_threads,
            resident_bytes,
            virtual_bytes,
            sample_duration: started.elapsed(),
        }
    }

    fn process_memory(&self) -> (u64, u64) {
        let Some(pid) = self.pid else {
            return (0, 0);
        };
        let Ok(mut system) = self.system.lock() else {
            return (0, 0);
        };

        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        system
            .process(pid)
            .map(|p| (p.memory(), p.virtual_memory()))
            .unwrap_or((0, 0))
    }
}

impl Default for RuntimeSampler {
    fn default() -> Self {
        Self::new()
    }
}
