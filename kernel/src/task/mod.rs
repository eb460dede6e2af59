//! # 进程管理
//!
//! 进程表、就绪集与带老化的优先级调度器。
//!
//! 进程表是 [`PROCESS_LIMIT`] 个定长槽位，pid 就是槽位下标，
//! 进程终止后槽位回收而非销毁，等待下一次 `fork` 复用。
//! 就绪集在每次调度决策前整体重排，不是严格的 FIFO。

mod context;
mod process;

pub use context::Context;
pub use process::Signal;

use core::cmp::Ordering;

use crate::config::{FD_LIMIT, PROCESS_LIMIT};
use crate::Kernel;

/// 进程状态机。
/// 变体顺序即调度偏好：只有 `Executing` 可被选中运行。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProcessState {
    Executing,
    Waiting,
    Terminated,
}

/// 进程控制块，一槽一个
#[derive(Debug, Clone)]
pub(crate) struct Pcb {
    pub parent: usize,
    pub ctx: Context,
    pub state: ProcessState,
    /// 数值越小越先调度；被调度器的老化惩罚就地修改
    pub priority: u32,
    /// 切换让出时恢复到的基准值
    pub default_priority: u32,
    /// 描述符表：小整数到全局打开文件表槽位的映射
    pub fd_table: [Option<usize>; FD_LIMIT],
}

impl Pcb {
    pub(crate) const fn vacant() -> Self {
        Self {
            parent: 0,
            ctx: Context {
                gpr: [0; 13],
                sp: 0,
                lr: 0,
                pc: 0,
                psr: 0,
            },
            state: ProcessState::Terminated,
            priority: 0,
            default_priority: 0,
            fd_table: [None; FD_LIMIT],
        }
    }
}

/// 就绪集：未终止进程的工作集合。
/// 空槽与已终止项一律排到尾部，头部是下一个运行者。
#[derive(Debug)]
pub(crate) struct ReadySet {
    slots: [Option<usize>; PROCESS_LIMIT],
    len: usize,
}

impl ReadySet {
    pub(crate) const fn new() -> Self {
        Self {
            slots: [None; PROCESS_LIMIT],
            len: 0,
        }
    }

    pub(crate) fn add(&mut self, pid: usize) {
        assert!(self.len < PROCESS_LIMIT);
        assert!(!self.slots[..self.len].contains(&Some(pid)));
        self.slots[self.len] = Some(pid);
        self.len += 1;
    }

    pub(crate) fn head(&self) -> Option<usize> {
        self.slots[0]
    }

    /// 旋转式摘除头部：头部滚到尾槽后清空
    pub(crate) fn remove_head(&mut self) {
        assert!(self.len > 0);
        self.slots.rotate_left(1);
        self.slots[PROCESS_LIMIT - 1] = None;
        self.len -= 1;
    }

    /// 摘除任意位置的项；不在集合中则是空操作
    pub(crate) fn remove(&mut self, pid: usize) {
        let Some(at) = self.slots.iter().position(|s| *s == Some(pid)) else {
            return;
        };
        self.slots[at..].rotate_left(1);
        self.slots[PROCESS_LIMIT - 1] = None;
        self.len -= 1;
    }
}

impl Kernel {
    /// 调度器：每次时钟中断与显式 `yield` 都会进入。
    ///
    /// 重排就绪集后，头部若仍是当前进程，给它记一次老化惩罚，
    /// 让同优先级的后来者有机会胜出；头部换人则把让出者的
    /// 优先级恢复基准，并经陷入帧交换两边的上下文。
    pub fn schedule(&mut self, ctx: &mut Context) {
        self.reorder_ready();

        let Some(next) = self.ready.head() else {
            return;
        };
        if self.procs[next].state != ProcessState::Executing {
            // 就绪集中只剩 Waiting，维持现进程
            return;
        }

        if next == self.current {
            self.procs[next].priority += 1;
            return;
        }

        let prev = self.current;
        self.procs[prev].priority = self.procs[prev].default_priority;
        self.procs[prev].ctx = ctx.clone();
        *ctx = self.procs[next].ctx.clone();
        self.current = next;
    }

    /// 就绪集的全序：空槽与已终止项最后；存活项先比状态再比
    /// 优先级，同优先级按 pid 定序
    fn reorder_ready(&mut self) {
        let procs = &self.procs;
        self.ready.slots.sort_unstable_by(|a, b| match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => {
                let (px, py) = (&procs[*x], &procs[*y]);
                px.state
                    .cmp(&py.state)
                    .then(px.priority.cmp(&py.priority))
                    .then(x.cmp(y))
            }
        });
    }
}
