//! 进程生命周期：fork、exec、exit 与信号。
//!
//! 终止走统一的 [`Kernel::terminate`]：回收描述符、标记
//! `Terminated`、摘出就绪集，杀别人与杀自己共用同一条路径。

use super::{Context, ProcessState};
use crate::config::{PROCESS_LIMIT, STACK_STRIDE};
use crate::error::{KernelError, KernelResult};

/// 进程间投递的信号
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// 强制终止
    Kill = 1,
    /// 压入等待态
    Wait = 2,
    /// 仅从等待态恢复执行
    Cont = 3,
}

impl TryFrom<u32> for Signal {
    type Error = KernelError;

    fn try_from(value: u32) -> KernelResult<Self> {
        match value {
            1 => Ok(Self::Kill),
            2 => Ok(Self::Wait),
            3 => Ok(Self::Cont),
            _ => Err(KernelError::InvalidSignal),
        }
    }
}

impl crate::Kernel {
    /// 复制当前进程。
    ///
    /// 取编号最小的已终止槽位；子进程以父进程的陷入帧起步，
    /// 返回值寄存器清零（子进程眼中的调用结果），栈指针按槽位
    /// 错开避免互相踩踏，优先级随父进程，描述符表从空开始。
    pub fn fork(&mut self, ctx: &Context) -> KernelResult<u32> {
        let child = self
            .procs
            .iter()
            .position(|p| p.state == ProcessState::Terminated)
            .ok_or(KernelError::NoProcessSlot)?;

        let parent = self.current;
        let (priority, default_priority) = {
            let p = &self.procs[parent];
            (p.priority, p.default_priority)
        };

        let pcb = &mut self.procs[child];
        pcb.parent = parent;
        pcb.ctx = ctx.clone();
        pcb.ctx.set_return(0);
        pcb.ctx.sp = self.boot.stack_base + child as u32 * STACK_STRIDE;
        pcb.state = ProcessState::Executing;
        pcb.priority = priority;
        pcb.default_priority = default_priority;
        pcb.fd_table = [None; crate::config::FD_LIMIT];

        self.ready.add(child);
        log::debug!("fork: pid {parent} -> pid {child}");
        Ok(child as u32)
    }

    /// 让当前进程跳转到内建程序表中的某个入口。
    ///
    /// 平坦内存下没有地址空间可替换，只改写 pc 并把优先级
    /// 提到最受偏爱的 0。未知程序号不动声色地忽略。
    pub fn exec(&mut self, ctx: &mut Context, program: u32) {
        let Some(&entry) = self.boot.programs.get(program as usize) else {
            log::warn!("exec: unknown program id {program}");
            return;
        };
        ctx.pc = entry;
        self.procs[self.current].priority = 0;
    }

    /// 终结当前进程并立刻让出处理器。
    ///
    /// 就绪集自上次重排后未被打乱，当前进程必在头部。
    pub fn exit(&mut self, ctx: &mut Context) {
        assert_eq!(self.ready.head(), Some(self.current));
        self.ready.remove_head();
        self.release_descriptors(self.current);
        self.procs[self.current].state = ProcessState::Terminated;
        log::debug!("exit: pid {}", self.current);
        self.schedule(ctx);
    }

    /// 向指定进程投递信号
    pub fn kill(&mut self, pid: u32, signal: Signal) -> KernelResult<()> {
        let pid = pid as usize;
        if pid >= PROCESS_LIMIT {
            return Err(KernelError::InvalidPid);
        }

        match signal {
            Signal::Kill => self.terminate(pid),
            Signal::Wait => {
                if self.procs[pid].state == ProcessState::Executing {
                    self.procs[pid].state = ProcessState::Waiting;
                }
            }
            Signal::Cont => {
                if self.procs[pid].state == ProcessState::Waiting {
                    self.procs[pid].state = ProcessState::Executing;
                }
            }
        }
        Ok(())
    }

    /// 给自己投递信号，并且不等返回用户态就调度
    pub fn raise(&mut self, ctx: &mut Context, signal: u32) {
        let result = Signal::try_from(signal).and_then(|s| self.kill(self.current as u32, s));
        // 结果码要在切换之前写回，随让出者的上下文一起保存
        ctx.set_return(result.map(|_| 0).unwrap_or_else(|e| e.code()));
        self.schedule(ctx);
    }

    /// 全体停机：除 boot/init 外逐个终结
    pub fn shutdown_all(&mut self) {
        log::info!("shutdown: terminating all processes");
        for pid in 1..PROCESS_LIMIT {
            self.terminate(pid);
        }
    }

    fn terminate(&mut self, pid: usize) {
        if self.procs[pid].state == ProcessState::Terminated {
            return;
        }
        self.release_descriptors(pid);
        self.procs[pid].state = ProcessState::Terminated;
        self.ready.remove(pid);
    }

    /// 当前进程的 pid
    #[inline]
    pub fn current_pid(&self) -> u32 {
        self.current as u32
    }

    /// 指定槽位的进程状态
    #[inline]
    pub fn state_of(&self, pid: u32) -> ProcessState {
        self.procs[pid as usize].state
    }

    /// 指定槽位的当前优先级
    #[inline]
    pub fn priority_of(&self, pid: u32) -> u32 {
        self.procs[pid as usize].priority
    }
}
