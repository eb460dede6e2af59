//! # 单核抢占式教学内核的核心
//!
//! 在一颗核上复用固定数目的进程：带老化的优先级调度、
//! 深度为 1 的具名信箱、经 `chain-fs` 持久化的文件层。
//!
//! 全部内核状态集中在一个显式持有的 [`Kernel`] 里，操作一律
//! `&mut self`；单核加上陷入边界天然串行，内部不设锁。
//! 物理资源留在外面：时钟与中断控制器由嵌入方编程并应答，
//! UART 经 [`Console`]，磁盘经 [`chain_fs::BlockDevice`]，
//! 平坦的用户内存以 `&mut [u8]` 随系统调用传入。

#![no_std]

extern crate alloc;

pub mod config;
pub mod syscall;

mod task;
pub use task::{Context, ProcessState, Signal};

mod channel;

mod fs;
pub use fs::{OpenFlag, SeekFrom};

mod console;
pub use console::Console;

mod error;
pub use error::{KernelError, KernelResult};

use alloc::sync::Arc;
use alloc::vec::Vec;

use chain_fs::{BlockDevice, ChainFileSystem, FsError};
use spin::Mutex;

use self::channel::Channel;
use self::config::{
    BootConfig, ACTIVE_INODE_LIMIT, CHANNEL_LIMIT, DEFAULT_PRIORITY, OPEN_FILE_LIMIT,
    PROCESS_LIMIT, USER_PSR,
};
use self::fs::{ActiveInode, OpenFile};
use self::task::{Pcb, ReadySet};

/// 全部内核状态的持有者
pub struct Kernel {
    procs: [Pcb; PROCESS_LIMIT],
    ready: ReadySet,
    /// 当前运行进程的槽位；切换瞬间之外恒指向唯一的运行者
    current: usize,
    channels: [Channel; CHANNEL_LIMIT],
    open_files: [Option<OpenFile>; OPEN_FILE_LIMIT],
    active_inodes: Vec<Option<ActiveInode>>,
    fs: Option<Arc<Mutex<ChainFileSystem>>>,
    device: Arc<dyn BlockDevice>,
    console: Arc<dyn Console>,
    boot: BootConfig,
}

impl Kernel {
    pub fn new(device: Arc<dyn BlockDevice>, console: Arc<dyn Console>, boot: BootConfig) -> Self {
        let mut active_inodes = Vec::with_capacity(ACTIVE_INODE_LIMIT);
        active_inodes.resize_with(ACTIVE_INODE_LIMIT, || None);

        Self {
            procs: [const { Pcb::vacant() }; PROCESS_LIMIT],
            ready: ReadySet::new(),
            current: 0,
            channels: [Channel::default(); CHANNEL_LIMIT],
            open_files: [None; OPEN_FILE_LIMIT],
            active_inodes,
            fs: None,
            device,
            console,
            boot,
        }
    }

    /// 复位路径的收尾：建立 0 号进程并尝试挂载文件系统。
    /// 陷入帧被改写成 init 的入口，返回用户态即开始运行。
    pub fn start(&mut self, ctx: &mut Context) {
        let init = &mut self.procs[0];
        init.state = ProcessState::Executing;
        init.priority = DEFAULT_PRIORITY;
        init.default_priority = DEFAULT_PRIORITY;
        init.ctx = Context {
            pc: self.boot.init_entry,
            sp: self.boot.stack_base,
            psr: USER_PSR,
            ..Context::default()
        };
        *ctx = init.ctx.clone();

        self.current = 0;
        self.ready.add(0);

        match ChainFileSystem::load(self.device.clone()) {
            Ok(fs) => {
                self.fs = Some(fs);
                log::info!("filesystem mounted");
            }
            Err(FsError::BadSuperBlock) => {
                log::warn!("no valid superblock; filesystem needs a format");
            }
            Err(e) => log::warn!("mount failed: {e}"),
        }

        log::info!("kernel up, running init at {:#x}", self.boot.init_entry);
    }

    /// 时钟滴答：调度一轮；中断源由嵌入方应答
    #[inline]
    pub fn handle_timer(&mut self, ctx: &mut Context) {
        self.schedule(ctx);
    }
}
