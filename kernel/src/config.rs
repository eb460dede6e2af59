//! 内核的编译期常量与启动参数

use alloc::vec::Vec;

/// 进程槽位总数；pid 即槽位下标
pub const PROCESS_LIMIT: usize = 8;

/// 每进程的文件描述符表容量
pub const FD_LIMIT: usize = 16;

/// 全局打开文件表容量
pub const OPEN_FILE_LIMIT: usize = 128;

/// 活动 inode 表容量
pub const ACTIVE_INODE_LIMIT: usize = 128;

/// 消息通道表容量
pub const CHANNEL_LIMIT: usize = 8;

/// 相邻进程栈之间的间隔；平坦内存下仅凭栈偏移区分进程
pub const STACK_STRIDE: u32 = 0x1000;

/// 新建进程的基准优先级，数值越小越先调度
pub const DEFAULT_PRIORITY: u32 = 10;

/// 用户态的处理器状态字
pub const USER_PSR: u32 = 0x50;

/// 配合 SIGKILL 表示全体停机的保留 pid
pub const SHUTDOWN_PID: u32 = 9;

/// 启动参数由嵌入方给出：入口地址与内建程序表都是链接期事实，
/// 内核本身不关心它们的来历
#[derive(Debug, Clone)]
pub struct BootConfig {
    /// 0 号进程的入口地址
    pub init_entry: u32,
    /// 内建程序表，`exec` 的程序号是这里的下标
    pub programs: Vec<u32>,
    /// 进程栈区的基址
    pub stack_base: u32,
}
