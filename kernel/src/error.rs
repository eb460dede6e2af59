//! 内核操作的错误分类。
//!
//! 资源耗尽与路径错误都作为错误值一路返回，内核不因此停摆；
//! 只有在系统调用边界才折算成写回陷入帧的负数结果码。

use core::fmt;

use chain_fs::FsError;

pub type KernelResult<T> = Result<T, KernelError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// 进程表没有可回收的槽位
    NoProcessSlot,
    InvalidPid,
    InvalidSignal,
    InvalidChannel,
    NoChannelSlot,
    ChannelFull,
    ChannelEmpty,
    BadDescriptor,
    DescriptorTableFull,
    OpenFileTableFull,
    ActiveInodeTableFull,
    /// 尚未挂载文件系统
    NotMounted,
    /// 用户缓冲区越出平坦内存范围
    BadAddress,
    BadSeek,
    UnknownSyscall,
    Fs(FsError),
}

impl KernelError {
    /// 系统调用边界的负数结果码
    pub fn code(self) -> i32 {
        match self {
            Self::NoProcessSlot => -1,
            Self::InvalidPid => -2,
            Self::InvalidSignal => -3,
            Self::InvalidChannel => -4,
            Self::NoChannelSlot => -5,
            Self::ChannelFull => -6,
            Self::ChannelEmpty => -7,
            Self::BadDescriptor => -8,
            Self::DescriptorTableFull => -9,
            Self::OpenFileTableFull => -10,
            Self::ActiveInodeTableFull => -11,
            Self::NotMounted => -12,
            Self::BadAddress => -13,
            Self::BadSeek => -14,
            Self::UnknownSyscall => -15,
            Self::Fs(e) => match e {
                FsError::NoSpace => -16,
                FsError::NoInodes => -17,
                FsError::NotFound => -18,
                FsError::NameTooLong => -19,
                FsError::DirectoryFull => -20,
                FsError::NotDirectory => -21,
                FsError::AlreadyExists => -22,
                FsError::BadSuperBlock => -23,
            },
        }
    }
}

impl From<FsError> for KernelError {
    fn from(e: FsError) -> Self {
        Self::Fs(e)
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoProcessSlot => write!(f, "no process slots"),
            Self::InvalidPid => write!(f, "pid out of range"),
            Self::InvalidSignal => write!(f, "unknown signal"),
            Self::InvalidChannel => write!(f, "channel out of range or unclaimed"),
            Self::NoChannelSlot => write!(f, "channel table full"),
            Self::ChannelFull => write!(f, "channel holds an unconsumed message"),
            Self::ChannelEmpty => write!(f, "channel has nothing to receive"),
            Self::BadDescriptor => write!(f, "descriptor not open"),
            Self::DescriptorTableFull => write!(f, "descriptor table full"),
            Self::OpenFileTableFull => write!(f, "open-file table full"),
            Self::ActiveInodeTableFull => write!(f, "active-inode table full"),
            Self::NotMounted => write!(f, "no mounted filesystem"),
            Self::BadAddress => write!(f, "buffer outside user memory"),
            Self::BadSeek => write!(f, "bad seek origin or offset"),
            Self::UnknownSyscall => write!(f, "unknown syscall id"),
            Self::Fs(e) => write!(f, "{e}"),
        }
    }
}
