//! 文件系统错误分类：资源耗尽与路径错误。
//! 全部以 `Result` 返回给调用者，不会使内核进入致命状态。

use core::fmt;

pub type FsResult<T> = Result<T, FsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// 空闲数据块耗尽
    NoSpace,
    /// inode 区没有空闲记录
    NoInodes,
    /// 路径组件缺失
    NotFound,
    /// 文件名超出目录项的名字缓冲
    NameTooLong,
    /// 目录已占满全部直接块
    DirectoryFull,
    /// 以文件为中间路径组件
    NotDirectory,
    /// 同名项已存在
    AlreadyExists,
    /// 超级块校验失败，磁盘未格式化或已损坏
    BadSuperBlock,
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::NoSpace => "no free data blocks",
            Self::NoInodes => "inode table exhausted",
            Self::NotFound => "no such path",
            Self::NameTooLong => "name too long",
            Self::DirectoryFull => "directory full",
            Self::NotDirectory => "not a directory",
            Self::AlreadyExists => "already exists",
            Self::BadSuperBlock => "bad superblock",
        };
        f.write_str(msg)
    }
}
