//! # 磁盘数据结构层
//!
//! chain-fs 的磁盘布局：
//! 保留块 0 | 超级块 | inode 区域 | 数据区域
//!
//! 空闲数据块不设位图，而是组成**链块**链表：每个链块存 64 个地址，
//! 槽 0 指向下一个链块，链尾指回超级块地址作哨兵。

mod super_block;
pub use super_block::{SuperBlock, FREE_CACHE_SLOTS};

mod inode;
pub use inode::{DiskInode, DiskInodeKind};

/// 目录项，也属于磁盘文件系统数据结构
mod dir_entry;
pub use dir_entry::DirEntry;
pub use dir_entry::NAME_LIMIT;

use crate::BLOCK_SIZE;

/// 每个索引块连续存储的块地址个数
pub(crate) const INDIRECT_COUNT: usize = BLOCK_SIZE / 4;
/// 索引块：整个块连续存储块地址
pub(crate) type IndirectBlock = [u32; INDIRECT_COUNT];
