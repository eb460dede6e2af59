#![no_std]

extern crate alloc;

/* chain-fs 的整体架构，自上而下 */

// 索引节点层：文件查找、创建、路径解析、读写等操作
mod vfs;
pub use vfs::{Inode, Resolved};

// 磁盘块管理器层：超级块、链式空闲表、inode 记录的定位与分配
mod chain;
pub use chain::{ChainFileSystem, SUPER_BLOCK_ID, TOTAL_BLOCKS};

// 磁盘数据结构层：表示磁盘文件系统的数据结构
mod layout;
pub use layout::{DirEntry, DiskInode, DiskInodeKind, NAME_LIMIT};

// 块缓存层：内存上的磁盘块数据缓存
mod block_cache;
pub use block_cache::BlockCacheManager;

// 磁盘块设备接口层：读写磁盘块设备的接口
mod block_dev;
pub use block_dev::BlockDevice;

mod error;
pub use error::{FsError, FsResult};

pub const MAGIC: u32 = 0x63667331;
pub const BLOCK_SIZE: usize = 512;

type DataBlock = [u8; BLOCK_SIZE];
