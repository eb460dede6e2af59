use crate::MAGIC;

/// 空闲缓存槽数。槽 0 固定存放链块指针，
/// 缓冲的空闲地址位于 `1..=free_head`。
pub const FREE_CACHE_SLOTS: usize = 64;

/// 超级块：
/// - 提供文件系统合法性校验；
/// - 定位 inode 区域与数据区域；
/// - 携带空闲块缓存，即磁盘链表的截断视图
#[derive(Debug, Clone)]
#[repr(C)]
pub struct SuperBlock {
    /// 魔数：用于校验文件系统合法性
    magic: u32,
    /// 文件系统占据块数
    pub total_blocks: u32,
    /// inode 区域首块
    pub inode_area_start: u32,
    /// inode 总数，每块 8 个记录
    pub inode_count: u32,
    /// 数据区域首块
    pub data_area_start: u32,
    /// 数据区域块数
    pub data_blocks: u32,
    /// 缓冲的空闲地址个数，`0 ..= 63`；0 表示缓存耗尽
    pub free_head: u32,
    /// 空闲块缓存；`free_cache[0]` 链向下一个链块，
    /// 等于超级块自身地址时表示链已到尽头
    pub free_cache: [u32; FREE_CACHE_SLOTS],
}

impl SuperBlock {
    #[allow(clippy::too_many_arguments)]
    #[inline]
    pub fn new(
        total_blocks: u32,
        inode_area_start: u32,
        inode_count: u32,
        data_area_start: u32,
        data_blocks: u32,
        free_head: u32,
        free_cache: [u32; FREE_CACHE_SLOTS],
    ) -> Self {
        Self {
            magic: MAGIC,
            total_blocks,
            inode_area_start,
            inode_count,
            data_area_start,
            data_blocks,
            free_head,
            free_cache,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }
}
