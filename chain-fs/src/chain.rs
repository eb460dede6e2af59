//! # 磁盘块管理器层
//!
//! 构建出磁盘的布局并使用：
//! 格式化、挂载、链式空闲表的分配与回收、inode 记录的定位与分配。
//!
//! ## 链式空闲表
//!
//! 空闲数据块的地址存在一串**链块**里，每个链块 64 个槽：
//! 槽 0 指向下一个链块，其余 63 个槽是空闲地址；链尾的槽 0
//! 指回超级块地址作哨兵。超级块在内存里缓冲其中一段
//! （`free_cache`），多数分配与回收不触磁盘，只有跨越链块边界时
//! 才多付一次磁盘读写。无论盘有多大，空闲表占用的内存恒为
//! 一个 64 槽数组。

use core::mem;

use alloc::sync::Arc;
use alloc::vec::Vec;
use spin::Mutex;

use crate::block_cache::BlockCacheManager;
use crate::error::{FsError, FsResult};
use crate::layout::{DiskInode, DiskInodeKind, SuperBlock, FREE_CACHE_SLOTS};
use crate::BlockDevice;
use crate::DataBlock;

/// 超级块的块ID；块 0 保留
pub const SUPER_BLOCK_ID: u32 = 1;

/// 根目录的 inode 号
pub(crate) const ROOT_INO: u32 = 0;

/* 格式化的几何参数是固化的，不由用户配置 */

/// 文件系统占据的总块数
pub const TOTAL_BLOCKS: u32 = 2048;
/// inode 区域首块
const INODE_AREA_START: u32 = 2;
/// inode 总数
const INODE_COUNT: u32 = 512;
/// 数据区域首块
const DATA_AREA_START: u32 = INODE_AREA_START + INODE_COUNT / DiskInode::PER_BLOCK as u32;
/// 数据区域块数
const DATA_BLOCK_COUNT: u32 = TOTAL_BLOCKS - DATA_AREA_START;

/// 链块：64 个地址槽，槽 0 为链接
type ChainBlock = [u32; FREE_CACHE_SLOTS];

pub struct ChainFileSystem {
    device: Arc<dyn BlockDevice>,
    cache: Arc<BlockCacheManager>,
    /// 超级块的内存副本，变动时经块缓存写回
    sb: SuperBlock,
}

impl ChainFileSystem {
    /// 格式化块设备并挂载。
    ///
    /// 数据区被切成链块与散块：前 `DATA_BLOCK_COUNT / 64` 块作链块，
    /// 每块携带 63 个空闲地址；余数地址直接进内存缓存。
    /// 分配到穷尽恰好吐出 `DATA_BLOCK_COUNT` 个互异地址。
    pub fn format(device: Arc<dyn BlockDevice>) -> Arc<Mutex<Self>> {
        let cache = Arc::new(BlockCacheManager::new());

        // inode 区域清零，全部记录读出为 Unused
        for block in INODE_AREA_START..DATA_AREA_START {
            cache
                .get(block as usize, &device)
                .lock()
                .map_mut(0, |data: &mut DataBlock| data.fill(0));
        }

        let chain_count = DATA_BLOCK_COUNT / FREE_CACHE_SLOTS as u32;
        let residue = DATA_BLOCK_COUNT % FREE_CACHE_SLOTS as u32;
        // 链块携带的地址从此起步
        let payload_start = DATA_AREA_START + chain_count;

        for i in 0..chain_count {
            let mut chain: ChainBlock = [0; FREE_CACHE_SLOTS];
            chain[0] = if i + 1 == chain_count {
                SUPER_BLOCK_ID
            } else {
                DATA_AREA_START + i + 1
            };
            for j in 0..FREE_CACHE_SLOTS as u32 - 1 {
                chain[(j + 1) as usize] = payload_start + i * 63 + j;
            }

            cache
                .get((DATA_AREA_START + i) as usize, &device)
                .lock()
                .map_mut(0, |block: &mut ChainBlock| *block = chain);
        }

        // 余数地址进内存缓存；没有链块时链接直接收尾
        let mut free_cache = [0; FREE_CACHE_SLOTS];
        free_cache[0] = if chain_count == 0 {
            SUPER_BLOCK_ID
        } else {
            DATA_AREA_START
        };
        for k in 0..residue {
            free_cache[(k + 1) as usize] = payload_start + chain_count * 63 + k;
        }

        let mut fs = Self {
            device: device.clone(),
            cache,
            sb: SuperBlock::new(
                TOTAL_BLOCKS,
                INODE_AREA_START,
                INODE_COUNT,
                DATA_AREA_START,
                DATA_BLOCK_COUNT,
                residue,
                free_cache,
            ),
        };
        fs.sync_super();

        // 根目录占据 0 号 inode
        assert!(matches!(
            fs.alloc_inode(DiskInodeKind::Directory),
            Ok(ROOT_INO)
        ));
        fs.cache.sync_all();

        log::info!("formatted: {TOTAL_BLOCKS} blocks, {INODE_COUNT} inodes, {DATA_BLOCK_COUNT} data blocks");

        Arc::new(Mutex::new(fs))
    }

    /// 从块设备读入超级块并挂载
    pub fn load(device: Arc<dyn BlockDevice>) -> FsResult<Arc<Mutex<Self>>> {
        let cache = Arc::new(BlockCacheManager::new());
        let sb = cache
            .get(SUPER_BLOCK_ID as usize, &device)
            .lock()
            .map(0, |sb: &SuperBlock| sb.clone());

        if !sb.is_valid() {
            return Err(FsError::BadSuperBlock);
        }

        Ok(Arc::new(Mutex::new(Self { device, cache, sb })))
    }

    /// 分配一个空闲数据块
    pub fn alloc_data(&mut self) -> FsResult<u32> {
        let head = self.sb.free_head as usize;
        if head > 0 {
            let addr = self.sb.free_cache[head];
            self.sb.free_head -= 1;
            self.sync_super();
            return Ok(addr);
        }

        // 缓存耗尽：链接等于超级块地址即无空间可用
        let link = self.sb.free_cache[0];
        if link == SUPER_BLOCK_ID {
            return Err(FsError::NoSpace);
        }

        // 装入下一个链块的 64 个槽，链块自身就是本次的分配结果
        let (cache, device) = (self.cache.clone(), self.device.clone());
        cache
            .get(link as usize, &device)
            .lock()
            .map(0, |chain: &ChainBlock| self.sb.free_cache = *chain);
        self.sb.free_head = FREE_CACHE_SLOTS as u32 - 1;
        self.sync_super();

        Ok(link)
    }

    /// 归还一个数据块到空闲表
    pub fn dealloc_data(&mut self, addr: u32) {
        if (self.sb.free_head as usize) < FREE_CACHE_SLOTS - 1 {
            self.sb.free_head += 1;
            self.sb.free_cache[self.sb.free_head as usize] = addr;
        } else {
            // 缓存已满：整个缓存落盘到被释放块，它成为新的链头
            let (cache, device) = (self.cache.clone(), self.device.clone());
            cache
                .get(addr as usize, &device)
                .lock()
                .map_mut(0, |chain: &mut ChainBlock| *chain = self.sb.free_cache);

            self.sb.free_cache = [0; FREE_CACHE_SLOTS];
            self.sb.free_cache[0] = addr;
            self.sb.free_head = 0;
        }
        self.sync_super();
    }

    /// 在磁盘上分配新的 inode 记录并返回其编号。
    /// 线性扫描第一个 Unused 记录，不维护空闲 inode 位图。
    pub fn alloc_inode(&mut self, kind: DiskInodeKind) -> FsResult<u32> {
        let (cache, device) = (self.cache.clone(), self.device.clone());
        let per_block = DiskInode::PER_BLOCK as u32;

        for block in 0..self.sb.inode_count / per_block {
            let block_id = (self.sb.inode_area_start + block) as usize;
            let found = cache
                .get(block_id, &device)
                .lock()
                .map_mut(0, |records: &mut [DiskInode; DiskInode::PER_BLOCK]| {
                    records.iter_mut().position(|r| r.kind == DiskInodeKind::Unused).map(
                        |slot| {
                            records[slot].init(kind);
                            block * per_block + slot as u32
                        },
                    )
                });

            if let Some(ino) = found {
                return Ok(ino);
            }
        }

        Err(FsError::NoInodes)
    }

    /// 把 inode 记录标回 Unused，编号可被重新分配
    pub fn free_inode(&mut self, ino: u32) {
        let (block_id, offset) = self.disk_inode_pos(ino);
        let (cache, device) = (self.cache.clone(), self.device.clone());
        cache
            .get(block_id as usize, &device)
            .lock()
            .map_mut(offset, |record: &mut DiskInode| *record = DiskInode::default());
    }

    /// 读出 inode 记录的内存副本
    pub fn read_inode(&self, ino: u32) -> DiskInode {
        let (block_id, offset) = self.disk_inode_pos(ino);
        self.cache
            .get(block_id as usize, &self.device)
            .lock()
            .map(offset, |record: &DiskInode| record.clone())
    }

    /// 通过编号获取 inode 记录在磁盘上的位置：**块ID**以及**块内偏移**
    pub fn disk_inode_pos(&self, ino: u32) -> (u32, usize) {
        let per_block = DiskInode::PER_BLOCK as u32;
        let block_id = self.sb.inode_area_start + ino / per_block;
        let offset = ino as usize % DiskInode::PER_BLOCK * mem::size_of::<DiskInode>();

        (block_id, offset)
    }

    #[inline]
    pub fn cache(&self) -> &Arc<BlockCacheManager> {
        &self.cache
    }

    #[inline]
    pub fn device(&self) -> &Arc<dyn BlockDevice> {
        &self.device
    }

    /// 为 inode 的扩容预取数据块
    pub(crate) fn alloc_many(&mut self, count: usize) -> FsResult<Vec<u32>> {
        let mut blocks = Vec::with_capacity(count);
        for _ in 0..count {
            match self.alloc_data() {
                Ok(block) => blocks.push(block),
                Err(e) => {
                    // 失败不吞块：已取的全数归还
                    for block in blocks {
                        self.dealloc_data(block);
                    }
                    return Err(e);
                }
            }
        }
        Ok(blocks)
    }

    /// 超级块副本经块缓存写回
    fn sync_super(&self) {
        self.cache
            .get(SUPER_BLOCK_ID as usize, &self.device)
            .lock()
            .map_mut(0, |sb: &mut SuperBlock| *sb = self.sb.clone());
    }
}
