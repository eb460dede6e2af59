//! 64 字节的磁盘 inode 记录，每块打包 8 个。
//!
//! 块映射采用经典的索引分配：
//! - 前 11 块由直接槽编号；
//! - 三个间接槽依次为一级、二级、三级索引，
//!   每个索引块连续存储 128 个块地址。
//!
//! 空闲表回收的块可能残留链块数据，因此新挂载的
//! 数据块与索引块都先清零，文件空洞读出为零。

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::block_cache::BlockCacheManager;
use crate::layout::{IndirectBlock, INDIRECT_COUNT};
use crate::BlockDevice;
use crate::DataBlock;
use crate::BLOCK_SIZE;

/// 直接槽个数
const DIRECT_COUNT: usize = 11;
/// 间接槽个数：一级、二级、三级各一
const INDIRECT_SLOTS: usize = 3;

/// 一级索引可编号的数据块数
const INDIRECT1_COUNT: usize = INDIRECT_COUNT;
/// 二级索引可编号的数据块数
const INDIRECT2_COUNT: usize = INDIRECT_COUNT * INDIRECT_COUNT;

/// 仅用直接槽时的编号容量
const DIRECT_CAP: usize = DIRECT_COUNT;
/// 用上一级索引时的编号容量
const INDIRECT1_CAP: usize = DIRECT_CAP + INDIRECT1_COUNT;
/// 用上二级索引时的编号容量
const INDIRECT2_CAP: usize = INDIRECT1_CAP + INDIRECT2_COUNT;

/// 磁盘上的 inode 记录，恒为 64 字节
#[derive(Debug, Default, Clone)]
#[repr(C)]
pub struct DiskInode {
    pub kind: DiskInodeKind,
    /// 字节大小；不用 usize 是为了严控布局
    pub size: u32,
    /// 直接索引槽
    direct: [u32; DIRECT_COUNT],
    /// 间接索引槽；0 表示该级索引未建立（块 0 保留，不会被分配）
    indirect: [u32; INDIRECT_SLOTS],
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[repr(u32)]
pub enum DiskInodeKind {
    #[default]
    Unused = 0,
    /// 符号链接：仅声明类型，本文件系统不做解析
    Symlink = 1,
    Directory = 2,
    Regular = 3,
}

impl DiskInode {
    /// 每块的 inode 记录数
    pub const PER_BLOCK: usize = BLOCK_SIZE / core::mem::size_of::<Self>();
    /// 直接槽可覆盖的字节数；目录项只放在直接块里
    pub const DIRECT_BYTES: usize = DIRECT_COUNT * BLOCK_SIZE;

    #[inline]
    pub fn init(&mut self, kind: DiskInodeKind) {
        *self = Self {
            kind,
            ..Default::default()
        };
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == DiskInodeKind::Directory
    }

    /// 逻辑块索引翻译成块设备上的块ID
    pub fn block_id(
        &self,
        block_index: usize,
        cache: &BlockCacheManager,
        device: &Arc<dyn BlockDevice>,
    ) -> u32 {
        if block_index < DIRECT_CAP {
            return self.direct[block_index];
        }

        let index = block_index - DIRECT_CAP;
        if index < INDIRECT1_COUNT {
            return walk(cache, device, self.indirect[0], &[index]);
        }

        let index = index - INDIRECT1_COUNT;
        if index < INDIRECT2_COUNT {
            return walk(
                cache,
                device,
                self.indirect[1],
                &[index / INDIRECT1_COUNT, index % INDIRECT1_COUNT],
            );
        }

        let index = index - INDIRECT2_COUNT;
        walk(
            cache,
            device,
            self.indirect[2],
            &[
                index / INDIRECT2_COUNT,
                index % INDIRECT2_COUNT / INDIRECT1_COUNT,
                index % INDIRECT1_COUNT,
            ],
        )
    }

    /// 把 inode 扩到更大的字节大小。
    /// `new_blocks` 是预先从空闲表取好的未初始化块，
    /// 个数必须等于 [`Self::count_total_block`] 的增量。
    pub fn grow_to(
        &mut self,
        larger_size: u32,
        new_blocks: Vec<u32>,
        cache: &BlockCacheManager,
        device: &Arc<dyn BlockDevice>,
    ) {
        assert!(larger_size > self.size);
        let old_count = Self::count_data_block(self.size);
        let new_count = Self::count_data_block(larger_size);
        self.size = larger_size;

        let mut blocks = new_blocks.into_iter();
        for index in old_count..new_count {
            self.attach(index, &mut blocks, cache, device);
        }
        assert!(blocks.next().is_none(), "leftover preallocated blocks");
    }

    /// 挂上第 `block_index` 个数据块，顺带建立缺失的各级索引块
    fn attach(
        &mut self,
        block_index: usize,
        blocks: &mut impl Iterator<Item = u32>,
        cache: &BlockCacheManager,
        device: &Arc<dyn BlockDevice>,
    ) {
        let mut take = || {
            let block = blocks.next().expect("preallocated blocks exhausted");
            cache
                .get(block as usize, device)
                .lock()
                .map_mut(0, |data: &mut DataBlock| data.fill(0));
            block
        };

        if block_index < DIRECT_CAP {
            self.direct[block_index] = take();
            return;
        }

        // 根索引槽 + 逐级的块内索引
        let index = block_index - DIRECT_CAP;
        let (slot, path) = if index < INDIRECT1_COUNT {
            (0, [index, 0, 0])
        } else {
            let index = index - INDIRECT1_COUNT;
            if index < INDIRECT2_COUNT {
                (1, [index / INDIRECT1_COUNT, index % INDIRECT1_COUNT, 0])
            } else {
                let index = index - INDIRECT2_COUNT;
                (
                    2,
                    [
                        index / INDIRECT2_COUNT,
                        index % INDIRECT2_COUNT / INDIRECT1_COUNT,
                        index % INDIRECT1_COUNT,
                    ],
                )
            }
        };
        let depth = slot + 1;

        if self.indirect[slot] == 0 {
            self.indirect[slot] = take();
        }

        let mut block = self.indirect[slot];
        for &step in &path[..depth - 1] {
            let existing = cache
                .get(block as usize, device)
                .lock()
                .map(0, |ind: &IndirectBlock| ind[step]);
            block = if existing == 0 {
                let new = take();
                cache
                    .get(block as usize, device)
                    .lock()
                    .map_mut(0, |ind: &mut IndirectBlock| ind[step] = new);
                new
            } else {
                existing
            };
        }

        let leaf = take();
        cache
            .get(block as usize, device)
            .lock()
            .map_mut(0, |ind: &mut IndirectBlock| ind[path[depth - 1]] = leaf);
    }

    /// 清空 inode，返回其占用的全部数据块与索引块的ID
    pub fn clear(
        &mut self,
        cache: &BlockCacheManager,
        device: &Arc<dyn BlockDevice>,
    ) -> Vec<u32> {
        let data_blocks = Self::count_data_block(self.size);
        let mut dropped = Vec::with_capacity(Self::count_total_block(self.size));

        for index in 0..data_blocks {
            dropped.push(self.block_id(index, cache, device));
        }

        if data_blocks > DIRECT_CAP {
            dropped.push(self.indirect[0]);
        }

        if data_blocks > INDIRECT1_CAP {
            let leaves = data_blocks - INDIRECT1_CAP;
            let level1 = leaves.min(INDIRECT2_COUNT).div_ceil(INDIRECT1_COUNT);
            dropped.push(self.indirect[1]);
            cache
                .get(self.indirect[1] as usize, device)
                .lock()
                .map(0, |ind2: &IndirectBlock| {
                    dropped.extend_from_slice(&ind2[..level1]);
                });
        }

        if data_blocks > INDIRECT2_CAP {
            let leaves = data_blocks - INDIRECT2_CAP;
            let level2 = leaves.div_ceil(INDIRECT2_COUNT);
            dropped.push(self.indirect[2]);

            for k in 0..level2 {
                let l2_block = cache
                    .get(self.indirect[2] as usize, device)
                    .lock()
                    .map(0, |ind3: &IndirectBlock| ind3[k]);
                dropped.push(l2_block);

                let under = (leaves - k * INDIRECT2_COUNT).min(INDIRECT2_COUNT);
                let level1 = under.div_ceil(INDIRECT1_COUNT);
                cache
                    .get(l2_block as usize, device)
                    .lock()
                    .map(0, |ind2: &IndirectBlock| {
                        dropped.extend_from_slice(&ind2[..level1]);
                    });
            }
        }

        self.size = 0;
        self.direct = [0; DIRECT_COUNT];
        self.indirect = [0; INDIRECT_SLOTS];

        dropped
    }

    /// 从指定位置（字节偏移）读出数据填充 `buf`
    pub fn read_at(
        &self,
        offset: usize,
        buf: &mut [u8],
        cache: &BlockCacheManager,
        device: &Arc<dyn BlockDevice>,
    ) -> usize {
        let mut start = offset;
        let end = (start + buf.len()).min(self.size as usize);

        if start >= end {
            return 0;
        }

        let mut read_size = 0;
        loop {
            let block_index = start / BLOCK_SIZE;
            let current_block_end = ((block_index + 1) * BLOCK_SIZE).min(end);
            let block_read_size = current_block_end - start;
            let dest = &mut buf[read_size..read_size + block_read_size];

            cache
                .get(self.block_id(block_index, cache, device) as usize, device)
                .lock()
                .map(0, |data_block: &DataBlock| {
                    let src = &data_block[start % BLOCK_SIZE..start % BLOCK_SIZE + block_read_size];
                    dest.copy_from_slice(src);
                });

            read_size += block_read_size;

            if current_block_end == end {
                break;
            }
            start = current_block_end;
        }

        read_size
    }

    /// 向指定位置写入 `buf`；写入范围必须先通过 [`Self::grow_to`] 纳入大小
    pub fn write_at(
        &mut self,
        offset: usize,
        buf: &[u8],
        cache: &BlockCacheManager,
        device: &Arc<dyn BlockDevice>,
    ) -> usize {
        let mut start = offset;
        let end = (start + buf.len()).min(self.size as usize);

        if start >= end {
            return 0;
        }

        let mut written_size = 0;
        loop {
            let block_index = start / BLOCK_SIZE;
            let current_block_end = ((block_index + 1) * BLOCK_SIZE).min(end);
            let block_write_size = current_block_end - start;

            cache
                .get(self.block_id(block_index, cache, device) as usize, device)
                .lock()
                .map_mut(0, |data_block: &mut DataBlock| {
                    let src = &buf[written_size..written_size + block_write_size];
                    let dest =
                        &mut data_block[start % BLOCK_SIZE..start % BLOCK_SIZE + block_write_size];
                    dest.copy_from_slice(src);
                });

            written_size += block_write_size;

            if current_block_end == end {
                break;
            }
            start = current_block_end;
        }

        written_size
    }

    /// 计算容纳指定数据量需要多少个**数据块**
    #[inline]
    pub fn count_data_block(size: u32) -> usize {
        (size as usize).div_ceil(BLOCK_SIZE)
    }

    /// 计算容纳指定数据量需要的**数据块**与**索引块**总数
    pub fn count_total_block(size: u32) -> usize {
        let data = Self::count_data_block(size);
        let mut total = data;

        if data > DIRECT_CAP {
            total += 1;
        }
        if data > INDIRECT1_CAP {
            let leaves = data - INDIRECT1_CAP;
            total += 1 + leaves.min(INDIRECT2_COUNT).div_ceil(INDIRECT1_COUNT);
        }
        if data > INDIRECT2_CAP {
            let leaves = data - INDIRECT2_CAP;
            total += 1 + leaves.div_ceil(INDIRECT2_COUNT) + leaves.div_ceil(INDIRECT1_COUNT);
        }

        total
    }
}

/// 顺着各级索引块读出叶子的块ID
fn walk(
    cache: &BlockCacheManager,
    device: &Arc<dyn BlockDevice>,
    mut block: u32,
    path: &[usize],
) -> u32 {
    for &index in path {
        block = cache
            .get(block as usize, device)
            .lock()
            .map(0, |ind: &IndirectBlock| ind[index]);
    }
    block
}
