//! # 索引节点层
//!
//! 位于内存的虚拟文件系统，确立了文件系统的操作逻辑：
//! 通过多个 [`Inode`] 形成文件树，根目录是一切路径的起点。
//!
//! 路径解析的规则：中间组件缺失是硬失败，不会留下任何新文件；
//! 末组件缺失则就地创建普通文件，结果用 [`Resolved`] 区分命中与新建。

use alloc::sync::Arc;
use alloc::vec::Vec;

use spin::Mutex;

use crate::block_cache::BlockCacheManager;
use crate::chain::{ChainFileSystem, ROOT_INO};
use crate::error::{FsError, FsResult};
use crate::layout::{DirEntry, DiskInode, DiskInodeKind, NAME_LIMIT};
use crate::BlockDevice;

/// 目录项的容量上限：目录数据只放在直接块里
const DIR_BYTES_LIMIT: usize = DiskInode::DIRECT_BYTES;

#[derive(Clone)]
pub struct Inode {
    /// inode 编号
    ino: u32,
    /// inode 记录所在块
    block_id: usize,
    /// 记录的块内偏移
    block_offset: usize,
    fs: Arc<Mutex<ChainFileSystem>>,
    cache: Arc<BlockCacheManager>,
    device: Arc<dyn BlockDevice>,
}

/// 路径解析的结果，记下末组件是命中还是新建
pub enum Resolved {
    Found(Inode),
    Created(Inode),
}

impl Resolved {
    #[inline]
    pub fn inode(self) -> Inode {
        match self {
            Self::Found(inode) | Self::Created(inode) => inode,
        }
    }

    #[inline]
    pub fn created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

impl Inode {
    /// 根目录的句柄
    pub fn root(fs: &Arc<Mutex<ChainFileSystem>>) -> Self {
        let guard = fs.lock();
        let (block_id, block_offset) = guard.disk_inode_pos(ROOT_INO);
        let cache = guard.cache().clone();
        let device = guard.device().clone();
        drop(guard);

        Self {
            ino: ROOT_INO,
            block_id: block_id as usize,
            block_offset,
            fs: fs.clone(),
            cache,
            device,
        }
    }

    #[inline]
    pub fn ino(&self) -> u32 {
        self.ino
    }

    pub fn size(&self) -> u32 {
        let _fs = self.fs.lock();
        self.on_disk(|disk_inode| disk_inode.size)
    }

    pub fn kind(&self) -> DiskInodeKind {
        let _fs = self.fs.lock();
        self.on_disk(|disk_inode| disk_inode.kind)
    }

    pub fn is_dir(&self) -> bool {
        self.kind() == DiskInodeKind::Directory
    }

    /// 根据文件名获取子 inode
    pub fn find(&self, name: &str) -> Option<Inode> {
        let fs = self.fs.lock();
        self.on_disk(|disk_inode| {
            self.get(disk_inode, name)
                .map(|inode_id| self.inode(&fs, inode_id))
        })
    }

    /// 在当前目录下创建子 inode
    pub fn create(&self, name: &str, kind: DiskInodeKind) -> FsResult<Inode> {
        let mut fs = self.fs.lock();

        if name.is_empty() || name.len() > NAME_LIMIT {
            return Err(FsError::NameTooLong);
        }
        // 确认没有已创建的同名项
        if self.on_disk(|dir: &DiskInode| self.get(dir, name)).is_some() {
            return Err(FsError::AlreadyExists);
        }

        // 先要到槽位，再消耗 inode 记录；
        // 目录扩容后分配失败只多出一个空槽，无需回滚
        let slot = self.find_or_new_slot(&mut fs)?;
        let inode_id = fs.alloc_inode(kind)?;
        let dir_entry = DirEntry::new(name, inode_id)?;
        self.on_disk_mut(|dir| {
            dir.write_at(slot, dir_entry.as_bytes(), &self.cache, &self.device);
        });

        self.cache.sync_all();
        Ok(self.inode(&fs, inode_id))
    }

    /// 从根起解析一条以 `/` 分隔的路径。
    ///
    /// 中间组件必须是已存在的目录；末组件缺失时创建普通文件。
    pub fn resolve(&self, path: &str) -> FsResult<Resolved> {
        let mut components = path.split('/').filter(|c| !c.is_empty());
        let mut dir = self.clone();

        let Some(mut name) = components.next() else {
            return Ok(Resolved::Found(dir));
        };

        for next in components {
            let child = dir.find(name).ok_or(FsError::NotFound)?;
            if !child.is_dir() {
                return Err(FsError::NotDirectory);
            }
            dir = child;
            name = next;
        }

        match dir.find(name) {
            Some(inode) => Ok(Resolved::Found(inode)),
            None => Ok(Resolved::Created(
                dir.create(name, DiskInodeKind::Regular)?,
            )),
        }
    }

    /// 删除目录项，子 inode 的数据块与记录一并归还空闲表
    pub fn unlink(&self, name: &str) -> FsResult<()> {
        let mut fs = self.fs.lock();

        let inode_id = self
            .on_disk_mut(|dir| self.remove(dir, name))
            .ok_or(FsError::NotFound)?;

        let child = self.inode(&fs, inode_id);
        child.internal_clear(&mut fs);
        fs.free_inode(inode_id);

        self.cache.sync_all();
        Ok(())
    }

    pub fn read_at(&self, offset: usize, buf: &mut [u8]) -> usize {
        let _fs = self.fs.lock();
        self.on_disk(|disk_inode| disk_inode.read_at(offset, buf, &self.cache, &self.device))
    }

    /// 向指定偏移写入，必要时向空闲表要块扩容。
    /// 空间不足时文件保持原样，一块也不多占。
    pub fn write_at(&self, offset: usize, buf: &[u8]) -> FsResult<usize> {
        let mut fs = self.fs.lock();

        let end = (offset + buf.len()) as u32;
        if end > self.on_disk(|disk_inode: &DiskInode| disk_inode.size) {
            self.expand_to(end, &mut fs)?;
        }
        let size =
            self.on_disk_mut(|disk_inode| disk_inode.write_at(offset, buf, &self.cache, &self.device));

        self.cache.sync_all();
        Ok(size)
    }

    /// 截断到零长，占用的数据块与索引块全数归还
    pub fn clear(&self) {
        let mut fs = self.fs.lock();
        self.internal_clear(&mut fs);
        self.cache.sync_all();
    }
}

impl Inode {
    /// 读取对磁盘的映射并处理
    fn on_disk<V>(&self, f: impl FnOnce(&DiskInode) -> V) -> V {
        self.cache
            .get(self.block_id, &self.device)
            .lock()
            .map(self.block_offset, f)
    }

    /// 以某种方式修改对磁盘的映射
    fn on_disk_mut<V>(&self, f: impl FnOnce(&mut DiskInode) -> V) -> V {
        self.cache
            .get(self.block_id, &self.device)
            .lock()
            .map_mut(self.block_offset, f)
    }

    /// 在 DiskInode 下通过名字获取目录项的 inode ID
    fn get(&self, disk_inode: &DiskInode, name: &str) -> Option<u32> {
        assert!(disk_inode.is_dir());
        let size = disk_inode.size as usize;
        let mut dir_entry = DirEntry::default();

        for offset in (0..size).step_by(DirEntry::SIZE) {
            assert_eq!(
                disk_inode.read_at(offset, dir_entry.as_bytes_mut(), &self.cache, &self.device),
                DirEntry::SIZE
            );
            if !dir_entry.is_empty() && dir_entry.name() == name {
                return Some(dir_entry.inode_id());
            }
        }

        None
    }

    /// 在 DiskInode 下通过名字删除目录项并返回其 inode ID
    fn remove(&self, disk_inode: &mut DiskInode, name: &str) -> Option<u32> {
        assert!(disk_inode.is_dir());
        let size = disk_inode.size as usize;
        let mut dir_entry = DirEntry::default();

        for offset in (0..size).step_by(DirEntry::SIZE) {
            assert_eq!(
                disk_inode.read_at(offset, dir_entry.as_bytes_mut(), &self.cache, &self.device),
                DirEntry::SIZE
            );
            if !dir_entry.is_empty() && dir_entry.name() == name {
                disk_inode.write_at(offset, &[0; DirEntry::SIZE], &self.cache, &self.device);
                return Some(dir_entry.inode_id());
            }
        }

        None
    }

    /// 在当前目录的数据当中寻找空槽位；找不到就扩出新槽位
    fn find_or_new_slot(&self, fs: &mut ChainFileSystem) -> FsResult<usize> {
        let size = self.on_disk(|dir: &DiskInode| {
            assert!(dir.is_dir());
            dir.size
        }) as usize;
        let mut dir_entry = DirEntry::default();

        for offset in (0..size).step_by(DirEntry::SIZE) {
            let hit = self.on_disk(|dir: &DiskInode| {
                assert_eq!(
                    dir.read_at(offset, dir_entry.as_bytes_mut(), &self.cache, &self.device),
                    DirEntry::SIZE
                );
                dir_entry.is_empty()
            });
            if hit {
                return Ok(offset);
            }
        }

        if size + DirEntry::SIZE > DIR_BYTES_LIMIT {
            return Err(FsError::DirectoryFull);
        }
        self.expand_to((size + DirEntry::SIZE) as u32, fs)?;
        Ok(size)
    }

    /// 把 inode 扩到更大的字节大小，所需块先从空闲表取齐
    fn expand_to(&self, larger_size: u32, fs: &mut ChainFileSystem) -> FsResult<()> {
        let size = self.on_disk(|disk_inode: &DiskInode| disk_inode.size);
        assert!(larger_size > size);

        let needed = DiskInode::count_total_block(larger_size) - DiskInode::count_total_block(size);
        let new_blocks = fs.alloc_many(needed)?;
        self.on_disk_mut(|disk_inode| {
            disk_inode.grow_to(larger_size, new_blocks, &self.cache, &self.device)
        });

        Ok(())
    }

    fn internal_clear(&self, fs: &mut ChainFileSystem) {
        let dropped: Vec<u32> =
            self.on_disk_mut(|disk_inode| disk_inode.clear(&self.cache, &self.device));
        for block in dropped {
            fs.dealloc_data(block);
        }
    }

    /// 凭借编号获取 Inode
    #[inline]
    fn inode(&self, fs: &ChainFileSystem, ino: u32) -> Inode {
        let (block_id, block_offset) = fs.disk_inode_pos(ino);
        Self {
            ino,
            block_id: block_id as usize,
            block_offset,
            fs: self.fs.clone(),
            cache: self.cache.clone(),
            device: self.device.clone(),
        }
    }
}
