//! # 内核文件系统层
//!
//! ## 分层（自上而下）
//!
//! 1. 系统调用层
//! 2. 文件描述符层：每进程的小整数表
//! 3. 打开文件层：全局表，持有活动 inode 槽位与读写游标
//! 4. 活动 inode 表：跨进程共享的 inode 句柄缓存，带使用计数
//! 5. `chain-fs` 的索引节点层及以下
//!
//! 打开失败时不留半截链接；进程终止时描述符全数回收，
//! 使用计数归零的活动 inode 留在缓存里，槽位紧张时才被换出。

use alloc::sync::Arc;

use chain_fs::{ChainFileSystem, Inode};
use enumflags2::{bitflags, BitFlags};

use crate::config::FD_LIMIT;
use crate::error::{KernelError, KernelResult};
use crate::Kernel;

/// 打开文件的模式标志
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFlag {
    /// 只写
    WRONLY = 0b01,
    /// 读写兼备
    RDWR = 0b10,
    /// 先截断到零长，再交给用户
    TRUNC = 0b100,
}

impl OpenFlag {
    // enumflags2 拒绝值为 0 的标志
    /// 只读
    pub const RDONLY: u32 = 0;
}

/// 游标起算点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekFrom {
    Set = 0,
    Cur = 1,
    End = 2,
}

impl TryFrom<u32> for SeekFrom {
    type Error = KernelError;

    fn try_from(value: u32) -> KernelResult<Self> {
        match value {
            0 => Ok(Self::Set),
            1 => Ok(Self::Cur),
            2 => Ok(Self::End),
            _ => Err(KernelError::BadSeek),
        }
    }
}

/// 活动 inode 表的表项：同一 inode 的所有打开文件共享一份
pub(crate) struct ActiveInode {
    pub ino: u32,
    /// 引用它的打开文件数；归零不立刻换出
    pub uses: u32,
    pub inode: Inode,
}

/// 全局打开文件表的表项
#[derive(Debug, Clone, Copy)]
pub(crate) struct OpenFile {
    /// 活动 inode 表的槽位
    pub inode_slot: usize,
    /// 字节读写游标
    pub cursor: usize,
    pub readable: bool,
    pub writable: bool,
}

impl Kernel {
    /// 打开（必要时创建）一个文件，返回描述符。
    ///
    /// 依次确保：空闲描述符 → 路径可解析 → 活动 inode 槽位 →
    /// 打开文件槽位，全部到手才建立链接。
    pub fn open(&mut self, path: &str, flags: BitFlags<OpenFlag>) -> KernelResult<u32> {
        let fs = self.fs.clone().ok_or(KernelError::NotMounted)?;

        let fd = self.procs[self.current]
            .fd_table
            .iter()
            .position(|d| d.is_none())
            .ok_or(KernelError::DescriptorTableFull)?;

        let inode = Inode::root(&fs).resolve(path)?.inode();
        let inode_slot = self.active_slot(inode)?;

        let open_slot = self
            .open_files
            .iter()
            .position(|o| o.is_none())
            .ok_or(KernelError::OpenFileTableFull)?;

        self.open_files[open_slot] = Some(OpenFile {
            inode_slot,
            cursor: 0,
            readable: !flags.contains(OpenFlag::WRONLY) || flags.contains(OpenFlag::RDWR),
            writable: flags.intersects(OpenFlag::WRONLY | OpenFlag::RDWR),
        });
        if let Some(active) = self.active_inodes[inode_slot].as_mut() {
            active.uses += 1;
        }
        self.procs[self.current].fd_table[fd] = Some(open_slot);

        if flags.contains(OpenFlag::TRUNC) {
            self.shared_inode(open_slot)?.clear();
        }
        Ok(fd as u32)
    }

    /// 关闭描述符，打开文件槽位立即可复用
    pub fn close(&mut self, fd: u32) -> KernelResult<()> {
        let open_slot = self.descriptor(fd)?;
        self.procs[self.current].fd_table[fd as usize] = None;
        self.drop_open_file(open_slot);
        Ok(())
    }

    /// 从游标处读，游标前进实际读到的字节数
    pub fn fd_read(&mut self, fd: u32, buf: &mut [u8]) -> KernelResult<usize> {
        let open_slot = self.descriptor(fd)?;
        let file = self.open_files[open_slot].ok_or(KernelError::BadDescriptor)?;
        if !file.readable {
            return Err(KernelError::BadDescriptor);
        }

        let n = self.shared_inode(open_slot)?.read_at(file.cursor, buf);
        if let Some(file) = self.open_files[open_slot].as_mut() {
            file.cursor += n;
        }
        Ok(n)
    }

    /// 向游标处写，文件按需扩容，游标前进写入的字节数
    pub fn fd_write(&mut self, fd: u32, buf: &[u8]) -> KernelResult<usize> {
        let open_slot = self.descriptor(fd)?;
        let file = self.open_files[open_slot].ok_or(KernelError::BadDescriptor)?;
        if !file.writable {
            return Err(KernelError::BadDescriptor);
        }

        let n = self.shared_inode(open_slot)?.write_at(file.cursor, buf)?;
        if let Some(file) = self.open_files[open_slot].as_mut() {
            file.cursor += n;
        }
        Ok(n)
    }

    /// 移动游标，返回移动后的绝对位置
    pub fn lseek(&mut self, fd: u32, offset: i32, whence: SeekFrom) -> KernelResult<u32> {
        let open_slot = self.descriptor(fd)?;
        let file = self.open_files[open_slot].ok_or(KernelError::BadDescriptor)?;

        let base = match whence {
            SeekFrom::Set => 0,
            SeekFrom::Cur => file.cursor as i64,
            SeekFrom::End => self.shared_inode(open_slot)?.size() as i64,
        };
        let cursor = base + offset as i64;
        if cursor < 0 || cursor > u32::MAX as i64 {
            return Err(KernelError::BadSeek);
        }

        if let Some(file) = self.open_files[open_slot].as_mut() {
            file.cursor = cursor as usize;
        }
        Ok(cursor as u32)
    }

    /// 游标的当前位置
    pub fn tell(&self, fd: u32) -> KernelResult<u32> {
        let open_slot = self.descriptor(fd)?;
        let file = self.open_files[open_slot].ok_or(KernelError::BadDescriptor)?;
        Ok(file.cursor as u32)
    }

    /// 回收进程的整张描述符表；终止路径（exit/kill/停机）都经此
    pub(crate) fn release_descriptors(&mut self, pid: usize) {
        for fd in 0..FD_LIMIT {
            if let Some(open_slot) = self.procs[pid].fd_table[fd].take() {
                self.drop_open_file(open_slot);
            }
        }
    }

    /// 在活动 inode 表里找到或缓存该 inode。
    /// 表满时优先换出一个使用计数为零的缓存项。
    fn active_slot(&mut self, inode: Inode) -> KernelResult<usize> {
        let ino = inode.ino();
        if let Some(slot) = self
            .active_inodes
            .iter()
            .position(|a| a.as_ref().is_some_and(|a| a.ino == ino))
        {
            return Ok(slot);
        }

        let slot = self
            .active_inodes
            .iter()
            .position(|a| a.is_none())
            .or_else(|| {
                self.active_inodes
                    .iter()
                    .position(|a| a.as_ref().is_some_and(|a| a.uses == 0))
            })
            .ok_or(KernelError::ActiveInodeTableFull)?;
        self.active_inodes[slot] = Some(ActiveInode {
            ino,
            uses: 0,
            inode,
        });
        Ok(slot)
    }

    fn drop_open_file(&mut self, open_slot: usize) {
        let Some(file) = self.open_files[open_slot].take() else {
            return;
        };
        if let Some(active) = self.active_inodes[file.inode_slot].as_mut() {
            active.uses = active.uses.saturating_sub(1);
        }
    }

    /// 全局打开文件表的占用数，诊断用
    pub fn open_file_count(&self) -> usize {
        self.open_files.iter().filter(|o| o.is_some()).count()
    }

    /// 当前进程的描述符翻译成打开文件槽位
    fn descriptor(&self, fd: u32) -> KernelResult<usize> {
        self.procs[self.current]
            .fd_table
            .get(fd as usize)
            .copied()
            .flatten()
            .ok_or(KernelError::BadDescriptor)
    }

    /// 打开文件槽位背后的共享 inode 句柄
    fn shared_inode(&self, open_slot: usize) -> KernelResult<Inode> {
        let file = self.open_files[open_slot].ok_or(KernelError::BadDescriptor)?;
        self.active_inodes[file.inode_slot]
            .as_ref()
            .map(|a| a.inode.clone())
            .ok_or(KernelError::BadDescriptor)
    }
}

/// 挂载与格式化
impl Kernel {
    /// 用固化几何参数格式化块设备并挂载。
    /// 旧挂载的打开文件与活动 inode 全部作废，
    /// 否则残存句柄的脏缓存回写会冲掉新镜像。
    pub fn format(&mut self) {
        for pcb in self.procs.iter_mut() {
            pcb.fd_table = [None; FD_LIMIT];
        }
        self.open_files = [None; crate::config::OPEN_FILE_LIMIT];
        for slot in self.active_inodes.iter_mut() {
            *slot = None;
        }
        // 旧缓存落盘发生在新镜像写入之前
        self.fs = None;
        self.fs = Some(ChainFileSystem::format(self.device.clone()));
    }

    /// 已挂载的文件系统实例
    pub fn mounted(&self) -> Option<&Arc<spin::Mutex<ChainFileSystem>>> {
        self.fs.as_ref()
    }
}
