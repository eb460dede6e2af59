use core::{ptr, slice, str};

use crate::error::{FsError, FsResult};

/// 名字缓冲最多容纳的字节数，末字节留给 \0
pub const NAME_LIMIT: usize = 25;

/// 目录项：定长 32 字节，目录的数据块每块打包 16 项。
/// `namlen` 为 0 表示空槽，可被新项复用。
#[derive(Debug, Default, Clone)]
#[repr(C)]
pub struct DirEntry {
    inode_id: u32,
    namlen: u16,
    name: [u8; NAME_LIMIT + 1],
}

impl DirEntry {
    /// 目录项大小恒为32字节
    pub const SIZE: usize = 32;
    /// 每个数据块打包的目录项个数
    pub const PER_BLOCK: usize = crate::BLOCK_SIZE / Self::SIZE;

    /// 名字整体复制进定长缓冲，超长是错误而非截断
    pub fn new(name: &str, inode_id: u32) -> FsResult<Self> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > NAME_LIMIT {
            return Err(FsError::NameTooLong);
        }

        let mut buf = [0; NAME_LIMIT + 1];
        buf[..bytes.len()].copy_from_slice(bytes);

        Ok(Self {
            inode_id,
            namlen: bytes.len() as u16,
            name: buf,
        })
    }

    /// 名字按存储的长度取出，比较时长度不同即不同名
    pub fn name(&self) -> &str {
        str::from_utf8(&self.name[..self.namlen as usize]).unwrap_or("")
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.namlen == 0
    }

    #[inline]
    pub fn inode_id(&self) -> u32 {
        self.inode_id
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(ptr::from_ref(self).cast(), Self::SIZE) }
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(ptr::from_mut(self).cast(), Self::SIZE) }
    }
}
