//! # 块设备接口层
//!
//! 块设备以**块**为单位读写数据；[`BlockDevice`] 是对这种设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 读写假定总是成功：原始磁盘 I/O 的错误路径由驱动自行处理，
//! 不会上抛到文件系统。

use core::any::Any;

/// 块设备驱动特质
pub trait BlockDevice: Send + Sync + Any {
    fn read_block(&self, block_id: usize, buf: &mut [u8]);
    fn write_block(&self, block_id: usize, buf: &[u8]);
}
