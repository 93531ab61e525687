//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如磁盘、光盘、U盘等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 文件系统并不直接持有驱动，而是经由 [`Disk`] 访问：
//! 它在驱动之上补充了挂载闸门与读写计数。

#![no_std]

extern crate alloc;

mod disk;
mod memory;

use core::any::Any;
use core::fmt::Debug;

pub use self::{disk::Disk, memory::MemoryDisk};

/// 块大小（字节），所有读写都以整块进行
pub const BLOCK_SIZE: usize = 4096;

/// 块设备驱动特质
pub trait BlockDevice: Send + Sync + Any + Debug {
    /// `buf` 的长度必须恰为 [`BLOCK_SIZE`]
    fn read_block(&self, block_id: usize, buf: &mut [u8]);
    fn write_block(&self, block_id: usize, buf: &[u8]);
    /// 设备的总块数
    fn block_count(&self) -> usize;
}
