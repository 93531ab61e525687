#![no_std]

extern crate alloc;

use core::num::NonZeroU32;

/* sfs 的整体架构，自上而下 */

// 文件系统层：格式化、挂载与文件的增删读写
mod fs;

// 调试层：只读地渲染磁盘上的数据结构
pub mod debug;

// 磁盘数据结构层：超级块、索引节点、指针块与空闲位图
mod layout;

// 块地址：物理块号与文件内的逻辑块索引
mod addr;

mod error;

pub use block_dev::{BLOCK_SIZE, Disk};

pub use self::{
    addr::{BlockId, BlockIndex},
    error::{Error, Result},
    fs::FileSystem,
    layout::SuperBlock,
};

pub const MAGIC: u32 = 0xf0f03410;
/// 每个索引节点在磁盘上占用的字节数
pub const INODE_SIZE: usize = 32;
pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SIZE;
/// 索引节点内的直接指针个数
pub const POINTERS_PER_INODE: usize = 5;
/// 一个指针块可容纳的块号个数
pub const POINTERS_PER_BLOCK: usize = BLOCK_SIZE / 4;
/// 单个文件的最大字节数
pub const MAX_FILE_SIZE: usize = (POINTERS_PER_INODE + POINTERS_PER_BLOCK) * BLOCK_SIZE;
/// 默认每十个块预留一个索引节点块
pub const DEFAULT_INODE_RATIO: NonZeroU32 = NonZeroU32::new(10).unwrap();

type DataBlock = [u8; BLOCK_SIZE];
