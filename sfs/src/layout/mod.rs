//! # 磁盘数据结构层
//!
//! sfs 的磁盘布局：
//! 超级块 | 索引节点区域 | 数据块与间接指针块
//!
//! 每种结构都有独立的编解码函数，字段一律按小端 `u32` 存放，
//! 不对块缓冲区做任何内存重解释。空闲位图只存在于内存中，每次挂载时重建。

mod super_block;
pub use super_block::SuperBlock;

mod bitmap;
pub use bitmap::Bitmap;

mod inode;
pub use inode::{DiskInode, InodeBlock};

/// 取出第 `word` 个 `u32`
#[inline]
fn get_u32(raw: &[u8], word: usize) -> u32 {
    let bytes = &raw[word * 4..word * 4 + 4];
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[inline]
fn put_u32(raw: &mut [u8], word: usize, value: u32) {
    raw[word * 4..word * 4 + 4].copy_from_slice(&value.to_le_bytes());
}
