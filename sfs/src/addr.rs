//! 块地址
//!
//! - [`BlockId`]：磁盘上的物理块号
//! - [`BlockIndex`]：文件内的逻辑块索引，须经索引节点翻译才能得到物理块号
//!
//! 两者互不兼容，逻辑索引不能直接拿去读写磁盘。

use derive_more::{Display, From, Into};

use crate::{BLOCK_SIZE, POINTERS_PER_BLOCK, POINTERS_PER_INODE};

#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
#[repr(transparent)]
pub struct BlockId(u32);

impl BlockId {
    /// 超级块所在的块
    pub const SUPER: Self = Self(0);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, From, Into)]
#[repr(transparent)]
pub struct BlockIndex(u32);

/// 逻辑块在索引节点中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// 直接指针下标
    Direct(usize),
    /// 间接指针块内的下标
    Indirect(usize),
}

impl BlockIndex {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// 字节偏移所在的逻辑块
    #[inline]
    pub fn of_offset(offset: usize) -> Self {
        Self((offset / BLOCK_SIZE) as u32)
    }

    /// 逻辑块的起始字节偏移
    #[inline]
    pub fn start(self) -> usize {
        self.0 as usize * BLOCK_SIZE
    }

    /// 剔去直接指针的部分即为间接指针块内的下标
    pub fn slot(self) -> Slot {
        let index = self.0 as usize;
        if index < POINTERS_PER_INODE {
            Slot::Direct(index)
        } else {
            debug_assert!(index < POINTERS_PER_INODE + POINTERS_PER_BLOCK);
            Slot::Indirect(index - POINTERS_PER_INODE)
        }
    }
}

/// 容纳 `size` 字节需要多少个数据块
#[inline]
pub fn count_data_blocks(size: usize) -> usize {
    size.div_ceil(BLOCK_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot() {
        assert_eq!(BlockIndex::new(0).slot(), Slot::Direct(0));
        assert_eq!(BlockIndex::new(4).slot(), Slot::Direct(4));
        assert_eq!(BlockIndex::new(5).slot(), Slot::Indirect(0));
        assert_eq!(BlockIndex::new(1028).slot(), Slot::Indirect(1023));
    }

    #[test]
    fn offsets() {
        assert_eq!(BlockIndex::of_offset(0), BlockIndex::new(0));
        assert_eq!(BlockIndex::of_offset(BLOCK_SIZE - 1), BlockIndex::new(0));
        assert_eq!(BlockIndex::of_offset(BLOCK_SIZE), BlockIndex::new(1));
        assert_eq!(BlockIndex::new(3).start(), 3 * BLOCK_SIZE);
    }

    #[test]
    fn data_blocks() {
        assert_eq!(count_data_blocks(0), 0);
        assert_eq!(count_data_blocks(1), 1);
        assert_eq!(count_data_blocks(BLOCK_SIZE), 1);
        assert_eq!(count_data_blocks(BLOCK_SIZE + 1), 2);
    }

    #[test]
    fn block_id_raw() {
        assert_eq!(u32::from(BlockId::new(7)), 7);
        assert_eq!(BlockId::from(7), BlockId::new(7));
        assert_eq!(BlockId::SUPER.as_usize(), 0);
    }
}
