use core::num::NonZeroU32;

use block_dev::Disk;

use super::{get_u32, put_u32};
use crate::{BLOCK_SIZE, BlockId, DataBlock, Error, INODES_PER_BLOCK, MAGIC, Result};

/// 超级块：
/// - 提供文件系统合法性校验；
/// - 记录卷的几何信息，格式化后不再改变
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    /// 魔数：用于校验文件系统合法性
    magic: u32,
    /// 文件系统占据块数
    pub total_blocks: u32,
    /// 为索引节点预留的块数
    pub inode_blocks: u32,
    pub inode_count: u32,
}

impl SuperBlock {
    /// 每 `ratio` 个块预留一个索引节点块，向上取整
    pub fn new(total_blocks: u32, ratio: NonZeroU32) -> Self {
        let inode_blocks = total_blocks.div_ceil(ratio.get());
        Self {
            magic: MAGIC,
            total_blocks,
            inode_blocks,
            inode_count: inode_blocks.saturating_mul(INODES_PER_BLOCK as u32),
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }

    /// 校验超级块能否描述一块 `device_blocks` 块大的设备上的卷
    pub fn validate(&self, device_blocks: usize) -> Result<()> {
        if !self.is_valid() {
            return Err(Error::InvalidSuperblock("bad magic number"));
        }
        if self.total_blocks == 0 {
            return Err(Error::InvalidSuperblock("volume has no blocks"));
        }
        if Some(self.inode_count) != self.inode_blocks.checked_mul(INODES_PER_BLOCK as u32) {
            return Err(Error::InvalidSuperblock("inode count mismatch"));
        }
        // 至少要放得下超级块和全部索引节点块
        if self.total_blocks <= self.inode_blocks {
            return Err(Error::InvalidSuperblock("inode table exceeds volume"));
        }
        if self.total_blocks as usize > device_blocks {
            return Err(Error::InvalidSuperblock("volume exceeds device"));
        }
        Ok(())
    }

    /// 索引节点区域的块，紧跟在超级块之后
    #[inline]
    pub fn inode_area(&self) -> impl Iterator<Item = BlockId> + use<> {
        (1..=self.inode_blocks).map(BlockId::new)
    }

    pub fn decode(block: &DataBlock) -> Self {
        Self {
            magic: get_u32(block, 0),
            total_blocks: get_u32(block, 1),
            inode_blocks: get_u32(block, 2),
            inode_count: get_u32(block, 3),
        }
    }

    /// 写入 `block`，其余部分补零
    pub fn encode(&self, block: &mut DataBlock) {
        block.fill(0);
        put_u32(block, 0, self.magic);
        put_u32(block, 1, self.total_blocks);
        put_u32(block, 2, self.inode_blocks);
        put_u32(block, 3, self.inode_count);
    }

    pub fn load(disk: &Disk) -> Self {
        let mut block = [0; BLOCK_SIZE];
        disk.read(BlockId::SUPER.as_usize(), &mut block);
        Self::decode(&block)
    }

    pub fn store(&self, disk: &Disk) {
        let mut block = [0; BLOCK_SIZE];
        self.encode(&mut block);
        disk.write(BlockId::SUPER.as_usize(), &block);
    }
}
