//! # 调试层
//!
//! 不挂载、不修改磁盘，只把超级块与有效索引节点读出来，
//! 以 [`Report`] 的形式交给外部渲染。

use alloc::vec::Vec;
use core::fmt;

use block_dev::Disk;

use crate::layout::{InodeBlock, SuperBlock};
use crate::{BlockId, INODES_PER_BLOCK};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub super_block: SuperBlock,
    /// 魔数无效时为空
    pub inodes: Vec<InodeReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeReport {
    pub inumber: u32,
    pub size: u32,
    pub direct: Vec<BlockId>,
    pub indirect: Option<IndirectReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndirectReport {
    pub block: BlockId,
    /// 间接指针块中正在使用的数据块，索引节点损坏时为空
    pub data: Vec<BlockId>,
}

/// 读出整张索引节点表。磁盘可以处于任意挂载状态。
pub fn inspect(disk: &Disk) -> Report {
    let super_block = SuperBlock::load(disk);
    if !super_block.is_valid() {
        return Report {
            super_block,
            inodes: Vec::new(),
        };
    }

    let volume_blocks = super_block.total_blocks.min(disk.size() as u32);
    let mut inodes = Vec::new();
    for block_id in super_block
        .inode_area()
        .take_while(|id| u32::from(*id) < volume_blocks)
    {
        let block = InodeBlock::load(block_id, disk);
        let first = (u32::from(block_id) - 1) * INODES_PER_BLOCK as u32;

        for (slot, inode) in block.iter().enumerate().filter(|(_, inode)| inode.valid) {
            let indirect = inode.indirect().map(|id| IndirectReport {
                block: id,
                data: if inode.is_sane(volume_blocks) {
                    inode.indirect_blocks(disk)
                } else {
                    Vec::new()
                },
            });

            inodes.push(InodeReport {
                inumber: first + slot as u32,
                size: inode.size,
                direct: inode.direct().to_vec(),
                indirect,
            });
        }
    }

    Report {
        super_block,
        inodes,
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sb = &self.super_block;
        writeln!(f, "SuperBlock:")?;
        writeln!(
            f,
            "    magic number is {}",
            if sb.is_valid() { "valid" } else { "invalid" }
        )?;
        writeln!(f, "    {} blocks", sb.total_blocks)?;
        writeln!(f, "    {} inode blocks", sb.inode_blocks)?;
        writeln!(f, "    {} inodes", sb.inode_count)?;

        for inode in &self.inodes {
            write!(f, "{inode}")?;
        }
        Ok(())
    }
}

impl fmt::Display for InodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Inode {}:", self.inumber)?;
        writeln!(f, "    size: {} bytes", self.size)?;
        write!(f, "    direct blocks:")?;
        for id in &self.direct {
            write!(f, " {id}")?;
        }
        writeln!(f)?;

        if let Some(indirect) = &self.indirect {
            writeln!(f, "    indirect block: {}", indirect.block)?;
            write!(f, "    indirect data blocks:")?;
            for id in &indirect.data {
                write!(f, " {id}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
