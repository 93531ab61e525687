//! # 文件系统层
//!
//! [`FileSystem`] 只有两种状态：未挂载与已挂载。
//! 未挂载时只能格式化或挂载；其余操作都要求已挂载，否则立即返回 [`Error::NotMounted`]。
//! 空闲位图属于挂载会话，卸载即丢弃。
//!
//! 所有变更操作都取 `&mut self`，本身不加锁；多方共用一个卷时由调用者在外层串行化。

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::num::NonZeroU32;

use block_dev::Disk;
use log::{debug, error, info, warn};

use crate::addr::count_data_blocks;
use crate::layout::{Bitmap, DiskInode, InodeBlock, SuperBlock};
use crate::{
    BLOCK_SIZE, BlockId, DEFAULT_INODE_RATIO, Error, INODES_PER_BLOCK, MAX_FILE_SIZE,
    POINTERS_PER_INODE, Result,
};

#[derive(Debug, Default)]
pub struct FileSystem {
    mounted: Option<Mounted>,
}

/// 挂载会话：独占磁盘，并持有重建出的空闲位图
#[derive(Debug)]
struct Mounted {
    disk: Arc<Disk>,
    super_block: SuperBlock,
    bitmap: Bitmap,
}

/// 索引节点连同它所在的整个索引节点块
struct InodeHandle {
    inumber: u32,
    block_id: BlockId,
    slot: usize,
    block: InodeBlock,
}

impl FileSystem {
    pub const fn new() -> Self {
        Self { mounted: None }
    }

    /// 以默认比例（每十块一个索引节点块）格式化
    pub fn format(disk: &Disk) -> Result<()> {
        Self::format_with_ratio(disk, DEFAULT_INODE_RATIO)
    }

    /// 写入超级块并清零其余所有块。磁盘已被挂载时失败。
    pub fn format_with_ratio(disk: &Disk, ratio: NonZeroU32) -> Result<()> {
        if disk.mounted() {
            return Err(Error::AlreadyMounted);
        }

        let total_blocks = u32::try_from(disk.size())
            .map_err(|_| Error::InvalidSuperblock("device too large"))?;
        let super_block = SuperBlock::new(total_blocks, ratio);
        super_block.validate(disk.size())?;
        super_block.store(disk);

        let empty = [0; BLOCK_SIZE];
        for block_id in 1..disk.size() {
            disk.write(block_id, &empty);
        }

        info!(
            "formatted: {} blocks, {} inode blocks, {} inodes",
            super_block.total_blocks, super_block.inode_blocks, super_block.inode_count
        );
        Ok(())
    }

    /// 校验超级块、独占磁盘，并扫描索引节点表重建空闲位图。
    /// 失败时磁盘保持未挂载。
    pub fn mount(&mut self, disk: Arc<Disk>) -> Result<()> {
        if self.mounted.is_some() || disk.mounted() {
            return Err(Error::AlreadyMounted);
        }

        let super_block = SuperBlock::load(&disk);
        if let Err(e) = super_block.validate(disk.size()) {
            error!("mount rejected: {e}");
            return Err(e);
        }

        if !disk.mount() {
            return Err(Error::AlreadyMounted);
        }

        let bitmap = match Self::scan(&disk, &super_block) {
            Ok(bitmap) => bitmap,
            Err(e) => {
                error!("mount rejected: {e}");
                disk.unmount();
                return Err(e);
            }
        };

        info!(
            "mounted: {} of {} blocks in use",
            bitmap.used_count(),
            bitmap.capacity()
        );
        self.mounted = Some(Mounted {
            disk,
            super_block,
            bitmap,
        });
        Ok(())
    }

    /// 丢弃空闲位图并释放磁盘
    pub fn unmount(&mut self) {
        if let Some(mounted) = self.mounted.take() {
            mounted.disk.unmount();
            info!("unmounted");
        }
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn superblock(&self) -> Result<&SuperBlock> {
        Ok(&self.session()?.super_block)
    }

    pub fn free_blocks(&self) -> Result<usize> {
        Ok(self.session()?.bitmap.free_count())
    }

    pub fn used_blocks(&self) -> Result<usize> {
        Ok(self.session()?.bitmap.used_count())
    }

    /// 按块序、块内槽序找到第一个空闲索引节点，返回其编号
    pub fn create(&mut self) -> Result<u32> {
        let mounted = self.session_mut()?;

        for block_id in mounted.super_block.inode_area() {
            let mut block = InodeBlock::load(block_id, &mounted.disk);
            let Some(slot) = block.iter().position(|inode| !inode.valid) else {
                continue;
            };

            block[slot].init();
            block.store(block_id, &mounted.disk);

            let inumber = (u32::from(block_id) - 1) * INODES_PER_BLOCK as u32 + slot as u32;
            debug!("created inode {inumber}");
            return Ok(inumber);
        }

        Err(Error::InodeTableFull)
    }

    /// 归还文件占有的全部块并使索引节点失效
    pub fn remove(&mut self, inumber: u32) -> Result<()> {
        let mounted = self.session_mut()?;
        let mut handle = mounted.valid_inode(inumber)?;

        let owned = handle.inode().owned_blocks(&mounted.disk);
        mounted.bitmap.dealloc(&owned);
        handle.inode_mut().valid = false;
        handle.store(&mounted.disk);

        debug!("removed inode {inumber}, freed {} blocks", owned.len());
        Ok(())
    }

    /// 文件字节数
    pub fn stat(&self, inumber: u32) -> Result<u32> {
        let mounted = self.session()?;
        Ok(mounted.valid_inode(inumber)?.inode().size)
    }

    /// 自 `offset` 起读满 `buf`，不越过文件末尾，返回实际读出的字节数
    pub fn read(&self, inumber: u32, buf: &mut [u8], offset: usize) -> Result<usize> {
        let mounted = self.session()?;
        let handle = mounted.valid_inode(inumber)?;
        let inode = handle.inode();

        if offset >= inode.size as usize {
            return Err(Error::OffsetOutOfRange);
        }

        Ok(inode.read_at(offset, buf, &mounted.disk))
    }

    /// 自 `offset` 起写入 `buf`，`offset` 不得超过文件大小。
    ///
    /// 文件需要变大时先分配块；空闲块不够则写入被截断到已分配块所能容纳的长度，
    /// 返回值即实际写入的字节数。
    pub fn write(&mut self, inumber: u32, buf: &[u8], offset: usize) -> Result<usize> {
        let mounted = self.session_mut()?;
        let mut handle = mounted.valid_inode(inumber)?;

        if offset > handle.inode().size as usize {
            return Err(Error::OffsetOutOfRange);
        }

        let wanted_end = offset.saturating_add(buf.len()).min(MAX_FILE_SIZE);
        let end = mounted.grow(inumber, handle.inode_mut(), wanted_end);

        let written = handle
            .inode()
            .write_at(offset, &buf[..end - offset], &mounted.disk);
        handle.store(&mounted.disk);

        Ok(written)
    }
}

impl FileSystem {
    fn session(&self) -> Result<&Mounted> {
        self.mounted.as_ref().ok_or(Error::NotMounted)
    }

    fn session_mut(&mut self) -> Result<&mut Mounted> {
        self.mounted.as_mut().ok_or(Error::NotMounted)
    }

    /// 重建空闲位图：超级块、索引节点区域，以及每个有效索引节点引用的块
    fn scan(disk: &Disk, super_block: &SuperBlock) -> Result<Bitmap> {
        let mut bitmap = Bitmap::new(super_block.total_blocks as usize);
        bitmap.reserve(BlockId::SUPER);
        for block_id in super_block.inode_area() {
            bitmap.reserve(block_id);
        }

        for block_id in super_block.inode_area() {
            let block = InodeBlock::load(block_id, disk);
            let first = (u32::from(block_id) - 1) * INODES_PER_BLOCK as u32;

            for (slot, inode) in block.iter().enumerate().filter(|(_, inode)| inode.valid) {
                let inumber = first + slot as u32;
                if !inode.is_sane(super_block.total_blocks) {
                    return Err(Error::CorruptedInode(inumber));
                }
                // 越界或与他者重复的块都说明索引节点已损坏
                for id in inode.owned_blocks(disk) {
                    if !bitmap.reserve(id) {
                        return Err(Error::CorruptedInode(inumber));
                    }
                }
            }
        }

        debug!("scanned {} inode blocks", super_block.inode_blocks);
        Ok(bitmap)
    }
}

impl Drop for FileSystem {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl Mounted {
    /// 读出索引节点所在的整块。编号越界则报错。
    fn load_inode(&self, inumber: u32) -> Result<InodeHandle> {
        if inumber >= self.super_block.inode_count {
            return Err(Error::InvalidInumber(inumber));
        }

        // 跳过超级块
        let block_id = BlockId::new(inumber / INODES_PER_BLOCK as u32 + 1);
        Ok(InodeHandle {
            inumber,
            block_id,
            slot: inumber as usize % INODES_PER_BLOCK,
            block: InodeBlock::load(block_id, &self.disk),
        })
    }

    fn valid_inode(&self, inumber: u32) -> Result<InodeHandle> {
        let handle = self.load_inode(inumber)?;
        if handle.inode().valid {
            Ok(handle)
        } else {
            Err(Error::InodeNotAllocated(handle.inumber))
        }
    }

    /// 让文件能容纳 `[0, end)`，返回实际可写到的末地址。
    ///
    /// 首次越过直接指针时先分配间接指针块，再分配数据块；
    /// 分配不足时末地址被截到已有块的容量为止。
    fn grow(&mut self, inumber: u32, inode: &mut DiskInode, end: usize) -> usize {
        let size = inode.size as usize;
        let old_blocks = inode.data_blocks();
        let wanted_blocks = count_data_blocks(end);

        if wanted_blocks <= old_blocks {
            if end > size {
                inode.expand_to(end as u32, None, Vec::new(), &self.disk);
            }
            return end;
        }

        let crossing = old_blocks <= POINTERS_PER_INODE && wanted_blocks > POINTERS_PER_INODE;
        let mut indirect = if crossing {
            self.bitmap.alloc(1).pop()
        } else {
            None
        };
        // 没有间接指针块就只能用满直接指针
        let limit = if crossing && indirect.is_none() {
            POINTERS_PER_INODE
        } else {
            wanted_blocks
        };

        let new_blocks = self.bitmap.alloc(limit - old_blocks);
        let total_blocks = old_blocks + new_blocks.len();
        if total_blocks <= POINTERS_PER_INODE {
            if let Some(id) = indirect.take() {
                self.bitmap.dealloc(&[id]);
            }
        }

        let end = end.min(total_blocks * BLOCK_SIZE);
        if total_blocks < wanted_blocks {
            warn!(
                "inode {inumber}: wanted {wanted_blocks} blocks, got {total_blocks}, write truncated at {end}"
            );
        }

        debug!(
            "inode {inumber}: grew from {old_blocks} to {total_blocks} blocks{}",
            if indirect.is_some() { " (+indirect)" } else { "" }
        );
        inode.expand_to(end as u32, indirect, new_blocks, &self.disk);
        end
    }
}

impl InodeHandle {
    #[inline]
    fn inode(&self) -> &DiskInode {
        &self.block[self.slot]
    }

    #[inline]
    fn inode_mut(&mut self) -> &mut DiskInode {
        &mut self.block[self.slot]
    }

    #[inline]
    fn store(&self, disk: &Disk) {
        self.block.store(self.block_id, disk);
    }
}
