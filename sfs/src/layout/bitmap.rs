use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::BlockId;

/// 空闲块位图，`true` 表示空闲
///
/// 不落盘，挂载时根据超级块与索引节点表重建，卸载即丢弃。
pub struct Bitmap {
    free: Vec<bool>,
}

impl Bitmap {
    /// 创建 `blocks` 个块全部空闲的位图
    #[inline]
    pub fn new(blocks: usize) -> Self {
        Self {
            free: vec![true; blocks],
        }
    }

    /// 位图所指示区域的总块数
    #[inline]
    pub fn capacity(&self) -> usize {
        self.free.len()
    }

    #[inline]
    pub fn is_free(&self, id: BlockId) -> bool {
        self.free.get(id.as_usize()).copied().unwrap_or(false)
    }

    pub fn free_count(&self) -> usize {
        self.free.iter().filter(|&&free| free).count()
    }

    #[inline]
    pub fn used_count(&self) -> usize {
        self.capacity() - self.free_count()
    }

    /// 标记某块已占用。
    /// 若块号越界或该块已被占用，则返回 `false`。
    pub fn reserve(&mut self, id: BlockId) -> bool {
        match self.free.get_mut(id.as_usize()) {
            Some(free) if *free => {
                *free = false;
                true
            }
            _ => false,
        }
    }

    /// 自低向高首次适配，最多分配 `count` 个块。
    /// 空闲块不足时返回实际分配到的那些，可能为空。
    pub fn alloc(&mut self, count: usize) -> Vec<BlockId> {
        let mut blocks = Vec::with_capacity(count);
        for (index, free) in self.free.iter_mut().enumerate() {
            if blocks.len() == count {
                break;
            }
            if *free {
                *free = false;
                blocks.push(BlockId::new(index as u32));
            }
        }

        if blocks.len() < count {
            log::debug!("bitmap: wanted {count} blocks, got {}", blocks.len());
        }

        blocks
    }

    /// 归还块，块内数据不清零
    pub fn dealloc(&mut self, blocks: &[BlockId]) {
        for &id in blocks {
            // 编号一定得是已分配的块
            assert!(!self.is_free(id), "double free of block {id}");
            self.free[id.as_usize()] = true;
        }
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("capacity", &self.capacity())
            .field("free", &self.free_count())
            .finish()
    }
}
