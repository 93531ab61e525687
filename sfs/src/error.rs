use derive_more::Display;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[display(fmt = "device is already mounted")]
    AlreadyMounted,
    #[display(fmt = "no file system is mounted")]
    NotMounted,
    /// 魔数不符或各项计数自相矛盾
    #[display(fmt = "invalid superblock: {}", _0)]
    InvalidSuperblock(&'static str),
    /// 索引节点号超出索引节点表
    #[display(fmt = "inode {} is out of range", _0)]
    InvalidInumber(u32),
    #[display(fmt = "inode {} is not allocated", _0)]
    InodeNotAllocated(u32),
    /// 读偏移不小于文件大小，或写偏移大于文件大小
    #[display(fmt = "offset out of range")]
    OffsetOutOfRange,
    #[display(fmt = "no free inode left")]
    InodeTableFull,
    /// 挂载时发现有效索引节点引用了卷外的块或已被占用的块
    #[display(fmt = "inode {} references invalid blocks", _0)]
    CorruptedInode(u32),
}

impl core::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
