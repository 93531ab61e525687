use std::num::NonZeroU32;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version, about = "Inspect and edit sfs disk images")]
pub struct Cli {
    /// Disk image path
    #[arg(long, short)]
    pub image: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create (or truncate) the image and format it
    Format {
        /// Image size in blocks
        #[arg(long, short, default_value_t = 1024)]
        blocks: usize,

        /// Reserve one inode block per this many blocks
        #[arg(long, default_value_t = sfs::DEFAULT_INODE_RATIO)]
        ratio: NonZeroU32,
    },
    /// Print the superblock and every valid inode
    Debug,
    /// Check that the image mounts and report block usage
    Mount,
    /// Allocate a new inode
    Create,
    /// Free an inode and all its blocks
    Remove { inumber: u32 },
    /// Print the size of an inode
    Stat { inumber: u32 },
    /// Write the contents of an inode to stdout
    Cat { inumber: u32 },
    /// Copy a host file into an inode
    Copyin { source: PathBuf, inumber: u32 },
    /// Copy an inode into a host file
    Copyout { inumber: u32, target: PathBuf },
}
