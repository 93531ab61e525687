mod cli;

use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use block_dev::Disk;
use clap::Parser;
use cli::{Cli, Command};
use sfs::FileSystem;
use sfs_fuse::BlockFile;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Format { blocks, ratio } => {
            let disk = Disk::new(Arc::new(BlockFile::create(&cli.image, blocks)?));
            FileSystem::format_with_ratio(&disk, ratio)?;
            println!("formatted {:?}: {blocks} blocks", cli.image);
        }
        Command::Debug => {
            let disk = open(&cli.image)?;
            print!("{}", sfs::debug::inspect(&disk));
        }
        command => {
            let mut fs = FileSystem::new();
            fs.mount(Arc::new(open(&cli.image)?))?;
            run(&mut fs, command)?;
        }
    }

    Ok(())
}

fn open(image: &Path) -> io::Result<Disk> {
    Ok(Disk::new(Arc::new(BlockFile::open(image)?)))
}

fn run(fs: &mut FileSystem, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Mount => {
            let sb = fs.superblock()?;
            println!(
                "mounted: {} blocks, {} inodes, {} blocks free",
                sb.total_blocks,
                sb.inode_count,
                fs.free_blocks()?
            );
        }
        Command::Create => println!("created inode {}", fs.create()?),
        Command::Remove { inumber } => {
            fs.remove(inumber)?;
            println!("removed inode {inumber}");
        }
        Command::Stat { inumber } => println!("inode {inumber} has size {}", fs.stat(inumber)?),
        Command::Cat { inumber } => io::stdout().write_all(&read_all(fs, inumber)?)?,
        Command::Copyin { source, inumber } => {
            let data = fs::read(&source)?;
            let written = fs.write(inumber, &data, 0)?;
            if written < data.len() {
                log::warn!("disk full: copied {written} of {} bytes", data.len());
            }
            println!("{written} bytes copied");
        }
        Command::Copyout { inumber, target } => {
            let data = read_all(fs, inumber)?;
            fs::write(&target, &data)?;
            println!("{} bytes copied", data.len());
        }
        Command::Format { .. } | Command::Debug => unreachable!("handled without mounting"),
    }

    Ok(())
}

fn read_all(fs: &FileSystem, inumber: u32) -> sfs::Result<Vec<u8>> {
    let size = fs.stat(inumber)? as usize;
    let mut data = vec![0; size];
    if size > 0 {
        fs.read(inumber, &mut data, 0)?;
    }
    Ok(data)
}
