mod cli;

use std::fs;
use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;
use std::sync::Mutex;

use chain_fs::{ChainFileSystem, DiskInodeKind, Inode, BLOCK_SIZE, TOTAL_BLOCKS};
use chain_fs_fuse::BlockFile;
use clap::Parser;
use cli::Cli;

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    println!("source={:?}\nimage={:?}", cli.source, cli.image);

    let block_file = Arc::new(BlockFile(Mutex::new({
        let fd = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&cli.image)?;
        fd.set_len(TOTAL_BLOCKS as u64 * BLOCK_SIZE as u64).unwrap();

        fd
    })));

    let fs = ChainFileSystem::format(block_file);
    let root = Inode::root(&fs);

    for entry in fs::read_dir(&cli.source)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_str().expect("source file name isn't valid UTF-8");
        let data = fs::read(entry.path())?;

        let inode = root
            .create(name, DiskInodeKind::Regular)
            .unwrap_or_else(|e| panic!("creating {name:?}: {e}"));
        let written = inode
            .write_at(0, &data)
            .unwrap_or_else(|e| panic!("packing {name:?}: {e}"));
        println!("packed: {name} ({written} bytes)");
    }

    Ok(())
}
