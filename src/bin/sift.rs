//! Command line tool to inspect sift indexes.

use structopt::StructOpt;

use std::{path::PathBuf, process::exit};

use sift::{
    directory::{Directory, FileSystemDirectory, Kind},
    index::SnapshotFile,
    Result,
};

#[derive(StructOpt)]
#[structopt(name = "sift", about = "inspect sift indexes")]
enum Opt {
    /// List the snapshot epochs known to an index directory.
    List {
        #[structopt(parse(from_os_str))]
        path: PathBuf,
    },
    /// Print segment ids and deleted-doc counts for one snapshot.
    Snapshot {
        #[structopt(parse(from_os_str))]
        path: PathBuf,
        epoch: u64,
    },
}

fn main() {
    let opt = Opt::from_args();
    let res = match opt {
        Opt::List { path } => list(path),
        Opt::Snapshot { path, epoch } => snapshot(path, epoch),
    };

    if let Err(err) = res {
        eprintln!("error: {}", err);
        exit(1);
    }
}

fn list(path: PathBuf) -> Result<()> {
    let dir = FileSystemDirectory::new(&path);
    for epoch in dir.list(Kind::Snapshot)? {
        println!("snapshot: {}", epoch);
    }
    Ok(())
}

fn snapshot(path: PathBuf, epoch: u64) -> Result<()> {
    let dir = FileSystemDirectory::new(&path);
    let data = dir.load(Kind::Snapshot, epoch)?;
    let file = SnapshotFile::decode(data.as_slice())?;

    println!("snapshot: {}", file.epoch);
    println!("segments:");
    for (id, deleted) in file.segments.iter() {
        let num_deleted = deleted.as_ref().map(|d| d.cardinality()).unwrap_or(0);
        println!("segment id: {} num_deleted: {}", id, num_deleted);
    }
    Ok(())
}
