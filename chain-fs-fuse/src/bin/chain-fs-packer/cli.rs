use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
pub struct Cli {
    /// Directory whose files get packed into the image root
    #[arg(long, short)]
    pub source: PathBuf,

    /// Output image file
    #[arg(long, short = 'O')]
    pub image: PathBuf,
}
