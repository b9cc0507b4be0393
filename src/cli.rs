use std::path::PathBuf;

use clap::Parser;

use crate::builder::BuildOptions;
use crate::config::DEFAULT_CONFIG_FILE;

#[derive(Debug, Parser)]
#[command(name = "arnold")]
#[command(about = "Arnold is the builder for Go", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Load configuration from FILE
    #[arg(short = 'f', long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: PathBuf,

    /// Directory for build output, relative to the working directory
    #[arg(short, long, value_name = "DIR", default_value = "./build")]
    pub output_dir: PathBuf,

    /// Go project root
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Maximum packages processed at once (default: all at once)
    #[arg(short = 'j', long)]
    pub max_parallel: Option<usize>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            config_file: self.config_file.clone(),
            output_dir: self.output_dir.clone(),
            project_dir: self.project_dir.clone(),
            max_parallel: self.max_parallel,
        }
    }
}
