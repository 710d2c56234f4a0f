use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "kshell",
    version,
    about = "A small command shell for listing and tailing cluster workloads."
)]
pub struct CliArgs {
    /// Start in a specific namespace
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Read settings from this YAML file instead of the discovered one
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Program used to query the cluster
    #[arg(long)]
    pub query_tool: Option<String>,

    /// Program that receives streamed logs
    #[arg(long)]
    pub pager: Option<String>,

    /// Kill listing commands that run longer than this (0 disables)
    #[arg(long)]
    pub capture_timeout_secs: Option<u64>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Write tracing output to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
