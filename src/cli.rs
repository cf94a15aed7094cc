// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use clap::{Parser, Subcommand};

/// 命令行入口
#[derive(Parser, Debug)]
#[command(
    name = "frontier",
    version,
    about = "Distributed crawl scheduler backed by a shared Redis request queue and duplicate filter"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a crawl worker for one job
    ///
    /// Example: frontier worker quotes --seed http://quotes.toscrape.com/
    Worker {
        /// Job name; every worker started with the same name shares one queue
        job: String,

        /// Spider that parses fetched pages
        #[arg(long, default_value = "quotes")]
        spider: String,

        /// Seed URL (repeatable). Defaults to the spider's start URLs
        #[arg(long = "seed")]
        seeds: Vec<String>,

        /// Maximum number of requests in flight
        #[arg(long)]
        concurrency: Option<usize>,

        /// Stop after this many consecutive empty polls (0 waits forever)
        #[arg(long)]
        exit_after_empty: Option<u32>,
    },

    /// Run the HTTP ingestion gateway
    Gateway {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// Push URLs into a job's queue through the duplicate filter
    Push {
        job: String,

        #[arg(required = true)]
        urls: Vec<String>,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        priority: i32,
    },

    /// Print the queue length and number of seen fingerprints of a job
    Length { job: String },
}
