//! Crawl a QuarkChain network and watch its nodes.

use clap::{Parser, Subcommand};
use log::LevelFilter;
use quarkchain_peers_crawler::{
    Address, CrawlerBuilder, JsonRpcClient, PortOffset, StatsMonitor, Topology, TranslationTable,
};
use std::net::IpAddr;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// IP address of the seed node.
    #[arg(long, default_value = "54.186.3.84")]
    ip: IpAddr,

    /// Peer-to-peer port of the seed node.
    #[arg(long, default_value = "48291")]
    p2p_port: u16,

    /// JSON-RPC port of the seed node. Every node is assumed to use the same p2p to RPC offset.
    #[arg(long, default_value = "48491")]
    jrpc_port: u16,

    /// JSON object translating internal hosts to reachable ones.
    #[arg(long, default_value = r#"{"172.31.15.196": "54.186.3.84"}"#)]
    ip_lookup: TranslationTable,

    /// Maximum number of concurrent tasks for crawling.
    #[arg(short, long, default_value = "8")]
    concurrent_tasks: usize,

    /// Abort the crawl after discovering this many nodes.
    #[arg(long, default_value = "10000")]
    max_nodes: usize,

    /// Log level.
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the RPC endpoint of every node in the network.
    Clusters,
    /// Print the network graph as a d3 JSON document.
    Topology,
    /// Print pending transaction counts of every node, every second.
    Watch,
    /// Print the peers of co-located nodes on consecutive ports.
    Range {
        /// Number of nodes.
        #[arg(long, default_value = "1")]
        count: u16,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    // Configure fern logger
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] {} - {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log_level)
        .chain(std::io::stderr())
        .apply()?;

    let seed = Address::new(args.ip, args.p2p_port);
    let offset = PortOffset::between(args.p2p_port, args.jrpc_port);
    log::debug!("Seed {seed}, RPC offset {offset}");

    let client = JsonRpcClient::new();
    let crawler = CrawlerBuilder::new(client.clone(), offset)
        .with_translation_table(args.ip_lookup)
        .with_max_concurrent_tasks(args.concurrent_tasks)
        .with_max_nodes(args.max_nodes)
        .build();

    match args.command {
        Command::Clusters => {
            let result = crawler.crawl(seed).await?;
            println!("{:#?}", display_all(&result.clusters()));
        }
        Command::Topology => {
            let result = crawler.crawl(seed).await?;
            let topology = Topology::from_cache(&result.cache, crawler.translation_table());
            println!("{}", serde_json::to_string(&topology)?);
        }
        Command::Watch => {
            let clusters = crawler.crawl(seed).await?.clusters();

            println!("=======================IDX MAPPING=======================");
            let mapping: Vec<String> = clusters
                .iter()
                .enumerate()
                .map(|(idx, cluster)| format!("idx={idx};host:json={cluster}"))
                .collect();
            println!("{mapping:#?}");

            let mut snapshots = StatsMonitor::new(client, clusters).watch();
            loop {
                tokio::select! {
                    snapshot = snapshots.recv() => match snapshot {
                        Some(snapshot) => println!("{snapshot}"),
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => {
                        log::info!("Interrupted, stopping");
                        break;
                    }
                }
            }
        }
        Command::Range { count } => {
            let result = crawler.fetch_range(seed, count).await;
            for (node, peers) in &result.cache {
                println!("{node}: {:#?}", display_all(peers));
            }
            for (node, err) in &result.unqueryable {
                println!("{node}: {err}");
            }
        }
    }

    Ok(())
}

fn display_all(addresses: &[Address]) -> Vec<String> {
    addresses.iter().map(Address::to_string).collect()
}
