use std::{collections::BTreeMap, path::PathBuf};

use clap::{Parser, Subcommand};
use ringtable::{telemetry::initialize_json_subscriber, Member, Node, RingConfig, RingTable};

#[derive(Debug, Parser)]
#[command(name = "ringtable")]
#[command(about = "Shows how a bounded-load hash ring distributes keys", long_about = None)]
struct Cli {
    #[arg(long)]
    config_path: PathBuf,
    #[arg(short, long, default_value = "false")]
    json_logs: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Prints the owner of keys "0".."keys" and how many partitions each node owns
    #[command()]
    Distribute {
        #[arg(short, long, default_value_t = 20)]
        keys: usize,
    },
    /// Prints how the owner of keys "0".."keys" changes when `node` joins the ring and leaves it again
    #[command()]
    Churn {
        #[arg(short, long)]
        node: String,
        #[arg(short, long, default_value_t = 20)]
        keys: usize,
    },
}

fn owners(table: &RingTable<Node>, keys: usize) -> anyhow::Result<Vec<String>> {
    let mut res = Vec::with_capacity(keys);
    for key in 0..keys {
        let owner = table
            .get_node(key.to_string().as_bytes())?
            .map(|node| node.identity().to_string())
            .unwrap_or_else(|| "-".to_string());
        res.push(owner);
    }

    Ok(res)
}

fn print_loads(table: &RingTable<Node>) -> anyhow::Result<()> {
    let loads: BTreeMap<String, u64> = table.loads()?.into_iter().collect();
    println!("average load: {}", table.average_load()?);
    for (node, load) in loads {
        println!("{}: {} partitions", node, load);
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    if args.json_logs {
        initialize_json_subscriber();
    } else {
        tracing_subscriber::fmt::init();
    }

    let ring_config = RingConfig::from_path(&args.config_path)?;
    let nodes = ring_config.nodes.iter().map(Node::new);
    let table = RingTable::new(nodes, ring_config.to_config())?;

    match args.command {
        Commands::Distribute { keys } => {
            for (key, owner) in owners(&table, keys)?.into_iter().enumerate() {
                println!("{}: {}", key, owner);
            }
            print_loads(&table)?;
        }
        Commands::Churn { node, keys } => {
            let before = owners(&table, keys)?;
            table.add_node(Node::new(node.clone()))?;
            let added = owners(&table, keys)?;

            println!("Distribution after adding {}", node);
            for key in 0..keys {
                println!("{}: {} => {}", key, before[key], added[key]);
            }
            print_loads(&table)?;

            table.remove_node(&node)?;
            let removed = owners(&table, keys)?;

            println!("Distribution after removing {}", node);
            for key in 0..keys {
                println!("{}: {} => {}", key, added[key], removed[key]);
            }
            print_loads(&table)?;
        }
    }

    Ok(())
}
