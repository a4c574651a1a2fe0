use std::net::IpAddr;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use flowquery::*;
use tracing::Level;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.flowquery/flowquery.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct UsersArgs {
    /// Target IP address the users were active on
    #[clap(short, long)]
    ip: IpAddr,

    /// Side of the flow the IP belongs to: source or destination
    #[clap(short = 'F', long, default_value = "destination")]
    flow_target: FlowTarget,

    /// Start of the time window, as unix timestamp or RFC3339-compliant string
    #[clap(short = 't', long)]
    from: Option<String>,

    /// End of the time window inclusive
    #[clap(short = 'T', long)]
    to: Option<String>,

    /// Duration from the from or to endpoint, e.g. 1h
    #[clap(short = 'd', long)]
    duration: Option<String>,

    /// Number of user buckets per page
    #[clap(short, long, default_value_t = 10)]
    limit: u32,

    /// Sort buckets by: name or count
    #[clap(short = 's', long, default_value = "name")]
    sort_field: UsersField,

    /// Sort direction: asc or desc
    #[clap(short = 'D', long, default_value = "asc")]
    direction: Direction,

    /// Additional filter clause as a raw JSON object
    #[clap(short = 'q', long)]
    filter_query: Option<String>,

    /// Pretty-print JSON output
    #[clap(long)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the users aggregation query for a single IP.
    Users {
        #[clap(flatten)]
        args: UsersArgs,
    },
}

fn run_users(config: &FlowqueryConfig, args: &UsersArgs) -> Result<String> {
    let filter_query = match &args.filter_query {
        Some(raw) => parse_filter_query(raw.as_str())?,
        None => None,
    };

    let options = UsersRequestOptions {
        ip: args.ip,
        sort: UsersSortField {
            field: args.sort_field,
            direction: args.direction,
        },
        filter_query,
        flow_target: args.flow_target,
        pagination: Pagination { limit: args.limit },
        source: config.source_configuration()?,
        timerange: resolve_time_range(&args.from, &args.to, &args.duration)?,
    };
    options.validate()?;

    let query = build_users_query(&options);
    let output = if args.pretty {
        serde_json::to_string_pretty(&query)?
    } else {
        query.to_string()
    };
    Ok(output)
}

fn main() {
    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();
    }

    let config = match FlowqueryConfig::new(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Users { args } => match run_users(&config, &args) {
            Ok(output) => println!("{output}"),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
    }
}
