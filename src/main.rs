use clap::Parser;
use color_print::cformat;
use ping_pong_ring::{log, NodeConfig, Topology, TokenRingMember, Transport, DEFAULT_PORT};
use std::{error::Error, fs, path::PathBuf};

#[derive(Parser, Debug)]
#[command(name = "pingpong")]
#[command(about = "Run one member of a PING/PONG token ring", long_about = None)]
struct Args {
    /// This member's position in the ring, starting at 1. Member 1 creates the tokens.
    #[arg(long)]
    id: usize,

    /// Hosts file listing the ring members in order.
    #[arg(long, default_value = "/etc/hosts")]
    hosts: PathBuf,

    /// Only hosts whose address starts with this prefix are ring members.
    #[arg(long, default_value = "192.168.10.")]
    prefix: String,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address to accept the previous member on (defaults to 0.0.0.0:<port>).
    #[arg(long)]
    listen: Option<String>,

    /// JSON file with timing settings.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    critical_section_ms: Option<u64>,

    #[arg(long)]
    pong_delay_ms: Option<u64>,

    #[arg(long)]
    critical_section_rate: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn node_config(&self) -> Result<NodeConfig, Box<dyn Error + Send + Sync>> {
        let mut config = match &self.config {
            Some(path) => NodeConfig::from_json_file(path)?,
            None => NodeConfig::default(),
        };

        if let Some(ms) = self.critical_section_ms {
            config.critical_section_ms = ms;
        }
        if let Some(ms) = self.pong_delay_ms {
            config.pong_delay_ms = ms;
        }
        if self.critical_section_rate.is_some() {
            config.critical_section_rate = self.critical_section_rate;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let args = Args::parse();
    log::set_verbose(args.verbose);

    let config = args.node_config()?;
    let hosts = fs::read_to_string(&args.hosts)?;
    let topology = Topology::from_hosts(&hosts, &args.prefix, args.id)?;

    let listen = args
        .listen
        .clone()
        .unwrap_or_else(|| format!("0.0.0.0:{}", args.port));
    let next_address = topology.successor_address(args.port);

    log::info(&cformat!(
        "Member <bold>{}</bold> of <bold>{}</bold>, passing tokens to <bold>{next_address}</bold>.",
        topology.id(),
        topology.members().len()
    ));

    let channel = Transport::bind(&listen).await?.link(next_address);
    let mut member = TokenRingMember::new(topology.id(), channel, config);

    #[cfg(unix)]
    let _injector = ping_pong_ring::fault::spawn_signal_injector(member.loss_requests())?;

    let shutdown = member.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });

    member.initialize(topology.is_initiator()).await;
    if let Err(e) = member.run().await {
        log::critical(&format!("{e}"));
        return Err(e.into());
    }

    Ok(())
}
