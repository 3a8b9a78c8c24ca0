//! Loopback exchange exercising the harness end to end.
//!
//! A client and a server peer share one idler. Each round the client draws a
//! payload from its RNG, sends it, and expects the server to echo it back.
//!
//! # Usage
//!
//! ```bash
//! # Event-driven, every operation forced to retry once, reproducible RNGs
//! tlsprobe-loopback --mode event --delay-io --reproducible
//!
//! # Print the key-export report built from the peers' random material
//! tlsprobe-loopback --export-keys --log-level debug
//! ```

use std::{
    net::{TcpListener, TcpStream},
    time::Duration,
};

use clap::Parser;
use tlsprobe_crypto::{
    DrbgKind, ExportedKeys, HELLO_RANDOM_LEN, MASTER_SECRET_LEN, SrtpKeyMaterial, TlsPrf,
};
use tlsprobe_harness::{HarnessConfig, HarnessError, IoMode, TestDriver, logging};
use tlsprobe_io::{Direction, Idler, Readiness, Transport};

/// Loopback exchange through the TLS test harness
#[derive(Parser, Debug)]
#[command(name = "tlsprobe-loopback")]
#[command(about = "Loopback exchange through the TLS test harness")]
#[command(version)]
struct Args {
    /// DRBG mechanism (ctr, hmac)
    #[arg(long, default_value = "ctr")]
    drbg: DrbgKind,

    /// Seed both peers from the fixed seed
    #[arg(long)]
    reproducible: bool,

    /// I/O mode (blocking, event)
    #[arg(long, default_value = "blocking")]
    mode: IoMode,

    /// Force one retry per read and write
    #[arg(long)]
    delay_io: bool,

    /// Report a constant Unix time
    #[arg(long)]
    fixed_time: bool,

    /// Number of echo rounds
    #[arg(long, default_value = "8")]
    rounds: usize,

    /// Payload size per round in bytes. Peers take turns on one thread, so
    /// a payload must fit in the loopback socket buffers.
    #[arg(long, default_value = "1024")]
    payload_size: usize,

    /// Bound on a single stalled read or write, in milliseconds
    #[arg(long, default_value = "5000")]
    read_timeout_ms: u64,

    /// Log key-export records built from the peers' randomness
    #[arg(long)]
    export_keys: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn peer_config(&self, personalization: &[u8]) -> HarnessConfig {
        HarnessConfig {
            drbg: self.drbg,
            reproducible: self.reproducible,
            personalization: personalization.to_vec(),
            io_mode: self.mode,
            delay_io: self.delay_io,
            fixed_time: self.fixed_time,
            read_timeout: Some(Duration::from_millis(self.read_timeout_ms)),
            ..Default::default()
        }
    }
}

fn export_keys<T>(
    client: &mut TestDriver<'_, T>,
    server: &mut TestDriver<'_, T>,
) -> Result<SrtpKeyMaterial, HarnessError>
where
    T: Transport + Readiness,
{
    let mut master_secret = [0u8; MASTER_SECRET_LEN];
    let mut client_random = [0u8; HELLO_RANDOM_LEN];
    let mut server_random = [0u8; HELLO_RANDOM_LEN];
    client.random(&mut master_secret)?;
    client.random(&mut client_random)?;
    server.random(&mut server_random)?;

    Ok(ExportedKeys::capture(&master_secret, &client_random, &server_random, TlsPrf::Sha256))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init(&args.log_level);

    let idler = Idler::new()?;
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let client_stream = TcpStream::connect(listener.local_addr()?)?;
    let (server_stream, peer) = listener.accept()?;
    tracing::info!("loopback connected via {peer}");

    let client_io = idler.register_tcp(client_stream)?;
    let server_io = idler.register_tcp(server_stream)?;

    let mut client = TestDriver::new(&args.peer_config(b"tlsprobe client"), client_io, &idler)?;
    let mut server = TestDriver::new(&args.peer_config(b"tlsprobe server"), server_io, &idler)?;

    let mut payload = vec![0u8; args.payload_size];
    let mut echoed = vec![0u8; args.payload_size];
    for round in 0..args.rounds {
        client.random(&mut payload)?;
        client.send_all(&payload)?;

        server.recv_exact(&mut echoed)?;
        server.send_all(&echoed)?;

        echoed.fill(0);
        client.recv_exact(&mut echoed)?;
        if echoed != payload {
            return Err(format!("round {round}: echo mismatch").into());
        }
        tracing::debug!(round, bytes = payload.len(), "echo verified");
    }

    tracing::info!(
        rounds = args.rounds,
        mode = %args.mode,
        client_forced_reads = client.transport().forced(Direction::Read),
        client_forced_writes = client.transport().forced(Direction::Write),
        server_forced_reads = server.transport().forced(Direction::Read),
        server_forced_writes = server.transport().forced(Direction::Write),
        unix_time = client.unix_time(),
        "loopback exchange complete"
    );

    if args.export_keys {
        let keys = export_keys(&mut client, &mut server)?;
        tracing::info!("key export ({}):\n{}", keys.label(), keys.hex_report());
    }

    Ok(())
}
