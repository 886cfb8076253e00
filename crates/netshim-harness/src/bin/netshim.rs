//! CLI entrypoint for netshim.

use std::io::Write;

use clap::{Parser, Subcommand, ValueEnum};

use netshim::AddrInfoHints;
use netshim_harness::commands::{self, ResolveRequest};
use netshim_harness::{HarnessConfig, LogLevel, LogSink, OutputFormat};

/// Host and address lookups through the C library.
#[derive(Debug, Parser)]
#[command(name = "netshim")]
#[command(about = "getaddrinfo / gethostname / sethostname from the command line")]
struct Cli {
    /// Output format (overrides NETSHIM_FORMAT).
    #[arg(long, global = true)]
    format: Option<OutputFormat>,
    /// JSONL log destination: `off`, `stderr`, or a path (overrides NETSHIM_LOG).
    #[arg(long, global = true)]
    log: Option<String>,
    /// Minimum log level (overrides NETSHIM_LOG_LEVEL).
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Family {
    Any,
    Inet,
    Inet6,
}

impl Family {
    fn raw(self) -> i32 {
        match self {
            Self::Any => libc::AF_UNSPEC,
            Self::Inet => libc::AF_INET,
            Self::Inet6 => libc::AF_INET6,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SockType {
    Any,
    Stream,
    Dgram,
    Raw,
}

impl SockType {
    fn raw(self) -> i32 {
        match self {
            Self::Any => 0,
            Self::Stream => libc::SOCK_STREAM,
            Self::Dgram => libc::SOCK_DGRAM,
            Self::Raw => libc::SOCK_RAW,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve a host and/or service.
    Resolve {
        /// Host name or numeric address.
        #[arg(long)]
        host: Option<String>,
        /// Service name or port number.
        #[arg(long)]
        service: Option<String>,
        #[arg(long, value_enum, default_value = "any")]
        family: Family,
        #[arg(long, value_enum, default_value = "any")]
        socktype: SockType,
        /// Protocol number (0 lets the resolver choose).
        #[arg(long, default_value_t = 0)]
        protocol: i32,
        /// Request the canonical name (AI_CANONNAME).
        #[arg(long)]
        canonname: bool,
        /// Wildcard address for binding when no host is given (AI_PASSIVE).
        #[arg(long)]
        passive: bool,
        /// Do not look the host up, only parse it (AI_NUMERICHOST).
        #[arg(long)]
        numeric_host: bool,
        /// Do not look the service up, only parse it (AI_NUMERICSERV).
        #[arg(long)]
        numeric_service: bool,
    },
    /// Print the current host name.
    Hostname,
    /// Set the host name (usually needs privileges).
    SetHostname { name: String },
    /// Swap the two bytes of a 16-bit value (decimal or 0x hex).
    Swap16 { value: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = HarnessConfig::from_env().with_overrides(
        cli.log.as_deref().map(LogSink::from_str_loose),
        cli.log_level,
        cli.format,
    );
    let run_id = format!("pid-{}", std::process::id());
    let mut log = commands::open_emitter(&config, &run_id)?;

    let output = match cli.command {
        Command::Resolve {
            host,
            service,
            family,
            socktype,
            protocol,
            canonname,
            passive,
            numeric_host,
            numeric_service,
        } => {
            let mut flags = 0;
            for (set, flag) in [
                (canonname, libc::AI_CANONNAME),
                (passive, libc::AI_PASSIVE),
                (numeric_host, libc::AI_NUMERICHOST),
                (numeric_service, libc::AI_NUMERICSERV),
            ] {
                if set {
                    flags |= flag;
                }
            }
            let request = ResolveRequest {
                host,
                service,
                hints: AddrInfoHints::new()
                    .with_flags(flags)
                    .with_family(family.raw())
                    .with_socktype(socktype.raw())
                    .with_protocol(protocol),
            };
            commands::resolve(&request, config.format, &mut log)
        }
        Command::Hostname => commands::hostname(config.format, &mut log),
        Command::SetHostname { name } => {
            commands::set_hostname(&name, &mut log).map(|()| String::new())
        }
        Command::Swap16 { value } => commands::swap16(&value, config.format),
    };
    log.flush()?;

    let output = output?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
