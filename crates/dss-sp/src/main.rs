#![forbid(unsafe_code)]

//! dss-sp CLI: inspect the service provider's DSS identity and routing.

use clap::{Args, Parser, Subcommand};
use dss_sp::keys::{x509, FileKeyStore, KeyMaterialProvider, PrivateKeyEntry};
use dss_sp::provider::config::{DEFAULT_DESTINATION, DEFAULT_LANGUAGE, DEFAULT_TARGET};
use dss_sp::{algorithm, Error};
use dss_sp::provider::{
    RequestContext, RequestParameters, ServiceConfig, SignatureRequestService,
    StaticSignatureRequestService,
};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "dss-sp",
    about = "Service-provider identity and routing for the simple DSS signature protocol",
    version
)]
struct Cli {
    #[command(flatten)]
    service: ServiceArgs,

    #[command(flatten)]
    keystore: KeystoreArgs,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ServiceArgs {
    /// DSS endpoint receiving signature requests
    #[arg(long, env = "DSS_SP_DESTINATION", default_value = DEFAULT_DESTINATION, global = true)]
    destination: String,

    /// SP endpoint receiving the DSS response
    #[arg(long, env = "DSS_SP_TARGET", default_value = DEFAULT_TARGET, global = true)]
    target: String,

    /// Two-letter language for the DSS pages
    #[arg(long, env = "DSS_SP_LANGUAGE", default_value = DEFAULT_LANGUAGE, global = true)]
    language: String,
}

#[derive(Args)]
struct KeystoreArgs {
    /// SP private key (PEM or DER; PEM may also carry the certificate chain)
    #[arg(short = 'k', long, env = "DSS_SP_KEY", global = true)]
    key: Option<PathBuf>,

    /// SP certificate chain, leaf first (PEM or DER)
    #[arg(long, env = "DSS_SP_CERT", global = true)]
    cert: Option<PathBuf>,

    /// Password of an encrypted private key
    #[arg(long, env = "DSS_SP_KEY_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the SP signing identity and describe it
    Identity {
        /// Check certificate validity at this time instead of now ("YYYY-MM-DD+HH:MM:SS")
        #[arg(long)]
        at: Option<String>,
    },

    /// Mint relay state tokens
    RelayState {
        /// Number of tokens
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },

    /// Show what the protocol engine receives for one signature request
    Request {
        /// SP base URL to resolve relative endpoints against
        #[arg(long)]
        base_url: Option<url::Url>,

        /// Request parameter (NAME=VALUE, repeatable)
        #[arg(short = 'p', long = "param")]
        params: Vec<String>,

        /// Data to sign with the SP identity
        #[arg(long, default_value = "")]
        data: String,

        /// Signature algorithm URI (default depends on the key type)
        #[arg(long)]
        algorithm: Option<String>,

        /// Send without an SP signature when the identity cannot be loaded
        #[arg(long)]
        allow_unauthenticated: bool,
    },

    /// List supported key types and signature algorithms
    Info,
}

/// Stands in for a keystore when none was configured.
struct NoKeystore;

impl KeyMaterialProvider for NoKeystore {
    fn private_key_entry(&self) -> Result<PrivateKeyEntry, Error> {
        Err(Error::KeyNotFound(
            "no keystore configured (use --key or DSS_SP_KEY)".into(),
        ))
    }
}

type Service = StaticSignatureRequestService<Box<dyn KeyMaterialProvider>>;
type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = build_service(&cli.service, cli.keystore).and_then(|svc| match cli.command {
        Commands::Identity { at } => cmd_identity(&svc, at.as_deref()),
        Commands::RelayState { count } => cmd_relay_state(&svc, count),
        Commands::Request {
            base_url,
            params,
            data,
            algorithm,
            allow_unauthenticated,
        } => cmd_request(
            &svc,
            base_url,
            &params,
            data.as_bytes(),
            algorithm.as_deref(),
            allow_unauthenticated,
        ),
        Commands::Info => cmd_info(),
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_service(args: &ServiceArgs, keystore: KeystoreArgs) -> Result<Service, Box<dyn std::error::Error>> {
    let config = ServiceConfig::new(&args.destination, &args.target, &args.language)?;

    let provider: Box<dyn KeyMaterialProvider> = match keystore.key {
        Some(key) => {
            let mut store = FileKeyStore::new(key);
            if let Some(cert) = keystore.cert {
                store = store.with_chain(cert);
            }
            if let Some(password) = keystore.password {
                store = store.with_password(password);
            }
            Box::new(store)
        }
        None => Box::new(NoKeystore),
    };

    Ok(StaticSignatureRequestService::new(config, provider))
}

fn cmd_identity(svc: &Service, at: Option<&str>) -> CliResult {
    let identity = svc.sp_identity()?;
    let chain = identity.certificate_chain();

    println!("subject:      {}", identity.subject()?);
    println!("issuer:       {}", x509::issuer(identity.leaf_certificate())?);
    println!("key:          {:?}", identity.private_key());
    println!("sha256:       {}", identity.fingerprint_sha256());
    println!("chain size:   {}", identity.certificate_chain_size());
    for (i, der) in chain.iter().enumerate().skip(1) {
        println!("  [{i}]        {}", x509::subject(der)?);
    }

    match x509::check_time_validity(identity.leaf_certificate(), at) {
        Ok(()) => println!("validity:     OK"),
        Err(e) => {
            tracing::warn!(error = %e, "SP certificate outside its validity period");
            println!("validity:     {e}");
        }
    }
    if let Err(e) = x509::check_chain_order(chain) {
        tracing::warn!(error = %e, "SP certificate chain is not in leaf-to-root order");
        println!("chain order:  {e}");
    }
    Ok(())
}

fn cmd_relay_state(svc: &Service, count: usize) -> CliResult {
    let params = RequestParameters::new();
    for _ in 0..count {
        println!("{}", svc.relay_state(&params));
    }
    Ok(())
}

fn parse_params(raw: &[String]) -> Result<RequestParameters, Error> {
    let mut params = RequestParameters::new();
    for item in raw {
        let (name, value) = item
            .split_once('=')
            .ok_or_else(|| Error::Config(format!("expected NAME=VALUE, got {item:?}")))?;
        params
            .entry(name.to_owned())
            .or_default()
            .push(value.to_owned());
    }
    Ok(params)
}

fn cmd_request(
    svc: &Service,
    base_url: Option<url::Url>,
    raw_params: &[String],
    data: &[u8],
    algorithm_uri: Option<&str>,
    allow_unauthenticated: bool,
) -> CliResult {
    let params = parse_params(raw_params)?;

    let ctx = match RequestContext::assemble(svc, &params) {
        Ok(ctx) => ctx,
        Err(e) if allow_unauthenticated => {
            tracing::info!(error = %e, "continuing without SP signature");
            RequestContext::assemble_unauthenticated(svc, &params)
        }
        Err(e) => return Err(e.into()),
    };

    let (destination, target) = match &base_url {
        Some(base) => (
            ctx.destination.resolve(base)?.to_string(),
            ctx.target.resolve(base)?.to_string(),
        ),
        None => (ctx.destination.to_string(), ctx.target.to_string()),
    };

    println!("destination:  {destination}");
    println!("target:       {target}");
    println!("relay state:  {}", ctx.relay_state);
    println!("language:     {}", ctx.language);

    let Some(identity) = &ctx.identity else {
        println!("signed:       no");
        return Ok(());
    };

    let algo = algorithm_uri.unwrap_or_else(|| identity.default_algorithm());
    let signature = identity.sign(algo, data)?;
    let verified = identity.verify(algo, data, &signature)?;

    println!("signed:       yes");
    println!("chain size:   {}", identity.certificate_chain_size());
    println!("algorithm:    {algo}");
    println!("signature:    {}", hex::encode(&signature));
    println!("verified:     {verified}");

    if !verified {
        return Err(Error::Crypto("signature does not verify against the SP certificate".into()).into());
    }
    Ok(())
}

fn cmd_info() -> CliResult {
    println!("dss-sp: service-provider identity for the simple DSS protocol");
    println!();
    println!("Private key formats:");
    println!("  PKCS#8 (PEM/DER), encrypted PKCS#8, PKCS#1 RSA, SEC1 EC");
    println!("Key types:");
    println!("  RSA, EC P-256, EC P-384");
    println!("Signature algorithms:");
    for uri in algorithm::SIGNATURE_ALGORITHMS {
        println!("  {uri}");
    }
    Ok(())
}
