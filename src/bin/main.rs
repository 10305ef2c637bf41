//! Document Signer CLI
//!
//! Digest, sign and verify documents with text or trailer signature
//! envelopes, issue X.509 client certificates and manage configuration.

use clap::{Parser, Subcommand, ValueEnum};
use document_signer::{
    compute_digest,
    infra::config::ExportFormat,
    services::{CertificateIssuer, DigestService, KeyService, SigningService, VerificationService},
    CertificateAuthority, ConfigManager, DocumentId, EnvelopeFormat, IssuedCertificate,
    KeyMaterial, SignatureRecord, SignerConfiguration, SigningError, UserId,
};
use miette::{Context, IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "document-signer")]
#[command(about = "Sign documents with RSA signature envelopes and issue client certificates")]
#[command(long_about = "
Document Signer - document integrity and signing utility

EXAMPLES:
    # Print the SHA-256 digest of a file
    document-signer digest report.txt

    # Sign and keep the signature record for later verification
    document-signer sign report.txt --record report.sig.json

    # Verify a signed copy against its record
    document-signer verify report.txt.signed --record report.sig.json

    # Issue a self-signed client certificate
    document-signer cert self-signed --name Alice --email alice@example.com --out-dir certs

    # Create a long-lived CA and register it in the configuration
    document-signer cert ca-init

ENVIRONMENT VARIABLES:
    RUST_LOG        Logging level (debug, info, warn, error)
")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the SHA-256 digest of a file
    Digest {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Sign a file with a fresh RSA-2048 key pair
    Sign {
        #[arg(value_name = "INPUT_FILE")]
        input_file: PathBuf,

        /// Signed output (defaults to the input path plus the signed suffix)
        #[arg(short, long, value_name = "OUTPUT_FILE")]
        output: Option<PathBuf>,

        /// Envelope format (overrides config)
        #[arg(long, value_enum)]
        format: Option<EnvelopeFormatArg>,

        /// Write the signature record as JSON here instead of stdout
        #[arg(long, value_name = "FILE")]
        record: Option<PathBuf>,

        /// Signer recorded on the signature
        #[arg(long, default_value = "cli")]
        signer: String,

        /// Leave the private key off the record (overrides config)
        #[arg(long)]
        discard_private_key: bool,
    },

    /// Verify a signed file against a signature record
    Verify {
        #[arg(value_name = "SIGNED_FILE")]
        file: PathBuf,

        /// Signature record JSON produced by `sign`
        #[arg(long, value_name = "FILE")]
        record: PathBuf,
    },

    /// Certificate issuance
    #[command(subcommand)]
    Cert(CertCommands),

    /// Show the fields of a PEM certificate
    Inspect {
        #[arg(value_name = "CERT_PEM")]
        file: PathBuf,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum CertCommands {
    /// Self-signed one-year client certificate
    SelfSigned {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Directory for the PEM files (defaults to JSON on stdout)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Client certificate signed by a CA generated for this call
    Ephemeral {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Sign a PEM certificate request
    Csr {
        #[arg(value_name = "CSR_PEM")]
        file: PathBuf,
        /// Certificate output (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a long-lived CA and record its paths in the configuration
    CaInit {
        /// Replace an existing CA
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Create default configuration file
    Init,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// Export configuration
    Export {
        /// Export format
        #[arg(short, long, value_enum, default_value = "toml")]
        format: ExportFormatArg,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import configuration
    Import {
        /// Configuration file to import
        file: PathBuf,
        /// Import format
        #[arg(short, long, value_enum, default_value = "toml")]
        format: ExportFormatArg,
    },
}

#[derive(ValueEnum, Clone, Copy)]
enum EnvelopeFormatArg {
    Text,
    Trailer,
}

impl From<EnvelopeFormatArg> for EnvelopeFormat {
    fn from(arg: EnvelopeFormatArg) -> Self {
        match arg {
            EnvelopeFormatArg::Text => EnvelopeFormat::Text,
            EnvelopeFormatArg::Trailer => EnvelopeFormat::Trailer,
        }
    }
}

#[derive(ValueEnum, Clone, Copy)]
enum ExportFormatArg {
    Toml,
    Json,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Toml => ExportFormat::Toml,
            ExportFormatArg::Json => ExportFormat::Json,
        }
    }
}

/// Parameters for the sign command
struct SignCommandArgs {
    input_file: PathBuf,
    output: Option<PathBuf>,
    format: Option<EnvelopeFormatArg>,
    record: Option<PathBuf>,
    signer: String,
    discard_private_key: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config_manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new().into_diagnostic()?,
    };

    match cli.command {
        Commands::Digest { file } => {
            let digest = DigestService::new()
                .compute_file_digest(&file)
                .into_diagnostic()?;
            println!("{digest}  {}", file.display());
        }

        Commands::Sign {
            input_file,
            output,
            format,
            record,
            signer,
            discard_private_key,
        } => {
            let args = SignCommandArgs {
                input_file,
                output,
                format,
                record,
                signer,
                discard_private_key,
            };
            handle_sign_command(&config_manager, args)?;
        }

        Commands::Verify { file, record } => handle_verify_command(&file, &record)?,

        Commands::Cert(cert_cmd) => handle_cert_command(&config_manager, cert_cmd)?,

        Commands::Inspect { file } => {
            let pem = std::fs::read_to_string(&file)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to read {}", file.display()))?;
            let summary = document_signer::inspect_certificate(&pem).into_diagnostic()?;
            println!("{}", serde_json::to_string_pretty(&summary).into_diagnostic()?);
        }

        Commands::Config(config_cmd) => handle_config_command(&config_manager, config_cmd)?,
    }

    Ok(())
}

/// Saved configuration if present, defaults otherwise. Never writes.
fn load_config(manager: &ConfigManager) -> Result<SignerConfiguration> {
    if manager.config_path().exists() {
        manager.load().into_diagnostic()
    } else {
        Ok(SignerConfiguration::default())
    }
}

fn handle_sign_command(manager: &ConfigManager, args: SignCommandArgs) -> Result<()> {
    let config = load_config(manager)?;
    let format = args.format.map_or(config.envelope_format, Into::into);
    let retain = config.retain_private_key && !args.discard_private_key;
    let signer = UserId::new(&args.signer).into_diagnostic()?;

    let original = std::fs::read(&args.input_file)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read input file {}", args.input_file.display()))?;
    let digest = compute_digest(&original);

    let pair = KeyService::new().generate_key_pair().into_diagnostic()?;
    let signature = SigningService::new()
        .sign_digest(&digest, pair.signing_key())
        .into_diagnostic()?;

    let mut record = SignatureRecord::new(
        DocumentId::new(0),
        signer,
        signature.to_base64(),
        chrono::Utc::now().timestamp(),
    );
    record.public_key = Some(pair.verifying_key().to_public_key_b64().into_diagnostic()?);
    if retain {
        record.private_key = Some(pair.signing_key().to_private_key_b64().into_diagnostic()?);
    }

    let output = args.output.unwrap_or_else(|| {
        let mut path = args.input_file.clone().into_os_string();
        path.push(&config.signed_suffix);
        PathBuf::from(path)
    });
    std::fs::write(&output, format.embed(&original, &signature))
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to write {}", output.display()))?;
    log::info!("Signed {} ({format} envelope)", args.input_file.display());

    let record_json = serde_json::to_string_pretty(&record).into_diagnostic()?;
    match args.record {
        Some(path) => {
            std::fs::write(&path, record_json).into_diagnostic()?;
            println!("✅ Signed file: {}", output.display());
            println!("   Signature record: {}", path.display());
        }
        None => {
            eprintln!("✅ Signed file: {}", output.display());
            println!("{record_json}");
        }
    }
    Ok(())
}

fn handle_verify_command(file: &Path, record_path: &Path) -> Result<()> {
    let signed = std::fs::read(file)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", file.display()))?;
    let record_json = std::fs::read_to_string(record_path).into_diagnostic()?;
    let record: SignatureRecord = serde_json::from_str(&record_json)
        .into_diagnostic()
        .wrap_err("Invalid signature record")?;

    let extracted = EnvelopeFormat::detect(&signed)
        .extract(&signed)
        .into_diagnostic()?;
    let material = KeyMaterial::from_record(&record).into_diagnostic()?;
    let report = VerificationService::new().verify_extracted(&extracted, &material);

    if report.verified {
        println!("✅ {}", report.reason());
        if let Some(digest) = &report.digest {
            println!("   Digest: {digest}");
        }
        Ok(())
    } else {
        println!("❌ {}", report.reason());
        Err(report
            .failure
            .unwrap_or_else(|| SigningError::VerificationFailed("not verified".to_string())))
        .into_diagnostic()
    }
}

fn handle_cert_command(manager: &ConfigManager, cert_cmd: CertCommands) -> Result<()> {
    let config = load_config(manager)?;

    match cert_cmd {
        CertCommands::SelfSigned {
            name,
            email,
            out_dir,
        } => {
            let issuer = CertificateIssuer::from_config(&config).into_diagnostic()?;
            let issued = issuer
                .self_signed_user_certificate(&name, &email)
                .into_diagnostic()?;
            emit_issued(&issued, &name, out_dir.as_deref())?;
        }

        CertCommands::Ephemeral {
            name,
            email,
            out_dir,
        } => {
            let issuer = CertificateIssuer::from_config(&config).into_diagnostic()?;
            let issued = issuer
                .issue_via_ephemeral_ca(&name, &email)
                .into_diagnostic()?;
            emit_issued(&issued, &name, out_dir.as_deref())?;
        }

        CertCommands::Csr { file, output } => {
            let csr = std::fs::read_to_string(&file).into_diagnostic()?;
            let issuer = CertificateIssuer::from_config(&config).into_diagnostic()?;
            let cert = issuer.issue_from_csr(&csr).into_diagnostic()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, cert).into_diagnostic()?;
                    println!("✅ Certificate written to: {}", path.display());
                }
                None => print!("{cert}"),
            }
        }

        CertCommands::CaInit { force } => {
            let base = manager
                .config_path()
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let cert_path = config
                .ca_cert_path
                .clone()
                .unwrap_or_else(|| base.join("ca.pem"));
            let key_path = config
                .ca_key_path
                .clone()
                .unwrap_or_else(|| base.join("ca.key"));
            if cert_path.exists() && !force {
                return Err(SigningError::ConfigurationError(format!(
                    "CA already exists at {} (use --force to replace)",
                    cert_path.display()
                )))
                .into_diagnostic();
            }

            let ca = CertificateAuthority::generate(
                &config.ca_common_name,
                &config.organization,
                config.serial_policy,
            )
            .into_diagnostic()?;
            ca.save(&cert_path, &key_path).into_diagnostic()?;

            let mut updated = config.clone();
            updated.ca_cert_path = Some(cert_path.clone());
            updated.ca_key_path = Some(key_path);
            manager.save(&updated).into_diagnostic()?;
            println!("✅ CA created: {}", cert_path.display());
        }
    }

    Ok(())
}

fn emit_issued(issued: &IssuedCertificate, name: &str, out_dir: Option<&Path>) -> Result<()> {
    let Some(dir) = out_dir else {
        println!("{}", serde_json::to_string_pretty(issued).into_diagnostic()?);
        return Ok(());
    };

    std::fs::create_dir_all(dir).into_diagnostic()?;
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let mut files = vec![
        (format!("{stem}.crt.pem"), &issued.certificate_pem),
        (format!("{stem}.key.pem"), &issued.private_key_pem),
        (format!("{stem}.pub.pem"), &issued.public_key_pem),
    ];
    if let Some(ca) = &issued.issuer_certificate_pem {
        files.push((format!("{stem}.ca.pem"), ca));
    }
    for (file_name, content) in files {
        let path = dir.join(file_name);
        std::fs::write(&path, content).into_diagnostic()?;
        println!("✅ Wrote {}", path.display());
    }
    Ok(())
}

fn handle_config_command(config_manager: &ConfigManager, config_cmd: ConfigCommands) -> Result<()> {
    match config_cmd {
        ConfigCommands::Show => match config_manager.load() {
            Ok(config) => {
                println!("📋 Current Configuration:");
                println!("  Signed suffix: {}", config.signed_suffix);
                println!("  Envelope format: {}", config.envelope_format);
                println!("  Retain private key: {}", config.retain_private_key);
                println!("  Organization: {}", config.organization);
                println!("  CA common name: {}", config.ca_common_name);
                println!("  Serial policy: {}", config.serial_policy);
                if let (Some(cert), Some(key)) = (&config.ca_cert_path, &config.ca_key_path) {
                    println!("  CA certificate: {}", cert.display());
                    println!("  CA key: {}", key.display());
                }
                println!(
                    "  Configuration file: {}",
                    config_manager.config_path().display()
                );
            }
            Err(_) => {
                println!("📋 No configuration file found. Use 'config init' to create one.");
            }
        },

        ConfigCommands::Init => {
            let _config = config_manager.load_or_create_default().into_diagnostic()?;
            println!(
                "✅ Configuration initialized: {}",
                config_manager.config_path().display()
            );
            println!("   Edit the file to customize settings, or use 'config set' commands.");
        }

        ConfigCommands::Set { key, value } => {
            config_manager
                .update_value(&key, &value)
                .into_diagnostic()?;
            println!("✅ Configuration updated: {key} = {value}");
        }

        ConfigCommands::Export { format, output } => {
            let content = config_manager
                .export_config(format.into())
                .into_diagnostic()?;

            if let Some(output_path) = output {
                std::fs::write(&output_path, content).into_diagnostic()?;
                println!("✅ Configuration exported to: {}", output_path.display());
            } else {
                println!("{content}");
            }
        }

        ConfigCommands::Import { file, format } => {
            let content = std::fs::read_to_string(&file).into_diagnostic()?;
            config_manager
                .import_config(&content, format.into())
                .into_diagnostic()?;
            println!("✅ Configuration imported from: {}", file.display());
        }
    }

    Ok(())
}
