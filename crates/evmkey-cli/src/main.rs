//! EvmKey CLI
//!
//! Offline HD wallet tool: create and restore wallets, sign legacy
//! transactions, and encode/decode token calls.

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use evmkey_chain::abi::{self, ReturnKind};
use evmkey_chain::transaction::{parse_recipient, RawTransaction, SignedTransaction};
use evmkey_chain::units;
use evmkey_core::wallet;
use evmkey_core::{
    AbiArg, Address, DerivationPath, KnownSelectors, PrivateKey, WalletConfig, WordCount, U256,
};
use evmkey_crypto::encoding;
use serde_json::json;

#[derive(Parser)]
#[command(name = "evmkey")]
#[command(author = "EvmKey Team")]
#[command(version = "0.1.0")]
#[command(about = "HD wallet keys and offline transaction signing", long_about = None)]
struct Cli {
    /// Wallet config file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured chain id
    #[arg(long, global = true)]
    chain_id: Option<u64>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new mnemonic and its account
    Create {
        /// Number of words (12 or 24)
        #[arg(short, long)]
        words: Option<usize>,
    },

    /// Restore an account from a mnemonic (read from stdin if omitted)
    Restore {
        #[arg(short, long)]
        phrase: Option<String>,

        /// Optional BIP39 passphrase
        #[arg(long, default_value = "")]
        passphrase: String,

        /// Address index under m/44'/60'/0'/0 (default: configured path)
        #[arg(short, long)]
        index: Option<u32>,

        /// Also print the private key
        #[arg(long)]
        show_key: bool,
    },

    /// Print the address of a private key
    Address {
        /// Private key hex
        #[arg(short, long)]
        key: String,
    },

    /// Sign a native currency transfer
    SignTransfer {
        #[arg(short, long)]
        key: String,

        #[arg(long)]
        nonce: u64,

        /// Gas price in gwei
        #[arg(long)]
        gas_price: String,

        /// Gas limit (default: config native_gas_limit)
        #[arg(long)]
        gas_limit: Option<u64>,

        #[arg(long)]
        to: String,

        /// Amount in ether
        #[arg(long)]
        value: String,
    },

    /// Sign a token transfer call
    SignTokenTransfer {
        #[arg(short, long)]
        key: String,

        #[arg(long)]
        nonce: u64,

        /// Gas price in gwei
        #[arg(long)]
        gas_price: String,

        #[arg(long)]
        gas_limit: u64,

        /// Token contract
        #[arg(long)]
        token: String,

        #[arg(long)]
        to: String,

        /// Amount in whole tokens
        #[arg(long)]
        amount: String,

        /// Token decimals
        #[arg(long, default_value = "18")]
        decimals: u8,
    },

    /// Function selector of a signature, e.g. "transfer(address,uint256)"
    Selector { signature: String },

    /// Calldata for balanceOf(owner)
    EncodeBalance { owner: String },

    /// Calldata for transfer(to, amount)
    EncodeTransfer {
        #[arg(long)]
        to: String,

        /// Amount in base units
        #[arg(long)]
        amount: String,
    },

    /// Decode call return data
    Decode {
        /// Return type
        #[arg(short = 't', long, default_value = "uint256")]
        kind: ReturnKindArg,

        /// Return data hex
        data: String,
    },

    /// Convert between decimal amounts and base units
    Units {
        #[command(subcommand)]
        action: UnitsAction,
    },
}

#[derive(Subcommand)]
enum UnitsAction {
    /// Decimal amount to base units
    Parse {
        amount: String,
        #[arg(short, long, default_value = "18")]
        decimals: u8,
    },
    /// Base units to a rounded decimal amount
    Format {
        value: String,
        #[arg(short, long, default_value = "18")]
        decimals: u8,
        /// Fractional digits (default: config display_precision)
        #[arg(short, long)]
        precision: Option<u8>,
    },
}

#[derive(Clone, ValueEnum)]
enum ReturnKindArg {
    Uint256,
    Uint8,
    String,
}

impl From<ReturnKindArg> for ReturnKind {
    fn from(arg: ReturnKindArg) -> Self {
        match arg {
            ReturnKindArg::Uint256 => ReturnKind::Uint256,
            ReturnKindArg::Uint8 => ReturnKind::Uint8,
            ReturnKindArg::String => ReturnKind::String,
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref(), cli.chain_id)?;
    let json_output = cli.json;

    match cli.command {
        Commands::Create { words } => cmd_create(&config, words, json_output)?,
        Commands::Restore {
            phrase,
            passphrase,
            index,
            show_key,
        } => {
            let config = match index {
                Some(index) => WalletConfig {
                    derivation_path: DerivationPath::account(index)?.to_string(),
                    ..config
                },
                None => config,
            };
            cmd_restore(&config, phrase, &passphrase, show_key, json_output)?
        }
        Commands::Address { key } => {
            let address = wallet::derive_address(&parse_key(&key)?)?;
            print_value(json_output, "address", &address.to_string());
        }
        Commands::SignTransfer {
            key,
            nonce,
            gas_price,
            gas_limit,
            to,
            value,
        } => {
            let signed = RawTransaction::native_transfer(
                nonce,
                parse_gwei(&gas_price)?,
                gas_limit.unwrap_or(config.native_gas_limit),
                parse_recipient(&to)?,
                units::to_wei(&value)?,
            )?
            .sign(&parse_key(&key)?, config.chain_id)?;
            print_signed(&signed, json_output)?;
        }
        Commands::SignTokenTransfer {
            key,
            nonce,
            gas_price,
            gas_limit,
            token,
            to,
            amount,
            decimals,
        } => {
            let args = [
                AbiArg::Address(parse_recipient(&to)?),
                AbiArg::Uint256(units::parse_units(&amount, decimals)?),
            ];
            let data = abi::encode_call(KnownSelectors::TRANSFER, &args)?;
            let signed = RawTransaction::contract_call(
                nonce,
                parse_gwei(&gas_price)?,
                gas_limit,
                parse_recipient(&token)?,
                data,
            )?
            .sign(&parse_key(&key)?, config.chain_id)?;
            print_signed(&signed, json_output)?;
        }
        Commands::Selector { signature } => {
            print_value(json_output, "selector", &abi::selector_hex(&signature));
        }
        Commands::EncodeBalance { owner } => {
            let data = wallet::encode_balance_query(&parse_address(&owner)?);
            print_value(json_output, "data", &encoding::encode_hex_prefixed(&data));
        }
        Commands::EncodeTransfer { to, amount } => {
            let amount = units::parse_units(&amount, 0)?;
            let data = wallet::encode_transfer_call(&parse_address(&to)?, &amount)?;
            print_value(json_output, "data", &encoding::encode_hex_prefixed(&data));
        }
        Commands::Decode { kind, data } => {
            let bytes = encoding::decode_hex(&data).context("return data is not hex")?;
            let value = ReturnKind::from(kind).decode(&bytes)?;
            print_value(json_output, "value", &value.to_string());
        }
        Commands::Units { action } => cmd_units(&config, action, json_output)?,
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>, chain_id: Option<u64>) -> Result<WalletConfig> {
    let mut config = match path {
        Some(path) => WalletConfig::from_file(path)?,
        None => WalletConfig::default(),
    };
    if let Some(chain_id) = chain_id {
        config = config.with_chain_id(chain_id);
    }
    config.validate()?;
    Ok(config)
}

fn cmd_create(config: &WalletConfig, words: Option<usize>, json_output: bool) -> Result<()> {
    let word_count = match words {
        Some(n) => WordCount::try_from(n)?,
        None => config.word_count,
    };
    let created = wallet::create_wallet(config, word_count)?;

    if json_output {
        let out = json!({
            "address": created.address,
            "mnemonic": created.phrase.phrase().as_str(),
            "private_key": created.key.to_hex().as_str(),
            "derivation_path": config.derivation_path,
            "parent_key_encoding": config.parent_key_encoding,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!();
        println!("New wallet ({} words)", word_count.words());
        println!("{:-<60}", "");
        println!("Address:     {}", created.address);
        println!("Mnemonic:    {}", created.phrase.phrase().as_str());
        println!("Private Key: {}", created.key.to_hex().as_str());
        println!("Path:        {}", config.derivation_path);
        println!("{:-<60}", "");
        eprintln!("Write the mnemonic down; it is the only backup of this key.");
    }
    Ok(())
}

fn cmd_restore(
    config: &WalletConfig,
    phrase: Option<String>,
    passphrase: &str,
    show_key: bool,
    json_output: bool,
) -> Result<()> {
    let phrase = match phrase {
        Some(phrase) => phrase,
        None => {
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("failed to read mnemonic from stdin")?;
            line
        }
    };
    let restored = wallet::restore_wallet_with_passphrase(config, &phrase, passphrase)?;

    if json_output {
        let mut out = json!({ "address": restored.address });
        if show_key {
            out["private_key"] = json!(restored.key.to_hex().as_str());
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Address:     {}", restored.address);
        if show_key {
            println!("Private Key: {}", restored.key.to_hex().as_str());
        }
    }
    Ok(())
}

fn cmd_units(config: &WalletConfig, action: UnitsAction, json_output: bool) -> Result<()> {
    match action {
        UnitsAction::Parse { amount, decimals } => {
            let value = units::parse_units(&amount, decimals)?;
            print_value(json_output, "value", &value.to_string());
        }
        UnitsAction::Format {
            value,
            decimals,
            precision,
        } => {
            let value = units::parse_units(&value, 0)?;
            let precision = precision.unwrap_or(config.display_precision);
            print_value(
                json_output,
                "amount",
                &units::format_units(&value, decimals, precision),
            );
        }
    }
    Ok(())
}

fn parse_key(input: &str) -> Result<PrivateKey> {
    PrivateKey::from_hex(input).context("invalid private key")
}

fn parse_address(input: &str) -> Result<Address> {
    input
        .parse()
        .with_context(|| format!("invalid address '{}'", input))
}

fn parse_gwei(input: &str) -> Result<U256> {
    units::parse_units(input, 9).with_context(|| format!("invalid gas price '{}'", input))
}

fn print_signed(signed: &SignedTransaction, json_output: bool) -> Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(&signed.summary())?);
    } else {
        println!("Raw:  {}", signed.raw_hex());
        println!("Hash: {}", signed.hash_hex());
    }
    Ok(())
}

fn print_value(json_output: bool, field: &str, value: &str) {
    if json_output {
        println!("{}", json!({ field: value }));
    } else {
        println!("{}", value);
    }
}
