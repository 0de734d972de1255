//! credchain command line
//!
//! Hashes diploma records, builds Merkle trees over them, hands out inclusion
//! proofs and checks proofs against a published root. Results go to stdout as
//! JSON or plain text; logs go to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use credchain_anchor::{
    AnchorBatch, AnchorConfig, EventQuery, HttpAnchorClient, confirm_inclusion,
};
use credchain_merkle::{
    CANONICAL_FORMAT_VERSION, Digest, IssuanceRecord, MerkleTree, Proof, Record, RecordKind,
    hash_record, verify_hex,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the leaf digest of one record
    Hash {
        /// Leaf format: student or issuance
        #[arg(long, default_value = "student")]
        kind: RecordKind,
        /// Record as a JSON object
        #[arg(long)]
        record: String,
    },
    /// Build a tree over a JSON array of records
    Build {
        #[arg(long, default_value = "student")]
        kind: RecordKind,
        /// File holding a JSON array of records
        #[arg(long)]
        input: PathBuf,
        /// Also print every level of the tree
        #[arg(long)]
        levels: bool,
    },
    /// Print the inclusion proof of one record
    Proof {
        #[arg(long, default_value = "student")]
        kind: RecordKind,
        #[arg(long)]
        input: PathBuf,
        /// Zero-based position of the record in the input
        #[arg(long)]
        index: usize,
    },
    /// Check a leaf digest against a root with a proof
    Verify {
        #[arg(long)]
        leaf: String,
        /// Proof as JSON text, or @path to read it from a file
        #[arg(long)]
        proof: String,
        #[arg(long)]
        root: String,
    },
    /// Build an issuance batch and submit it to the anchoring service
    Anchor {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        batch_id: String,
        #[arg(long)]
        label: String,
        /// Print the request instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
    /// List confirmed digests of a batch, or check one leaf
    Events {
        #[arg(long)]
        batch_id: String,
        /// Leaf digest to look for
        #[arg(long)]
        leaf: Option<String>,
        /// Proof of the leaf, so a confirmed root also counts (JSON or @path)
        #[arg(long, requires = "leaf")]
        proof: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Hash { kind, record } => {
            let value: Value =
                serde_json::from_str(&record).context("record is not valid JSON")?;
            let record = Record::from_json(kind, &value)?;
            println!("{}", hash_record(&record));
        }
        Command::Build {
            kind,
            input,
            levels,
        } => {
            let records = load_records(kind, &input)?;
            let tree = MerkleTree::build(&records);
            info!(records = records.len(), root = %tree.root_hex(), "Built tree");
            println!("{}", serde_json::to_string_pretty(&tree_report(kind, &tree, levels))?);
        }
        Command::Proof { kind, input, index } => {
            let records = load_records(kind, &input)?;
            let tree = MerkleTree::build(&records);
            let proof = tree.proof(index)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "leaf": tree.leaves()[index].to_hex(),
                    "root": tree.root_hex(),
                    "proof": proof.to_value(),
                }))?
            );
        }
        Command::Verify { leaf, proof, root } => {
            let proof = read_inline_or_file(&proof)?;
            let valid = verify_hex(leaf.trim(), &proof, root.trim())?;
            if valid {
                println!("valid");
            } else {
                println!("invalid");
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Anchor {
            input,
            batch_id,
            label,
            dry_run,
        } => {
            let config = AnchorConfig::from_env();
            let records = load_issuance_records(&input)?;
            let batch =
                AnchorBatch::prepare_chunked(batch_id, label, records, config.hash_chunk_size)
                    .await?;

            if dry_run {
                println!("{}", serde_json::to_string_pretty(&batch.request())?);
                return Ok(ExitCode::SUCCESS);
            }

            info!(service = %config.service_url, "Anchoring batch");
            let client = HttpAnchorClient::new(&config)?;
            let receipt = batch.submit(&client).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "batchId": batch.batch_id(),
                    "root": batch.tree().root_hex(),
                    "transactionHash": receipt.transaction_hash,
                }))?
            );
        }
        Command::Events {
            batch_id,
            leaf,
            proof,
        } => {
            let config = AnchorConfig::from_env();
            let client = HttpAnchorClient::new(&config)?;
            let events = client.anchored_events(&batch_id).await?;

            let Some(leaf) = leaf else {
                println!("{}", serde_json::to_string_pretty(&events)?);
                return Ok(ExitCode::SUCCESS);
            };

            let leaf = Digest::from_hex(leaf.trim())?;
            let proof = match proof {
                Some(arg) => Proof::from_json(&read_inline_or_file(&arg)?)?,
                None => Proof::default(),
            };
            match confirm_inclusion(&events, &leaf, &proof) {
                Some(event) => println!("{}", serde_json::to_string_pretty(event)?),
                None => {
                    warn!(%leaf, batch_id = %batch_id, "Leaf not confirmed on chain");
                    println!("not confirmed");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Read a JSON array of records of one kind
fn load_records(kind: RecordKind, path: &Path) -> Result<Vec<Record>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_records(kind, &text).with_context(|| format!("bad records in {}", path.display()))
}

fn parse_records(kind: RecordKind, text: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(text).context("not valid JSON")?;
    Ok(Record::parse_batch(kind, &value)?)
}

fn load_issuance_records(path: &Path) -> Result<Vec<IssuanceRecord>> {
    load_records(RecordKind::Issuance, path)?
        .into_iter()
        .map(|record| match record {
            Record::Issuance(record) => Ok(record),
            Record::Student(_) => Err(anyhow!("expected issuance records")),
        })
        .collect()
}

/// `@path` reads the file, anything else is taken literally
fn read_inline_or_file(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => {
            if path.is_empty() {
                bail!("missing file name after @");
            }
            std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
        }
        None => Ok(arg.to_string()),
    }
}

fn tree_report(kind: RecordKind, tree: &MerkleTree, with_levels: bool) -> Value {
    let mut report = json!({
        "kind": kind.as_str(),
        "formatVersion": CANONICAL_FORMAT_VERSION,
        "root": tree.root_hex(),
        "leaves": tree.leaves().iter().map(Digest::to_hex).collect::<Vec<_>>(),
        "proofs": tree.proofs().iter().map(Proof::to_value).collect::<Vec<_>>(),
    });
    if with_levels {
        report["levels"] = tree
            .levels()
            .iter()
            .map(|level| level.iter().map(Digest::to_hex).collect::<Vec<_>>())
            .collect::<Vec<_>>()
            .into();
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const STUDENTS: &str = r#"[
        {"nom": "Doe", "prenom": "John", "studentId": "ABC123"},
        {"nom": "Roe", "prenom": "Jane", "studentId": "XYZ789"}
    ]"#;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_kind_argument() {
        let cli =
            Cli::try_parse_from(["credchain", "hash", "--kind", "issuance", "--record", "{}"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Command::Hash {
                kind: RecordKind::Issuance,
                ..
            }
        ));
        let bad_kind = ["credchain", "hash", "--kind", "x", "--record", "{}"];
        assert!(Cli::try_parse_from(bad_kind).is_err());
    }

    #[test]
    fn test_tree_report() {
        let records = parse_records(RecordKind::Student, STUDENTS).unwrap();
        let tree = MerkleTree::build(&records);
        let report = tree_report(RecordKind::Student, &tree, true);

        assert_eq!(report["root"], tree.root_hex());
        assert_eq!(report["leaves"].as_array().unwrap().len(), 2);
        assert_eq!(report["proofs"][0][0]["position"], "right");
        assert_eq!(report["proofs"][1][0]["position"], "left");
        assert_eq!(report["levels"].as_array().unwrap().len(), 2);
        assert_eq!(report["formatVersion"], 1);
    }

    #[test]
    fn test_empty_report() {
        let tree = MerkleTree::build(&parse_records(RecordKind::Student, "[]").unwrap());
        let report = tree_report(RecordKind::Student, &tree, false);
        assert_eq!(report["root"], "");
        assert!(report.get("levels").is_none());
    }

    #[test]
    fn test_parse_records_errors() {
        assert!(parse_records(RecordKind::Student, "not json").is_err());
        assert!(parse_records(RecordKind::Student, r#"[{"nom": "Doe"}]"#).is_err());
    }

    #[test]
    fn test_inline_argument() {
        assert_eq!(read_inline_or_file("[]").unwrap(), "[]");
        assert!(read_inline_or_file("@").is_err());
        assert!(read_inline_or_file("@/definitely/not/here.json").is_err());
    }
}
