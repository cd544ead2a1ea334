use crate::error::Result;

use super::commands::{LatestArgs, SubmitArgs, VerifyArgs};
use crate::config::{Config, ConfigOverrides};
use crate::locate;
use crate::proof::verify::verify_proof_file;
use crate::publish::{self, PublishOutcome, PublishedProof};
use crate::storage::filesystem::FilesystemProofStore;
use crate::storage::rekor::RekorClient;

fn resolve_config(overrides: &ConfigOverrides) -> Result<Config> {
    let cwd = std::env::current_dir()?;
    Config::resolve(&cwd, overrides)
}

fn print_published(proof: &PublishedProof) {
    println!("✅ Rekor DSSE submit succeeded ({})", proof.status);
    println!("   Artifact: {}", proof.artifact_path.display());
    println!("   Artifact SHA256: {}", proof.sha256);
    println!("   Key: {}", proof.key_source);
    println!("   Saved proof: {}", proof.stored.partition_path.display());
    println!("   Latest proof: {}", proof.stored.latest_path.display());
}

pub fn handle_submit_command(args: SubmitArgs) -> Result<()> {
    let config = resolve_config(&args.to_overrides())?;
    run_submit(&args, &config)
}

/// Submit with an already resolved configuration.
///
/// Finding nothing to submit is `Ok`; every failed or rejected submission
/// is an `Err`, which the binary turns into a non-zero exit status.
pub fn run_submit(args: &SubmitArgs, config: &Config) -> Result<()> {
    let client = RekorClient::new_with_url(config.rekor_base_url.clone(), config.timeout)?;

    println!("📡 Rekor submit (v2 DSSE/in-toto) from latest statement-attestation");
    println!("   Rekor URL: {}", client.base_url());

    match &args.artifact {
        Some(path) => {
            let proof = publish::publish_attestation(path, config, &client)?;
            print_published(&proof);
        }
        None => match publish::publish_latest_attestation(config, &client)? {
            PublishOutcome::Published(proof) => print_published(&proof),
            PublishOutcome::NothingToSubmit { search_root } => {
                println!("ℹ No statement-attestations found.");
                println!("   Searched: {}", search_root.display());
            }
        },
    }

    Ok(())
}

pub fn handle_latest_command(args: LatestArgs) -> Result<()> {
    let config = resolve_config(&args.paths.to_overrides())?;

    match locate::find_latest_attestation(&config.attestations_path)? {
        Some(path) => println!("{}", path.display()),
        None => println!(
            "ℹ No statement-attestations found under {}",
            config.attestations_path.display()
        ),
    }

    Ok(())
}

pub fn handle_verify_command(args: VerifyArgs) -> Result<()> {
    let config = resolve_config(&args.paths.to_overrides())?;
    let proof_path = args
        .proof
        .unwrap_or_else(|| FilesystemProofStore::new(&config.proofs_path).latest_path());

    let verified = verify_proof_file(&proof_path, args.check_artifact)?;

    println!("✅ Proof verified: {}", verified.proof_path.display());
    println!("   Subject: {}", verified.subject);
    println!("   SHA256: {}", verified.sha256);
    println!("   Rekor status: {} (ok: {})", verified.status, verified.ok);
    println!("   Key: {}", verified.key_source);
    if verified.artifact_checked {
        println!("   Artifact re-hashed and matches");
    }

    Ok(())
}
