use device_identity_crypto::import_private_key;
use gateway_config_and_utils::Paths;
use gateway_storage::create_secrets_manager;
use tracing::info;

/// `parity-gateway auth --private-key <hex>`
pub fn run_auth(paths: &Paths, private_key: &str) -> Result<(), Box<dyn std::error::Error>> {
    paths.ensure_dirs()?;
    let secrets = create_secrets_manager(paths)?;
    let identity = import_private_key(&secrets, private_key)?;

    info!(
        creator_address = %identity.creator_address,
        device_id = %identity.device_id,
        "Private key imported"
    );
    info!("A running gateway keeps its startup identity until it is restarted");

    println!("Authenticated.");
    println!("  Creator address: {}", identity.creator_address);
    println!("  Device ID:       {}", identity.device_id);
    println!("Restart any running gateway to use this identity.");
    Ok(())
}
