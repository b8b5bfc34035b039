//! Genesis block builder: assembles the handful of bootstrap commands every
//! fresh ledger needs (a root role, a domain, a first account, the node's
//! own peer entry) into a single unsigned transaction, wraps it in block 1,
//! and writes the block out as JSON for `ledger_node --genesis-block` to
//! load at startup.
//!
//! Genesis commands run through the same `CommandExecutor` the node uses at
//! runtime, with `validate = false` — permission checks are skipped (spec
//! §4.2 `Contract`), since nothing exists yet to hold permissions over. The
//! resulting block carries no node signature: the node that ultimately
//! inserts it signs it itself as part of the normal startup path.

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use ledger_common::{
    account::{AccountId, DomainId, Peer, Quantity, RoleId, RolePermission},
    block::Block,
    crypto::{Hash, PublicKey},
    transaction::{Command, Transaction},
};
use ledger_node::core::{
    executor::{engine::NoEngine, CommandExecutor},
    wsv::{memory::MemoryBackend, WorldStateView},
};
use tokio::sync::Mutex;

#[derive(Parser, Debug)]
#[command(name = "ledger_genesis", about = "Builds a genesis block for a fresh ledger node")]
struct Options {
    /// Where to write the genesis block, as JSON.
    #[arg(long, default_value = "./genesis.json")]
    output: PathBuf,

    /// Domain the bootstrap account and asset belong to.
    #[arg(long, default_value = "default")]
    domain: String,

    /// Name (before the `@domain`) of the account created with full
    /// (`Root`) permissions.
    #[arg(long, default_value = "admin")]
    admin_name: String,

    /// Hex-encoded ed25519 public key for the admin account.
    #[arg(long)]
    admin_public_key: String,

    /// Network address advertised for the node's own peer entry.
    #[arg(long)]
    peer_address: String,

    /// Hex-encoded ed25519 public key for the node's own peer entry.
    #[arg(long)]
    peer_public_key: String,

    /// Optional asset (`name:precision`) to create and credit to the admin
    /// account with `initial_balance`, e.g. `coin:2`.
    #[arg(long)]
    asset: Option<String>,

    /// Initial balance (mantissa units at the asset's precision) credited
    /// to the admin account, only used if `--asset` is given.
    #[arg(long, default_value_t = 0)]
    initial_balance: u128,
}

fn parse_public_key(hex_str: &str) -> anyhow::Result<PublicKey> {
    let bytes = hex::decode(hex_str)?;
    Ok(PublicKey::from_slice(&bytes)?)
}

fn bootstrap_commands(options: &Options) -> anyhow::Result<Vec<Command>> {
    let domain_id = DomainId::from(options.domain.as_str());
    let root_role = RoleId::from("root");
    let admin_public_key = parse_public_key(&options.admin_public_key)?;
    let peer_public_key = parse_public_key(&options.peer_public_key)?;

    let mut commands = vec![
        Command::CreateRole { role_id: root_role.clone(), permissions: RolePermission::ALL.to_vec() },
        Command::CreateDomain { domain_id: domain_id.clone(), default_role: root_role },
        Command::CreateAccount {
            account_name: options.admin_name.clone(),
            domain_id: domain_id.clone(),
            public_key: admin_public_key,
        },
        Command::AddPeer { peer: Peer { public_key: peer_public_key, address: options.peer_address.clone() } },
    ];

    if let Some(asset) = &options.asset {
        let (asset_name, precision) = asset
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("--asset must be `name:precision`, got `{asset}`"))?;
        let precision: u8 = precision.parse()?;
        commands.push(Command::CreateAsset { asset_name: asset_name.to_string(), domain_id: domain_id.clone(), precision });
        if options.initial_balance > 0 {
            let asset_id = ledger_common::account::AssetId::new(asset_name, domain_id);
            commands.push(Command::AddAssetQuantity {
                asset_id,
                amount: Quantity::from_mantissa(options.initial_balance, precision),
            });
        }
    }

    Ok(commands)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ledger_node::core::logger::init(log::LevelFilter::Info, None)?;
    log::info!("ledger_genesis {}", ledger_common::BUILD_VERSION);

    let options = Options::parse();
    let admin_account_id = AccountId::new(options.admin_name.clone(), DomainId::from(options.domain.as_str()));
    let commands = bootstrap_commands(&options)?;

    let wsv = WorldStateView::new(Arc::new(MemoryBackend::new()))?;
    let executor = CommandExecutor::new(Arc::new(Mutex::new(NoEngine)));
    let mut txn = wsv.begin_write().await;

    let created_time = ledger_common::time::get_current_time_in_millis();
    let tx = Transaction::new(admin_account_id, created_time, 1, commands, None);
    let tx_hash = tx.reduced_hash();
    for command in &tx.commands {
        executor.execute(&mut txn, &tx.creator, tx_hash, command, false).await?;
    }
    txn.prepare_block();
    txn.discard();

    let block = Block::new(1, Block::GENESIS_PREVIOUS_HASH, created_time, vec![tx], Vec::<Hash>::new());

    let json = serde_json::to_string_pretty(&block)?;
    std::fs::write(&options.output, json)?;

    log::info!("wrote genesis block (hash {}) to {}", block.hash(), options.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_options() -> Options {
        Options {
            output: PathBuf::from("./genesis.json"),
            domain: "default".to_string(),
            admin_name: "admin".to_string(),
            admin_public_key: ledger_common::crypto::KeyPair::generate().public_key().to_hex(),
            peer_address: "127.0.0.1:7878".to_string(),
            peer_public_key: ledger_common::crypto::KeyPair::generate().public_key().to_hex(),
            asset: Some("coin:2".to_string()),
            initial_balance: 1000,
        }
    }

    #[tokio::test]
    async fn bootstrap_commands_apply_cleanly_with_validation_disabled() {
        let options = sample_options();
        let admin_account_id = AccountId::new(options.admin_name.clone(), DomainId::from(options.domain.as_str()));
        let commands = bootstrap_commands(&options).unwrap();

        let wsv = WorldStateView::new(Arc::new(MemoryBackend::new())).unwrap();
        let executor = CommandExecutor::new(Arc::new(Mutex::new(NoEngine)));
        let mut txn = wsv.begin_write().await;
        for command in &commands {
            executor.execute(&mut txn, &admin_account_id, Hash::zero(), command, false).await.unwrap();
        }

        assert!(txn.view().accounts.contains_key(&admin_account_id));
        assert!(txn.view().domains.contains_key(&DomainId::from("default")));
        assert_eq!(txn.view().peers.len(), 1);
        let asset_id: ledger_common::account::AssetId = "coin#default".parse().unwrap();
        assert_eq!(txn.view().balance(&admin_account_id, &asset_id).mantissa(), 1000);
        txn.discard();
    }

    #[test]
    fn asset_flag_without_colon_is_rejected() {
        let mut options = sample_options();
        options.asset = Some("coin".to_string());
        assert!(bootstrap_commands(&options).is_err());
    }
}
