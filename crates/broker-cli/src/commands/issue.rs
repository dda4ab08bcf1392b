//! `broker-cli issue` - mint capability tokens for a session.

use broker_core::{BrokerHome, CapRoot};
use broker_store::BrokerStore;

pub(crate) fn run(
    session_id: &str,
    stubs: &[String],
    output: &std::path::Path,
    ttl_minutes: i64,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(output)?;

    let home = BrokerHome::resolve()?;
    let keys_existed = home.keys_path().exists();
    let mut store = BrokerStore::open(home)?;
    if !keys_existed {
        // First run: seed keys for the requested stubs, matching the
        // original source's one-shot lazy initialization. Once a key
        // store exists, `issue` never silently mints new stub keys —
        // unknown stubs are just skipped by the issuer.
        store.init(stubs)?;
    }

    let cap_root = CapRoot::from_path(output);
    let issued = broker_capability::issue(&mut store, &cap_root, session_id, stubs, ttl_minutes)?;

    println!(
        "[broker] issued {} capabilities -> {}",
        issued.len(),
        output.display()
    );
    Ok(())
}
