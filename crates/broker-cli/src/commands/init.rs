//! `broker-cli init` - generate a broker key for every requested stub.

use broker_core::BrokerHome;
use broker_store::BrokerStore;

pub(crate) fn run(stubs: &[String]) -> anyhow::Result<()> {
    let home = BrokerHome::resolve()?;
    let mut store = BrokerStore::open(home)?;
    store.init(stubs)?;
    println!(
        "[broker] key store ready at {}",
        store.home().keys_path().display()
    );
    Ok(())
}
