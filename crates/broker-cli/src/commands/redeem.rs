//! `broker-cli redeem` - validate a capability token and seal its secrets.

use broker_core::BrokerHome;
use broker_store::BrokerStore;

pub(crate) fn run(
    capability_path: &std::path::Path,
    secret_names: &[String],
    output_dir: Option<&std::path::Path>,
    allow_reuse: bool,
) -> anyhow::Result<()> {
    let home = BrokerHome::resolve()?;
    let mut store = BrokerStore::open(home)?;

    let records = broker_redeem::redeem(
        &mut store,
        capability_path,
        secret_names,
        output_dir,
        allow_reuse,
    )?;

    for record in &records {
        let dir = output_dir
            .map(std::path::Path::to_path_buf)
            .unwrap_or_else(|| {
                capability_path
                    .parent()
                    .unwrap_or_else(|| std::path::Path::new("."))
                    .join("secrets")
            });
        let path = dir.join(format!("{}.sealed", record.secret));
        println!("[broker] sealed secret '{}' -> {}", record.secret, path.display());
    }
    Ok(())
}
