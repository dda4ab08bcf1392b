//! `broker-cli store` - save a plaintext secret value for a stub.

use broker_core::BrokerHome;
use broker_store::BrokerStore;

/// Where the stored plaintext value comes from. Exactly one source is
/// accepted, enforced by `clap`'s argument group in `main.rs`.
pub(crate) enum ValueSource {
    Literal(String),
    Env(String),
    File(std::path::PathBuf),
}

pub(crate) fn run(stub: &str, name: &str, source: ValueSource) -> anyhow::Result<()> {
    let value = match source {
        ValueSource::Literal(value) => value,
        ValueSource::Env(var) => std::env::var(&var)
            .map_err(|_| anyhow::anyhow!("environment variable '{var}' is not set"))?,
        ValueSource::File(path) => {
            if !path.exists() {
                anyhow::bail!("secret file not found: {}", path.display());
            }
            std::fs::read_to_string(&path)?.trim_end_matches('\n').to_string()
        }
    };
    if value.is_empty() {
        anyhow::bail!("secret value cannot be empty");
    }

    let home = BrokerHome::resolve()?;
    let keys_existed = home.keys_path().exists();
    let mut store = BrokerStore::open(home)?;
    if !keys_existed {
        store.init(std::slice::from_ref(&stub.to_string()))?;
    }
    store.secrets.set(stub, name, value);
    store.save_secrets()?;

    println!("[broker] secret '{name}' stored for stub '{stub}'");
    Ok(())
}
