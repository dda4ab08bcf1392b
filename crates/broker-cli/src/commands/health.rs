//! `broker-cli health` - report broker store status.

use broker_core::BrokerHome;
use broker_store::BrokerStore;

use super::default_stubs;

pub(crate) fn run() -> anyhow::Result<()> {
    let home = BrokerHome::resolve()?;
    let keys_path = home.keys_path();
    let secrets_path = home.secrets_path();
    let keys_existed = keys_path.exists();
    let mut store = BrokerStore::open(home)?;
    if !keys_existed {
        // First run: seed keys for the default stub list, matching the
        // original source's `_ensure_broker_files` lazy initialization,
        // so a brand-new broker directory reports healthy rather than
        // failing with "key file missing" before `init`/`issue` ever ran.
        store.init(&default_stubs())?;
    }

    if !keys_path.exists() {
        anyhow::bail!("broker key file missing");
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&keys_path)?.permissions().mode();
        if mode & 0o077 != 0 {
            eprintln!("[broker] warning: key file is not chmod 600");
        }
    }

    match store.state.last_issue() {
        Some(last_issue) => {
            let now = chrono::Utc::now().timestamp() as f64;
            println!("[broker] last issuance {}s ago", (now - last_issue) as i64);
        }
        None => println!("[broker] idle (no issuance history)"),
    }

    if !secrets_path.exists() {
        eprintln!("[broker] warning: secrets file missing");
    } else {
        println!("[broker] secrets store ready");
    }

    println!("[broker] health OK");
    Ok(())
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Mutex to serialize tests that mutate the process-wide `BROKER_DIR`.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn health_seeds_keys_on_a_brand_new_broker_dir() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();

        // SAFETY: serialized by ENV_MUTEX
        unsafe { std::env::set_var("BROKER_DIR", dir.path()) };
        let result = run();
        unsafe { std::env::remove_var("BROKER_DIR") };

        result.unwrap();
        assert!(dir.path().join("keys.json").exists());
    }

    #[test]
    fn health_does_not_reseed_an_existing_key_store() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();

        // SAFETY: serialized by ENV_MUTEX
        unsafe { std::env::set_var("BROKER_DIR", dir.path()) };
        run().unwrap();
        let home = BrokerHome::from_path(dir.path());
        let keys_after_first_run = std::fs::read_to_string(home.keys_path()).unwrap();

        run().unwrap();
        let keys_after_second_run = std::fs::read_to_string(home.keys_path()).unwrap();
        unsafe { std::env::remove_var("BROKER_DIR") };

        assert_eq!(keys_after_first_run, keys_after_second_run);
    }
}
