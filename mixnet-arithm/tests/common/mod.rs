#![allow(dead_code)]

use std::sync::Once;

use mixnet_arithm::arithm::array::FileStore;
use mixnet_arithm::arithm::group::{APGroup, ECPGroup, ModPGroup, PPGroup};
use mixnet_arithm::arithm::{Backing, PGroup};
use mixnet_arithm::eio::StorageDir;
use mixnet_arithm::errors::ArithmError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("info"))
            .unwrap();
        let fmt_layer = fmt::layer().with_target(true).with_test_writer();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    });
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A file backing with small batches, so that every operation spans
/// several batches.
pub fn file_backing() -> Result<Backing, ArithmError> {
    let dir = StorageDir::create_in(std::env::temp_dir())?;
    Ok(Backing::file(FileStore::new(dir, 4, 3)))
}

/// One group of every kind: a safe prime group, P-256, and a product and
/// an array built from the safe prime group.
pub fn groups(seed: u64) -> Result<Vec<PGroup>, ArithmError> {
    let mut rng = rng(seed);
    let modp = PGroup::ModP(ModPGroup::gen_safe_prime(128, &mut rng, 40)?);
    let ec = PGroup::Ec(ECPGroup::named("P-256")?);
    let product = PGroup::Product(PPGroup::power(&modp, 2)?);
    let array = PGroup::Array(APGroup::try_with(modp.clone(), 3, Backing::Memory)?);
    Ok(vec![modp, ec, product, array])
}
