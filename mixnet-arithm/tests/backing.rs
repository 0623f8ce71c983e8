mod common;

use mixnet_arithm::arithm::{Backing, LargeInteger, LargeIntegerArray, PGroup, Permutation};
use mixnet_arithm::config::{ArithConfig, BackingKind};
use mixnet_arithm::errors::ArithmError;

#[test]
fn group_arrays_agree_across_backings() -> Result<(), ArithmError> {
    common::init_tracing();
    let file = common::file_backing()?;
    let mut rng = common::rng(11);
    let groups = common::groups(12)?;
    for group in groups.iter().filter(|g| matches!(g, PGroup::ModP(_) | PGroup::Product(_))) {
        let ring = group.pring();
        let bases = group.random_element_array(&Backing::Memory, 11, &mut rng, 40)?;
        let exponents = ring.random_element_array(&Backing::Memory, 11, &mut rng, 40)?;
        let stored = group.element_array_from_reader(&file, 11, &mut bases.to_byte_tree()?.reader())?;
        let stored_exponents = ring.element_array_from_reader(&file, 11, &mut exponents.to_byte_tree()?.reader())?;

        assert!(stored.equals(&bases)?);
        assert_eq!(stored.exp_prod(&stored_exponents)?, bases.exp_prod(&exponents)?);
        assert_eq!(stored.prod()?, bases.prod()?);
        assert!(stored.exp(&stored_exponents)?.equals(&bases.exp(&exponents)?)?);
        assert!(stored.mul(&stored.inv()?)?.equals(&group.fill_element_array(&Backing::Memory, 11, &group.one()?)?)?);

        let permutation = Permutation::random(11, &mut rng, 40);
        assert!(stored.permute(&permutation)?.equals(&bases.permute(&permutation)?)?);
        assert!(stored.copy_of_range(2, 9)?.equals(&bases.copy_of_range(2, 9)?)?);
        let mask: Vec<bool> = (0..11).map(|i| i % 3 != 0).collect();
        assert!(stored.extract(&mask)?.equals(&bases.extract(&mask)?)?);
    }
    Ok(())
}

#[test]
fn configured_file_backing_matches_memory() -> Result<(), ArithmError> {
    common::init_tracing();
    let config = ArithConfig::from_json(&format!(
        r#"{{ "backing": "file", "storage_dir": {:?}, "batch_size": 5, "sort_memory_threshold": 4 }}"#,
        std::env::temp_dir()
    ))?;
    assert_eq!(config.backing, BackingKind::File);
    let backing = config.backing()?;
    assert!(backing.is_file());

    let mut rng = common::rng(13);
    let modulus = LargeInteger::from(1_000_000_007u64);
    let memory = LargeIntegerArray::random_mod(&Backing::Memory, 37, &modulus, 20, &mut rng)?;
    let other = LargeIntegerArray::random_mod(&Backing::Memory, 37, &modulus, 20, &mut rng)?;
    let stored = memory.to_backing(&backing)?;
    let stored_other = other.to_backing(&backing)?;

    assert_eq!(stored.mod_inner(&stored_other, &modulus)?, memory.mod_inner(&other, &modulus)?);
    assert_eq!(stored.mod_prod(&modulus)?, memory.mod_prod(&modulus)?);
    assert_eq!(
        stored.mod_pow_prod(&stored_other, &modulus, 3)?,
        memory.mod_pow_prod(&other, &modulus, 3)?
    );
    assert_eq!(stored.compare_to(&stored_other)?, memory.compare_to(&other)?);

    let permutation = Permutation::random(37, &mut rng, 40);
    let permuted = stored.permute(&permutation)?;
    assert!(permuted.backing().is_file());
    assert!(permuted.permute(&permutation.inverse())?.equals(&memory)?);

    let collected = stored.iter()?.collect::<Result<Vec<_>, _>>()?;
    assert_eq!(collected, memory.integers()?);
    Ok(())
}

#[test]
fn storage_is_released_with_the_last_array() -> Result<(), ArithmError> {
    let backing = common::file_backing()?;
    let Backing::File(store) = &backing else {
        panic!("expected a file backing");
    };
    let path = store.dir().path().to_path_buf();
    let array = LargeIntegerArray::fill(&backing, 9, &LargeInteger::from(3))?;
    drop(backing);
    assert!(path.is_dir());
    assert_eq!(array.size(), 9);
    drop(array);
    assert!(!path.exists());
    Ok(())
}
