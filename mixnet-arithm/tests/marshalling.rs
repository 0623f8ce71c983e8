mod common;

use mixnet_arithm::arithm::group::PPGroup;
use mixnet_arithm::arithm::hom::{Batchable, BiPRingPGroup, HomFixedBaseExp};
use mixnet_arithm::arithm::marshal::{
    marshal_pgroup, marshal_pring, pgroup_from_hex, pgroup_to_hex, unmarshal_pgroup, unmarshal_pring,
};
use mixnet_arithm::arithm::{Backing, PGroup, Polynomial};
use mixnet_arithm::eio::ByteTree;
use mixnet_arithm::errors::ArithmError;

#[test]
fn groups_and_their_elements_survive_serialization() -> Result<(), ArithmError> {
    common::init_tracing();
    let mut rng = common::rng(21);
    let groups = common::groups(22)?;
    let nested = PGroup::Product(PPGroup::try_with(vec![
        groups[2].clone(),
        groups[3].clone(),
        groups[0].clone(),
    ])?);
    for group in groups.into_iter().chain([nested]) {
        let bytes = marshal_pgroup(&group).to_bytes();
        let decoded = unmarshal_pgroup(&mut ByteTree::from_bytes(&bytes)?.reader(), &Backing::Memory, &mut rng, 40)?;
        assert_eq!(decoded, group);
        assert_eq!(pgroup_from_hex(&pgroup_to_hex(&group), &Backing::Memory, &mut rng, 40)?, group);

        let ring = unmarshal_pring(&mut marshal_pring(&group.pring()).reader(), &Backing::Memory, &mut rng, 40)?;
        assert_eq!(ring, group.pring());

        let element = group.random_element(&mut rng, 40)?;
        let tree = ByteTree::from_bytes(&element.to_byte_tree()?.to_bytes())?;
        assert_eq!(decoded.element_from_reader(&mut tree.reader())?, element);

        let elements = (0..4)
            .map(|_| group.random_element(&mut rng, 40))
            .collect::<Result<Vec<_>, _>>()?;
        let tree = group.elements_to_byte_tree(&elements)?;
        assert_eq!(decoded.to_elements(4, &mut tree.reader())?, elements);
        assert!(decoded.to_elements(3, &mut tree.reader()).is_err());
    }
    Ok(())
}

#[test]
fn corrupted_encodings_are_rejected() -> Result<(), ArithmError> {
    let mut rng = common::rng(23);
    let group = common::groups(24)?.remove(0);
    let bytes = marshal_pgroup(&group).to_bytes();

    assert!(ByteTree::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    let mut extended = bytes.clone();
    extended.push(0);
    assert!(ByteTree::from_bytes(&extended).is_err());

    let element = ByteTree::leaf(vec![0xFF; group.byte_length()]);
    assert!(group.element_from_reader(&mut element.reader()).is_err());
    let ring_tree = marshal_pring(&group.pring());
    assert!(unmarshal_pgroup(&mut ring_tree.reader(), &Backing::Memory, &mut rng, 40).is_err());
    Ok(())
}

#[test]
fn maps_and_polynomials_round_trip_through_byte_trees() -> Result<(), ArithmError> {
    let mut rng = common::rng(25);
    let group = common::groups(26)?.remove(1);
    let ring = group.pring();

    let coefficients = (0..4)
        .map(|_| ring.random_element(&mut rng, 40))
        .collect::<Result<Vec<_>, _>>()?;
    let polynomial = Polynomial::new(coefficients)?;
    let tree = ByteTree::from_bytes(&polynomial.to_byte_tree()?.to_bytes())?;
    assert_eq!(Polynomial::from_reader(&ring, 3, &mut tree.reader())?, polynomial);

    let exp = BiPRingPGroup::exp(group.clone());
    let generator = group.generator()?;
    let exponent = ring.random_element(&mut rng, 40)?;
    assert_eq!(exp.map(&exponent, &generator)?, generator.exp(&exponent)?);

    let basis = group.random_element(&mut rng, 40)?;
    let mut hom = HomFixedBaseExp::try_with(group.clone(), 5, Backing::Memory, basis)?;
    let preimages = (0..3)
        .map(|_| hom.domain().random_element(&mut rng, 40))
        .collect::<Result<Vec<_>, _>>()?;
    let images = preimages.iter().map(|p| hom.map(p)).collect::<Result<Vec<_>, _>>()?;
    hom.init_batching(&mut rng, 40)?;
    for (preimage, image) in preimages.iter().zip(&images) {
        let batched = hom.batched_map().map(&hom.batched_preimage(preimage)?)?;
        assert_eq!(batched, hom.batched_image(image)?);
    }
    Ok(())
}
