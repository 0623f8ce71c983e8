//! # Marshalling
//!
//! Self-describing encodings of rings and groups. A marshalled structure is
//! `Node(Leaf(tag), body)`, where the tag names one of a closed set of
//! structures and the body is the structure's own `to_byte_tree`.
//!
//! ```
//! use mixnet_arithm::arithm::marshal::{marshal_pgroup, unmarshal_pgroup};
//! use mixnet_arithm::arithm::group::{ECPGroup, PGroup};
//! use mixnet_arithm::arithm::array::Backing;
//! use rand::SeedableRng;
//!
//! let group = PGroup::Ec(ECPGroup::named("P-256").unwrap());
//! let tree = marshal_pgroup(&group);
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//! let decoded = unmarshal_pgroup(&mut tree.reader(), &Backing::Memory, &mut rng, 40).unwrap();
//! assert_eq!(decoded, group);
//! ```

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use tracing::debug;

use crate::arithm::array::Backing;
use crate::arithm::group::{APGroup, ECPGroup, ModPGroup, PGroup, PPGroup};
use crate::arithm::ring::{APRing, PField, PPRing, PRing};
use crate::eio::{ByteTree, ByteTreeReader};
use crate::errors::ArithmError;

/// Tags longer than this are rejected before they are interpreted.
pub const MAX_TAG_LENGTH: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    ModPGroup,
    ECPGroup,
    PPGroup,
    APGroup,
    PField,
    PPRing,
    APRing,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::ModPGroup => "ModPGroup",
            Tag::ECPGroup => "ECPGroup",
            Tag::PPGroup => "PPGroup",
            Tag::APGroup => "APGroup",
            Tag::PField => "PField",
            Tag::PPRing => "PPRing",
            Tag::APRing => "APRing",
        }
    }

    fn is_group(self) -> bool {
        matches!(self, Tag::ModPGroup | Tag::ECPGroup | Tag::PPGroup | Tag::APGroup)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = ArithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ModPGroup" => Tag::ModPGroup,
            "ECPGroup" => Tag::ECPGroup,
            "PPGroup" => Tag::PPGroup,
            "APGroup" => Tag::APGroup,
            "PField" => Tag::PField,
            "PPRing" => Tag::PPRing,
            "APRing" => Tag::APRing,
            _ => return Err(ArithmError::format(format!("Unknown tag {}!", s))),
        })
    }
}

fn marshal(tag: Tag, body: ByteTree) -> ByteTree {
    ByteTree::node(vec![ByteTree::from_string(tag.as_str()), body])
}

/// Reads the tag of a marshalled structure and leaves `reader` positioned at
/// the body.
fn read_tag(reader: &mut ByteTreeReader<'_>) -> Result<Tag, ArithmError> {
    if reader.is_leaf() || reader.remaining() != 2 {
        return Err(ArithmError::format("Malformed marshalled structure!"));
    }
    let mut tag_reader = reader.next_child()?;
    if !tag_reader.is_leaf() {
        return Err(ArithmError::format("Tag is not a leaf!"));
    }
    if tag_reader.remaining() > MAX_TAG_LENGTH {
        return Err(ArithmError::format("Too long tag!"));
    }
    tag_reader.read_string()?.parse()
}

pub fn marshal_pring(ring: &PRing) -> ByteTree {
    match ring {
        PRing::Field(field) => marshal(Tag::PField, field.to_byte_tree()),
        PRing::Product(ring) => marshal(Tag::PPRing, ring.to_byte_tree()),
        PRing::Array(ring) => marshal(Tag::APRing, ring.to_byte_tree()),
    }
}

/// Decodes a ring written by [`marshal_pring`], validating its parameters
/// with the given primality certainty. Array rings are given `backing`.
pub fn unmarshal_pring<R: RngCore + ?Sized>(
    reader: &mut ByteTreeReader<'_>,
    backing: &Backing,
    rng: &mut R,
    certainty: usize,
) -> Result<PRing, ArithmError> {
    let tag = read_tag(reader)?;
    let mut body = reader.next_child()?;
    let ring = match tag {
        Tag::PField => PRing::Field(PField::from_reader(&mut body, rng, certainty)?),
        Tag::PPRing => PRing::Product(PPRing::from_reader(&mut body, backing, rng, certainty)?),
        Tag::APRing => PRing::Array(APRing::from_reader(&mut body, backing, rng, certainty)?),
        _ => return Err(ArithmError::format(format!("{} is not a ring!", tag))),
    };
    debug!(%tag, "unmarshalled ring");
    Ok(ring)
}

pub fn marshal_pgroup(group: &PGroup) -> ByteTree {
    match group {
        PGroup::ModP(group) => marshal(Tag::ModPGroup, group.to_byte_tree()),
        PGroup::Ec(group) => marshal(Tag::ECPGroup, group.to_byte_tree()),
        PGroup::Product(group) => marshal(Tag::PPGroup, group.to_byte_tree()),
        PGroup::Array(group) => marshal(Tag::APGroup, group.to_byte_tree()),
    }
}

/// Decodes a group written by [`marshal_pgroup`].
pub fn unmarshal_pgroup<R: RngCore + ?Sized>(
    reader: &mut ByteTreeReader<'_>,
    backing: &Backing,
    rng: &mut R,
    certainty: usize,
) -> Result<PGroup, ArithmError> {
    let tag = read_tag(reader)?;
    if !tag.is_group() {
        return Err(ArithmError::format(format!("{} is not a group!", tag)));
    }
    let mut body = reader.next_child()?;
    let group = match tag {
        Tag::ModPGroup => PGroup::ModP(ModPGroup::from_reader(&mut body, rng, certainty)?),
        Tag::ECPGroup => PGroup::Ec(ECPGroup::from_reader(&mut body, rng, certainty)?),
        Tag::PPGroup => PGroup::Product(PPGroup::from_reader(&mut body, backing, rng, certainty)?),
        _ => PGroup::Array(APGroup::from_reader(&mut body, backing, rng, certainty)?),
    };
    debug!(%tag, "unmarshalled group");
    Ok(group)
}

/// [`marshal_pgroup`] rendered as a hexadecimal string, the form used in
/// configuration files.
pub fn pgroup_to_hex(group: &PGroup) -> String {
    marshal_pgroup(group).to_hex()
}

/// Inverse of [`pgroup_to_hex`].
pub fn pgroup_from_hex<R: RngCore + ?Sized>(
    hex: &str,
    backing: &Backing,
    rng: &mut R,
    certainty: usize,
) -> Result<PGroup, ArithmError> {
    let bytes = decode_hex(hex.trim())?;
    let tree = ByteTree::from_bytes(&bytes)?;
    unmarshal_pgroup(&mut tree.reader(), backing, rng, certainty)
}

fn decode_hex(hex: &str) -> Result<Vec<u8>, ArithmError> {
    if hex.len() % 2 != 0 {
        return Err(ArithmError::format("Odd number of hexadecimal digits!"));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| ArithmError::format("Invalid hexadecimal digit!"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arithm::LargeInteger;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_rings_round_trip() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(61);
        let field = PRing::Field(PField::with_prime_order(LargeInteger::from(7919)));
        let product = PRing::Product(PPRing::try_with(vec![field.clone(), field.clone()])?);
        let array = PRing::Array(APRing::try_with(product.clone(), 3, Backing::Memory)?);
        let nested = PRing::Product(PPRing::try_with(vec![array.clone(), field.clone()])?);
        for ring in [field, product, array, nested] {
            let tree = marshal_pring(&ring);
            let decoded = unmarshal_pring(&mut tree.reader(), &Backing::Memory, &mut rng, 40)?;
            assert_eq!(decoded, ring);
        }
        Ok(())
    }

    #[test]
    fn test_groups_round_trip() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(62);
        let modp = PGroup::ModP(ModPGroup::gen_safe_prime(96, &mut rng, 40)?);
        let ec = PGroup::Ec(ECPGroup::named("secp256k1")?);
        let array = PGroup::Array(APGroup::try_with(modp.clone(), 2, Backing::Memory)?);
        let product = PGroup::Product(PPGroup::try_with(vec![modp.clone(), array.clone(), modp.clone()])?);
        for group in [modp, ec, array, product] {
            let tree = marshal_pgroup(&group);
            let decoded = unmarshal_pgroup(&mut tree.reader(), &Backing::Memory, &mut rng, 40)?;
            assert_eq!(decoded, group);

            let hex = pgroup_to_hex(&group);
            assert_eq!(pgroup_from_hex(&hex, &Backing::Memory, &mut rng, 40)?, group);
        }
        Ok(())
    }

    #[test]
    fn test_rejects_bad_tags() -> Result<(), ArithmError> {
        let mut rng = StdRng::seed_from_u64(63);
        let field = PField::with_prime_order(LargeInteger::from(7919));

        let unknown = ByteTree::node(vec![ByteTree::from_string("java.lang.Object"), field.to_byte_tree()]);
        assert!(unmarshal_pring(&mut unknown.reader(), &Backing::Memory, &mut rng, 40).is_err());

        let long_tag = "P".repeat(MAX_TAG_LENGTH + 1);
        let long = ByteTree::node(vec![ByteTree::from_string(&long_tag), field.to_byte_tree()]);
        assert!(unmarshal_pring(&mut long.reader(), &Backing::Memory, &mut rng, 40).is_err());

        let ring_as_group = marshal_pring(&PRing::Field(field));
        assert!(unmarshal_pgroup(&mut ring_as_group.reader(), &Backing::Memory, &mut rng, 40).is_err());

        assert!("PField".parse::<Tag>().is_ok());
        assert!(pgroup_from_hex("0", &Backing::Memory, &mut rng, 40).is_err());
        Ok(())
    }
}
