//! Named curve parameters in hexadecimal.

use lazy_static::lazy_static;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct CurveParams {
    pub name: &'static str,
    pub p: &'static str,
    pub a: &'static str,
    pub b: &'static str,
    pub n: &'static str,
    pub gx: &'static str,
    pub gy: &'static str,
}

const P_256: CurveParams = CurveParams {
    name: "P-256",
    p: "FFFFFFFF00000001000000000000000000000000FFFFFFFFFFFFFFFFFFFFFFFF",
    a: "FFFFFFFF00000001000000000000000000000000FFFFFFFFFFFFFFFFFFFFFFFC",
    b: "5AC635D8AA3A93E7B3EBBD55769886BC651D06B0CC53B0F63BCE3C3E27D2604B",
    n: "FFFFFFFF00000000FFFFFFFFFFFFFFFFBCE6FAADA7179E84F3B9CAC2FC632551",
    gx: "6B17D1F2E12C4247F8BCE6E563A440F277037D812DEB33A0F4A13945D898C296",
    gy: "4FE342E2FE1A7F9B8EE7EB4A7C0F9E162BCE33576B315ECECBB6406837BF51F5",
};

const SECP256K1: CurveParams = CurveParams {
    name: "secp256k1",
    p: "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFC2F",
    a: "00",
    b: "07",
    n: "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141",
    gx: "79BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798",
    gy: "483ADA7726A3C4655DA4FBFC0E1108A8FD17B448A68554199C47D08FFB10D4B8",
};

lazy_static! {
    static ref CURVES: HashMap<&'static str, CurveParams> = {
        let mut m = HashMap::new();
        m.insert("P-256", P_256);
        m.insert("prime256v1", P_256);
        m.insert("secp256k1", SECP256K1);
        m
    };
}

/// Parameters of the curve named `name`, if known.
pub fn lookup(name: &str) -> Option<CurveParams> {
    CURVES.get(name).copied()
}

/// Names accepted by [`lookup`], aliases included.
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<_> = CURVES.keys().copied().collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_resolves_to_same_curve() {
        let alias = lookup("prime256v1").unwrap();
        assert_eq!(alias.name, "P-256");
        assert_eq!(alias.p, lookup("P-256").unwrap().p);
        assert!(lookup("P-384").is_none());
        assert_eq!(names(), vec!["P-256", "prime256v1", "secp256k1"]);
    }
}
